//! Row normalization: fuzzy header matching into [`NormalizedStock`].
//!
//! Exports from Brazilian screening sites name their columns differently
//! ("Papel" vs "Ticker", "Cotação" vs "Preço", "Liq.2meses" vs "Liquidez
//! Média Diária"). Each target field has an ordered alias list; a header
//! matches when its lower-cased text contains any lower-cased alias.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::numeric::parse_numeric;
use super::types::{CellValue, InputRow, NormalizedStock, RawRow, UNKNOWN_TICKER};

/// Target fields of a normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockField {
    Ticker,
    CompanyName,
    Price,
    Roic,
    EbitMargin,
    EvEbit,
    DividendYield,
    Liquidity,
}

impl StockField {
    /// Accepted header aliases, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Ticker => &["Papel", "Ticker", "Symbol", "Ação"],
            Self::CompanyName => &["Empresa", "Company", "Nome"],
            Self::Price => &["Cotação", "Price", "Preço"],
            Self::Roic => &["ROIC", "Retorno sobre capital"],
            Self::EbitMargin => &["Marg. EBIT", "EBIT Margin", "Margem EBIT"],
            Self::EvEbit => &["EV/EBIT"],
            Self::DividendYield => &["Div.Yield", "DY", "Yield"],
            Self::Liquidity => &["Liq. Corr.", "Vol $ avail", "Liquidez", "Volume"],
        }
    }

    pub const ALL: [StockField; 8] = [
        Self::Ticker,
        Self::CompanyName,
        Self::Price,
        Self::Roic,
        Self::EbitMargin,
        Self::EvEbit,
        Self::DividendYield,
        Self::Liquidity,
    ];
}

/// Lower-cased alias table, built once.
static LOWERED_ALIASES: Lazy<Vec<(StockField, Vec<String>)>> = Lazy::new(|| {
    StockField::ALL
        .iter()
        .map(|field| {
            let aliases = field.aliases().iter().map(|a| a.to_lowercase()).collect();
            (*field, aliases)
        })
        .collect()
});

fn lowered_aliases(field: StockField) -> &'static [String] {
    LOWERED_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, aliases)| aliases.as_slice())
        .unwrap_or(&[])
}

/// A row with its headers lower-cased once, ready for field lookups.
struct HeaderIndex<'a> {
    row: &'a RawRow,
    lowered: Vec<String>,
}

impl<'a> HeaderIndex<'a> {
    fn new(row: &'a RawRow) -> Self {
        let lowered = row.iter().map(|(h, _)| h.to_lowercase()).collect();
        Self { row, lowered }
    }

    /// Value of the leftmost header matching any alias of `field`.
    fn lookup(&self, field: StockField) -> Option<&'a CellValue> {
        let aliases = lowered_aliases(field);
        let position = self
            .lowered
            .iter()
            .position(|header| aliases.iter().any(|alias| header.contains(alias.as_str())))?;

        self.row.iter().nth(position).map(|(_, value)| value)
    }

    fn text(&self, field: StockField, fallback: &str) -> String {
        match self.lookup(field) {
            Some(value) if !value.is_blank() => value.to_string(),
            _ => fallback.to_string(),
        }
    }

    fn number(&self, field: StockField) -> f64 {
        parse_numeric(self.lookup(field))
    }
}

/// Map one raw row to a fixed-shape record. Never fails.
pub fn normalize_row(row: &RawRow) -> NormalizedStock {
    let index = HeaderIndex::new(row);

    NormalizedStock {
        ticker: index.text(StockField::Ticker, UNKNOWN_TICKER),
        company_name: index.text(StockField::CompanyName, ""),
        price: index.number(StockField::Price),
        roic: index.number(StockField::Roic),
        ebit_margin: index.number(StockField::EbitMargin),
        ev_ebit: index.number(StockField::EvEbit),
        dividend_yield: index.number(StockField::DividendYield),
        liquidity: index.number(StockField::Liquidity),
    }
}

// ============================================================================
// Input Shape
// ============================================================================

/// Shape of a pipeline input, judged from its first element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputShape {
    /// No rows at all
    Empty,
    /// Decoded spreadsheet rows that need header matching
    Raw,
    /// Records that were already normalized
    Normalized,
}

impl std::fmt::Display for InputShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Raw => write!(f, "raw"),
            Self::Normalized => write!(f, "normalized"),
        }
    }
}

pub fn detect_input_shape(rows: &[InputRow]) -> InputShape {
    match rows.first() {
        None => InputShape::Empty,
        Some(InputRow::Normalized(_)) => InputShape::Normalized,
        Some(InputRow::Raw(_)) => InputShape::Raw,
    }
}

/// Normalize a whole input sequence.
///
/// The first element decides for every row. Raw input runs every element
/// through header matching, so a normalized record in it is read back by its
/// camelCase field names. Normalized input is taken as-is, so a raw row in it
/// only keeps exact camelCase numeric cells.
pub fn normalize_data(rows: &[InputRow]) -> Vec<NormalizedStock> {
    match detect_input_shape(rows) {
        InputShape::Empty => Vec::new(),
        InputShape::Raw => rows
            .iter()
            .map(|row| match row {
                InputRow::Raw(raw) => normalize_row(raw),
                InputRow::Normalized(stock) => normalize_row(&stock.to_raw_row()),
            })
            .collect(),
        InputShape::Normalized => rows
            .iter()
            .map(|row| match row {
                InputRow::Raw(raw) => read_as_normalized(raw),
                InputRow::Normalized(stock) => stock.clone(),
            })
            .collect(),
    }
}

/// Read a raw row by exact field names, the way a normalized record is read.
/// Missing or non-numeric metrics become 0.
fn read_as_normalized(row: &RawRow) -> NormalizedStock {
    let cell = |key: &str| row.iter().find(|(header, _)| *header == key).map(|(_, v)| v);
    let number = |key: &str| match cell(key) {
        Some(CellValue::Number(n)) => *n,
        _ => 0.0,
    };
    let text = |key: &str, fallback: &str| match cell(key) {
        Some(CellValue::Text(t)) if !t.is_empty() => t.clone(),
        _ => fallback.to_string(),
    };

    NormalizedStock {
        ticker: text("ticker", UNKNOWN_TICKER),
        company_name: text("companyName", ""),
        price: number("price"),
        ebit_margin: number("ebitMargin"),
        ev_ebit: number("evEbit"),
        dividend_yield: number("dividendYield"),
        liquidity: number("liquidity"),
        roic: number("roic"),
    }
}
