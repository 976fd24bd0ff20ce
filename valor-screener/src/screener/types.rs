//! Row and record types flowing through the screening pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel ticker assigned when no ticker column can be resolved.
pub const UNKNOWN_TICKER: &str = "UNKNOWN";

// ============================================================================
// Raw Input
// ============================================================================

/// A single spreadsheet cell: either text as exported, or an already numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Whether the cell counts as "no value" when a text field falls back to
    /// its default: empty text, zero, or NaN.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Number(n) => *n == 0.0 || n.is_nan(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// One decoded input line: header → cell, in column order.
///
/// Header order matters: when several headers match a field's aliases, the
/// leftmost one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell append.
    pub fn with(mut self, header: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.push(header, value);
        self
    }

    /// Append a cell. Duplicate headers are kept; the first one is matched first.
    pub fn push(&mut self, header: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.push((header.into(), value.into()));
    }

    /// Iterate over `(header, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<H: Into<String>, V: Into<CellValue>> FromIterator<(H, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(h, v)| (h.into(), v.into())).collect(),
        }
    }
}

// ============================================================================
// Normalized Records
// ============================================================================

/// Fixed-shape record produced from one raw row.
///
/// Every field is always populated; unparseable numbers become `0` and an
/// unresolvable ticker becomes [`UNKNOWN_TICKER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedStock {
    /// Short trading code, e.g. "PETR4"
    #[serde(default = "default_ticker")]
    pub ticker: String,
    /// Company name (may be empty)
    #[serde(default, alias = "company_name")]
    pub company_name: String,
    /// Last price (BRL)
    #[serde(default)]
    pub price: f64,
    /// EBIT margin (%)
    #[serde(default, alias = "ebit_margin")]
    pub ebit_margin: f64,
    /// EV/EBIT ratio
    #[serde(default, alias = "ev_ebit")]
    pub ev_ebit: f64,
    /// Dividend yield (%)
    #[serde(default, alias = "dividend_yield")]
    pub dividend_yield: f64,
    /// Average daily financial volume (BRL)
    #[serde(default)]
    pub liquidity: f64,
    /// Return on invested capital (%)
    #[serde(default)]
    pub roic: f64,
}

impl NormalizedStock {
    /// The record as a raw row keyed by its camelCase field names.
    pub fn to_raw_row(&self) -> RawRow {
        RawRow::new()
            .with("ticker", self.ticker.as_str())
            .with("companyName", self.company_name.as_str())
            .with("price", self.price)
            .with("ebitMargin", self.ebit_margin)
            .with("evEbit", self.ev_ebit)
            .with("dividendYield", self.dividend_yield)
            .with("liquidity", self.liquidity)
            .with("roic", self.roic)
    }
}

fn default_ticker() -> String {
    UNKNOWN_TICKER.to_string()
}

/// A normalized record annotated with its final 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStock {
    #[serde(flatten)]
    pub stock: NormalizedStock,
    pub ranking: usize,
}

impl std::ops::Deref for RankedStock {
    type Target = NormalizedStock;

    fn deref(&self) -> &Self::Target {
        &self.stock
    }
}

// ============================================================================
// Pipeline Input
// ============================================================================

/// An element of pipeline input: a raw decoded row or a record that has
/// already been normalized (e.g. a previous run's output fed back in).
#[derive(Debug, Clone, PartialEq)]
pub enum InputRow {
    Raw(RawRow),
    Normalized(NormalizedStock),
}

impl InputRow {
    pub fn is_normalized(&self) -> bool {
        matches!(self, Self::Normalized(_))
    }
}

impl From<RawRow> for InputRow {
    fn from(row: RawRow) -> Self {
        Self::Raw(row)
    }
}

impl From<NormalizedStock> for InputRow {
    fn from(stock: NormalizedStock) -> Self {
        Self::Normalized(stock)
    }
}

impl From<RankedStock> for InputRow {
    fn from(ranked: RankedStock) -> Self {
        Self::Normalized(ranked.stock)
    }
}
