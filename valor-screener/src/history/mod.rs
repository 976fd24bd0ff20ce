//! Daily price history for ranked stocks.
//!
//! Independent of the screening pipeline: the pipeline never waits on the
//! network, and a failed history fetch never changes a ranking.

pub mod provider;
pub mod yahoo;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use provider::{HistoryError, PriceHistoryProvider};
pub use yahoo::{parse_chart, ChartResponse, YahooChartClient};

// ============================================================================
// Time Period
// ============================================================================

/// Chart window offered for a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimePeriod {
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "MAX")]
    Max,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 5] = [
        Self::OneMonth,
        Self::SixMonths,
        Self::OneYear,
        Self::FiveYears,
        Self::Max,
    ];

    /// Range parameter of the chart API.
    pub fn yahoo_range(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneMonth => write!(f, "1M"),
            Self::SixMonths => write!(f, "6M"),
            Self::OneYear => write!(f, "1Y"),
            Self::FiveYears => write!(f, "5Y"),
            Self::Max => write!(f, "MAX"),
        }
    }
}

impl std::str::FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1M" | "1MO" => Ok(Self::OneMonth),
            "6M" | "6MO" => Ok(Self::SixMonths),
            "1Y" => Ok(Self::OneYear),
            "5Y" => Ok(Self::FiveYears),
            "MAX" => Ok(Self::Max),
            _ => Err(format!("Unknown period: {} (expected 1M, 6M, 1Y, 5Y or MAX)", s)),
        }
    }
}

// ============================================================================
// Price History
// ============================================================================

/// One daily close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDataPoint {
    pub date: NaiveDate,
    /// Close price rounded to cents
    pub price: f64,
    /// 1-based position in the source series, counted before invalid
    /// closes were dropped
    pub day: usize,
}

/// Daily price series for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPriceHistory {
    pub ticker: String,
    pub company_name: String,
    /// Last close in the series
    pub current_price: f64,
    /// Change from first to last close (%)
    pub variation: f64,
    pub history: Vec<PriceDataPoint>,
}

impl StockPriceHistory {
    /// Build from ordered points. Fails when there are none.
    pub fn from_points(
        ticker: impl Into<String>,
        company_name: impl Into<String>,
        history: Vec<PriceDataPoint>,
    ) -> Result<Self, HistoryError> {
        let ticker = ticker.into();
        let (first, last) = match (history.first(), history.last()) {
            (Some(first), Some(last)) => (first.price, last.price),
            _ => return Err(HistoryError::NoData(ticker)),
        };

        Ok(Self {
            ticker,
            company_name: company_name.into(),
            current_price: last,
            variation: (last - first) / first * 100.0,
            history,
        })
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
