//! Price history provider abstraction.

use async_trait::async_trait;
use thiserror::Error;

use super::{StockPriceHistory, TimePeriod};

// ============================================================================
// History Error
// ============================================================================

/// Errors from price history sources.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    /// Connection failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 429 after all retries
    #[error("Rate limited")]
    RateLimited,

    /// Non-success HTTP status
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// Body is not a chart response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Chart response carried no usable closes
    #[error("No price data available for {0}")]
    NoData(String),

    /// Nothing was attempted (no proxies or endpoints configured)
    #[error("No history source configured")]
    NotConfigured,
}

impl HistoryError {
    /// Check if the error is recoverable (worth retrying later)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited => true,
            Self::HttpStatus(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<HistoryError> for valor_common::Error {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::RateLimited => Self::RateLimited(err.to_string()),
            HistoryError::NoData(_) => Self::NotFound(err.to_string()),
            HistoryError::NotConfigured => Self::Config(err.to_string()),
            _ => Self::External(err.to_string()),
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Source of daily price history.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Provider name for logs (e.g. "yahoo")
    fn name(&self) -> &'static str;

    /// Fetch the daily series for a B3 ticker (e.g. "PETR4").
    async fn fetch_history(
        &self,
        ticker: &str,
        company_name: &str,
        period: TimePeriod,
    ) -> Result<StockPriceHistory, HistoryError>;
}
