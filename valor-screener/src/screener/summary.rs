//! Portfolio-level averages over a ranked result.

use serde::{Deserialize, Serialize};

use super::types::RankedStock;
use crate::format::{format_number, format_percent};

/// Headline figures shown above a ranked table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub count: usize,
    /// Average dividend yield (%)
    pub avg_dividend_yield: f64,
    /// Average EV/EBIT
    pub avg_ev_ebit: f64,
    /// Average ROIC (%)
    pub avg_roic: f64,
}

impl PortfolioSummary {
    /// `None` for an empty result.
    pub fn from_ranked(stocks: &[RankedStock]) -> Option<Self> {
        if stocks.is_empty() {
            return None;
        }

        let n = stocks.len() as f64;
        let avg = |f: fn(&RankedStock) -> f64| stocks.iter().map(f).sum::<f64>() / n;

        Some(Self {
            count: stocks.len(),
            avg_dividend_yield: avg(|s| s.dividend_yield),
            avg_ev_ebit: avg(|s| s.ev_ebit),
            avg_roic: avg(|s| s.roic),
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} stocks | avg DY {} | avg EV/EBIT {} | avg ROIC {}",
            self.count,
            format_percent(self.avg_dividend_yield),
            format_number(self.avg_ev_ebit),
            format_percent(self.avg_roic)
        )
    }
}
