//! Quantitative filtering module for the screener.
//!
//! Implements the filter stages of the funnel:
//! 1. Liquidity: average daily volume strictly above the floor
//! 2. Profitability: strictly positive EBIT margin
//! 3. Quality: ROIC at or above the floor
//! 4. Legal: no companies under judicial recovery
//! 5. Outliers: no unknown tickers, non-positive prices or EV/EBIT
//!
//! Stages 1–3 run before sorting and deduplication, 4–5 after.

use serde::{Deserialize, Serialize};
use valor_common::config::FilterConfig;

use super::types::{NormalizedStock, UNKNOWN_TICKER};

/// Company-name markers for judicial recovery, lower-cased.
const JUDICIAL_RECOVERY_MARKERS: &[&str] = &["recup jud", "judicial recovery"];

// ============================================================================
// Filter Stage
// ============================================================================

/// Filter stage identifier for tracking where stocks are eliminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    /// Liquidity floor
    Liquidity,
    /// EBIT margin > 0
    Profitability,
    /// ROIC floor
    Quality,
    /// One share class per issuer
    Deduplication,
    /// Judicial recovery exclusion
    Legal,
    /// Corrupted or negative-valuation records
    Outlier,
}

impl std::fmt::Display for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Liquidity => write!(f, "Liquidity"),
            Self::Profitability => write!(f, "Profitability"),
            Self::Quality => write!(f, "Quality"),
            Self::Deduplication => write!(f, "Deduplication"),
            Self::Legal => write!(f, "Legal status"),
            Self::Outlier => write!(f, "Outlier cleanup"),
        }
    }
}

// ============================================================================
// Filter Result
// ============================================================================

/// Result of a filtering stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Stage name
    pub stage: FilterStage,
    /// Number of stocks that passed this stage
    pub passed: usize,
    /// Number of stocks eliminated at this stage
    pub eliminated: usize,
    /// Elimination rate (%)
    pub elimination_rate: f64,
}

impl FilterResult {
    pub fn new(stage: FilterStage, input_count: usize, passed_count: usize) -> Self {
        let eliminated = input_count.saturating_sub(passed_count);
        let elimination_rate = if input_count > 0 {
            (eliminated as f64 / input_count as f64) * 100.0
        } else {
            0.0
        };

        Self {
            stage,
            passed: passed_count,
            eliminated,
            elimination_rate,
        }
    }
}

// ============================================================================
// Quantitative Filter
// ============================================================================

/// Stage predicates parameterized by the filter thresholds.
#[derive(Debug, Clone)]
pub struct QuantitativeFilter {
    config: FilterConfig,
}

impl QuantitativeFilter {
    /// Create a new quantitative filter with the given configuration.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FilterConfig::default())
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn apply(
        stage: FilterStage,
        stocks: Vec<NormalizedStock>,
        keep: impl Fn(&NormalizedStock) -> bool,
    ) -> (Vec<NormalizedStock>, FilterResult) {
        let input_count = stocks.len();
        let passed: Vec<NormalizedStock> = stocks.into_iter().filter(|s| keep(s)).collect();
        let result = FilterResult::new(stage, input_count, passed.len());
        (passed, result)
    }

    // ========================================================================
    // Stage 1: Liquidity
    // ========================================================================

    /// Keep stocks whose liquidity is strictly above `min_liquidity`.
    pub fn filter_liquidity(
        &self,
        stocks: Vec<NormalizedStock>,
    ) -> (Vec<NormalizedStock>, FilterResult) {
        Self::apply(FilterStage::Liquidity, stocks, |s| self.passes_liquidity(s))
    }

    pub fn passes_liquidity(&self, stock: &NormalizedStock) -> bool {
        stock.liquidity > self.config.min_liquidity
    }

    // ========================================================================
    // Stage 2: Profitability
    // ========================================================================

    /// Keep stocks with a strictly positive EBIT margin.
    ///
    /// `min_ebit_margin` is deliberately not consulted; missing margins were
    /// parsed as `0` and fall out here.
    pub fn filter_profitability(
        &self,
        stocks: Vec<NormalizedStock>,
    ) -> (Vec<NormalizedStock>, FilterResult) {
        Self::apply(FilterStage::Profitability, stocks, passes_profitability)
    }

    // ========================================================================
    // Stage 3: Quality
    // ========================================================================

    /// Keep stocks whose ROIC is at least `min_roic`.
    pub fn filter_quality(
        &self,
        stocks: Vec<NormalizedStock>,
    ) -> (Vec<NormalizedStock>, FilterResult) {
        Self::apply(FilterStage::Quality, stocks, |s| self.passes_quality(s))
    }

    pub fn passes_quality(&self, stock: &NormalizedStock) -> bool {
        stock.roic >= self.config.min_roic
    }

    // ========================================================================
    // Stage 4: Legal Status
    // ========================================================================

    /// Drop companies flagged as under judicial recovery.
    pub fn filter_legal(
        &self,
        stocks: Vec<NormalizedStock>,
    ) -> (Vec<NormalizedStock>, FilterResult) {
        Self::apply(FilterStage::Legal, stocks, passes_legal)
    }

    // ========================================================================
    // Stage 5: Outlier Cleanup
    // ========================================================================

    /// Drop corrupted records and negative valuations.
    pub fn remove_outliers(
        &self,
        stocks: Vec<NormalizedStock>,
    ) -> (Vec<NormalizedStock>, FilterResult) {
        Self::apply(FilterStage::Outlier, stocks, passes_outlier_check)
    }
}

pub fn passes_profitability(stock: &NormalizedStock) -> bool {
    stock.ebit_margin > 0.0
}

pub fn passes_legal(stock: &NormalizedStock) -> bool {
    let name = stock.company_name.to_lowercase();
    !JUDICIAL_RECOVERY_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
}

pub fn passes_outlier_check(stock: &NormalizedStock) -> bool {
    if stock.ticker.is_empty() || stock.ticker == UNKNOWN_TICKER {
        return false;
    }

    // Negated comparisons so that NaN is rejected too.
    if !(stock.price > 0.0) {
        return false;
    }

    if !(stock.ev_ebit > 0.0) {
        return false;
    }

    true
}

// ============================================================================
// Tests
// ============================================================================
