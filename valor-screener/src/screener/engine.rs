//! Screener engine module.
//!
//! The orchestrator for a single screening pass over an input sheet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use valor_common::config::FilterConfig;
use valor_common::logging::generate_run_id;

use super::normalize::{detect_input_shape, normalize_data, InputShape};
use super::quantitative::{FilterResult, FilterStage, QuantitativeFilter};
use super::ranking::{assign_ranking, deduplicate_companies, sort_by_value};
use super::types::{InputRow, RankedStock};

// ============================================================================
// Screener Result
// ============================================================================

/// Result of a screening operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerResult {
    /// Screening ID (timestamp-based)
    pub id: String,
    /// Unique run ID, carried by every log line of the run
    pub run_id: String,
    /// Ranked stocks, cheapest EV/EBIT first
    pub stocks: Vec<RankedStock>,
    /// Filter stage results, in execution order
    pub filter_results: Vec<FilterResult>,
    /// Total rows scanned
    pub total_scanned: usize,
    /// Detected input shape
    pub input_shape: InputShape,
    /// Screening configuration used
    pub config_summary: String,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub completed_at: DateTime<Utc>,
    /// Duration in seconds
    pub duration_secs: f64,
}

impl ScreenerResult {
    /// Get the top N ranked stocks.
    pub fn top(&self, n: usize) -> Vec<&RankedStock> {
        self.stocks.iter().take(n).collect()
    }

    /// Look up a stock by ticker.
    pub fn find(&self, ticker: &str) -> Option<&RankedStock> {
        self.stocks.iter().find(|s| s.ticker == ticker)
    }

    /// Filter result for one stage, if it ran.
    pub fn stage(&self, stage: FilterStage) -> Option<&FilterResult> {
        self.filter_results.iter().find(|r| r.stage == stage)
    }

    /// Summary string for logging.
    pub fn summary(&self) -> String {
        format!(
            "Screened {} rows in {:.3}s: {} passed ({:.1}%)",
            self.total_scanned,
            self.duration_secs,
            self.stocks.len(),
            if self.total_scanned > 0 {
                (self.stocks.len() as f64 / self.total_scanned as f64) * 100.0
            } else {
                0.0
            }
        )
    }
}

// ============================================================================
// Screener Engine
// ============================================================================

/// The screener engine.
///
/// Runs the funnel in a fixed order:
/// 1. Normalize raw rows (normalized records pass through)
/// 2. Liquidity, profitability and quality filters
/// 3. Sort by EV/EBIT ascending
/// 4. Keep one share class per issuer
/// 5. Legal status and outlier cleanup
/// 6. Assign 1-based rankings
///
/// Synchronous and side-effect free apart from logging.
#[derive(Debug, Clone)]
pub struct ScreenerEngine {
    filter: QuantitativeFilter,
}

impl ScreenerEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            filter: QuantitativeFilter::new(config),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        self.filter.config()
    }

    /// Run one screening pass, recording funnel statistics.
    pub fn run(&self, rows: &[InputRow]) -> ScreenerResult {
        let started_at = Utc::now();
        let id = format!("screen_{}", started_at.format("%Y%m%d_%H%M%S"));
        let run_id = generate_run_id();
        let input_shape = detect_input_shape(rows);

        let span = valor_common::run_span!(run_id, scan_id = %id, rows = rows.len());
        let _enter = span.enter();

        let (stocks, filter_results) = if rows.is_empty() {
            debug!("Empty input, skipping all stages");
            (Vec::new(), Vec::new())
        } else {
            debug!(shape = %input_shape, "Detected input shape");
            self.run_stages(rows)
        };

        let completed_at = Utc::now();
        let duration_secs = (completed_at - started_at).num_microseconds().unwrap_or(0) as f64
            / 1_000_000.0;

        let result = ScreenerResult {
            id,
            run_id,
            stocks,
            filter_results,
            total_scanned: rows.len(),
            input_shape,
            config_summary: self.filter.config().summary(),
            started_at,
            completed_at,
            duration_secs,
        };

        info!(
            scan_id = %result.id,
            scanned = result.total_scanned,
            ranked = result.stocks.len(),
            "{}",
            result.summary()
        );

        result
    }

    fn run_stages(&self, rows: &[InputRow]) -> (Vec<RankedStock>, Vec<FilterResult>) {
        let mut filter_results = Vec::with_capacity(6);
        let stocks = normalize_data(rows);

        let (stocks, result) = self.filter.filter_liquidity(stocks);
        log_stage(&result);
        filter_results.push(result);

        let (stocks, result) = self.filter.filter_profitability(stocks);
        log_stage(&result);
        filter_results.push(result);

        let (mut stocks, result) = self.filter.filter_quality(stocks);
        log_stage(&result);
        filter_results.push(result);

        sort_by_value(&mut stocks);

        let before_dedup = stocks.len();
        let stocks = deduplicate_companies(stocks);
        let result = FilterResult::new(FilterStage::Deduplication, before_dedup, stocks.len());
        log_stage(&result);
        filter_results.push(result);

        let (stocks, result) = self.filter.filter_legal(stocks);
        log_stage(&result);
        filter_results.push(result);

        let (stocks, result) = self.filter.remove_outliers(stocks);
        log_stage(&result);
        filter_results.push(result);

        (assign_ranking(stocks), filter_results)
    }
}

fn log_stage(result: &FilterResult) {
    debug!(
        stage = %result.stage,
        passed = result.passed,
        eliminated = result.eliminated,
        "Stage complete"
    );
}

/// Run the full pipeline and return only the ranked records.
///
/// Never fails: malformed cells become zeros and fall out in the filters.
pub fn process_stocks(rows: &[InputRow], config: &FilterConfig) -> Vec<RankedStock> {
    ScreenerEngine::new(*config).run(rows).stocks
}
