//! Screener state owner.
//!
//! Holds the loaded rows and the active thresholds, and recomputes the
//! ranked result whenever either changes. Configuration is validated here,
//! at the boundary, so the pipeline itself never has to fail.

use thiserror::Error;
use tracing::{debug, warn};
use valor_common::config::FilterConfig;
use valor_common::validation::{Validate, ValidationError};

use super::engine::{ScreenerEngine, ScreenerResult};
use super::types::{InputRow, RankedStock};

/// A recomputation that could not run.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("invalid filter configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
}

/// Partial threshold update; `None` leaves the current value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterConfigPatch {
    pub min_liquidity: Option<f64>,
    pub min_ebit_margin: Option<f64>,
    pub min_roic: Option<f64>,
}

impl FilterConfigPatch {
    pub fn min_liquidity(mut self, value: f64) -> Self {
        self.min_liquidity = Some(value);
        self
    }

    pub fn min_ebit_margin(mut self, value: f64) -> Self {
        self.min_ebit_margin = Some(value);
        self
    }

    pub fn min_roic(mut self, value: f64) -> Self {
        self.min_roic = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min_liquidity.is_none() && self.min_ebit_margin.is_none() && self.min_roic.is_none()
    }

    /// Merge onto `base`.
    pub fn apply_to(&self, base: &FilterConfig) -> FilterConfig {
        FilterConfig {
            min_liquidity: self.min_liquidity.unwrap_or(base.min_liquidity),
            min_ebit_margin: self.min_ebit_margin.unwrap_or(base.min_ebit_margin),
            min_roic: self.min_roic.unwrap_or(base.min_roic),
        }
    }
}

/// Explicit owner of screening state.
#[derive(Debug, Default)]
pub struct ScreenerStore {
    base_config: FilterConfig,
    config: FilterConfig,
    raw_rows: Vec<InputRow>,
    last_result: Option<ScreenerResult>,
    selected: Option<String>,
    last_error: Option<ProcessingError>,
}

impl ScreenerStore {
    /// Create a store whose thresholds (and reset target) are `config`.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            base_config: config,
            config,
            ..Self::default()
        }
    }

    /// Replace the loaded rows and recompute.
    pub fn set_raw_data(&mut self, rows: Vec<InputRow>) {
        self.raw_rows = rows;
        self.apply_filters();
    }

    /// Merge a partial threshold update and recompute.
    pub fn update_config(&mut self, patch: FilterConfigPatch) {
        self.config = patch.apply_to(&self.config);
        self.apply_filters();
    }

    /// Recompute the ranked result from the current rows and thresholds.
    ///
    /// No-op without rows. On an invalid configuration the previous result
    /// stays in place and the error is recorded.
    pub fn apply_filters(&mut self) {
        if self.raw_rows.is_empty() {
            debug!("No rows loaded, skipping recomputation");
            return;
        }

        if let Err(e) = self.config.validate() {
            let error = ProcessingError::from(e);
            warn!(error = %error, "Processing failed");
            self.last_error = Some(error);
            return;
        }

        let result = ScreenerEngine::new(self.config).run(&self.raw_rows);
        self.last_error = None;
        self.last_result = Some(result);
        self.refresh_selection();
    }

    /// Clear rows, results and selection.
    ///
    /// Thresholds return to the config passed to [`ScreenerStore::new`], not
    /// to `FilterConfig::default()`. The two agree for `ScreenerStore::default()`.
    pub fn reset(&mut self) {
        self.raw_rows.clear();
        self.last_result = None;
        self.selected = None;
        self.last_error = None;
        self.config = self.base_config;
    }

    /// Select a ranked stock by ticker, or clear the selection with `None`.
    ///
    /// Returns whether the ticker is present in the current result.
    pub fn select(&mut self, ticker: Option<&str>) -> bool {
        match ticker {
            None => {
                self.selected = None;
                true
            }
            Some(ticker) => {
                let found = self.processed().iter().any(|s| s.ticker == ticker);
                self.selected = found.then(|| ticker.to_string());
                found
            }
        }
    }

    fn refresh_selection(&mut self) {
        if let Some(ticker) = self.selected.take() {
            if self.processed().iter().any(|s| s.ticker == ticker) {
                self.selected = Some(ticker);
            }
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn raw_rows(&self) -> &[InputRow] {
        &self.raw_rows
    }

    pub fn processed(&self) -> &[RankedStock] {
        self.last_result
            .as_ref()
            .map(|r| r.stocks.as_slice())
            .unwrap_or(&[])
    }

    /// Full result of the last successful recomputation.
    pub fn last_result(&self) -> Option<&ScreenerResult> {
        self.last_result.as_ref()
    }

    pub fn selected(&self) -> Option<&RankedStock> {
        let ticker = self.selected.as_deref()?;
        self.processed().iter().find(|s| s.ticker == ticker)
    }

    pub fn last_error(&self) -> Option<&ProcessingError> {
        self.last_error.as_ref()
    }
}
