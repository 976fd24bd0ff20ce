//! Configuration management for valor.
//!
//! All valor tools share a single configuration file at `~/.valor/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (applied by the CLI for a single invocation)
//! 2. Environment variables (VALOR_* prefix)
//! 3. Explicit config file values
//! 4. Default values
//!
//! # Environment Variable Mapping
//!
//! - `VALOR_LOG_LEVEL` → observability.log_level
//! - `VALOR_LOG_FORMAT` → observability.log_format
//! - `VALOR_MIN_LIQUIDITY` → screener.filters.min_liquidity
//! - `VALOR_MIN_EBIT_MARGIN` → screener.filters.min_ebit_margin
//! - `VALOR_MIN_ROIC` → screener.filters.min_roic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".valor"),
        |dirs| dirs.home_dir().join(".valor"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Main Configuration
// ============================================================================

/// Root configuration shared by the screener library and the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Screener configuration (filter thresholds and output)
    #[serde(default)]
    pub screener: ScreenerConfig,

    /// Price history client configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file is not an error: defaults are used instead.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load an explicit file, or the default location, with environment
    /// variable overrides applied.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("VALOR_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("VALOR_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        let filters = &mut self.screener.filters;
        apply_f64_override("VALOR_MIN_LIQUIDITY", &mut filters.min_liquidity);
        apply_f64_override("VALOR_MIN_EBIT_MARGIN", &mut filters.min_ebit_margin);
        apply_f64_override("VALOR_MIN_ROIC", &mut filters.min_roic);
    }
}

fn apply_f64_override(var: &str, target: &mut f64) {
    if let Ok(raw) = std::env::var(var) {
        match raw.trim().parse::<f64>() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!(var, value = %raw, "Ignoring non-numeric override"),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to set to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Screener Configuration
// ============================================================================

/// Screener section: filter thresholds plus output preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Filter thresholds
    #[serde(default)]
    pub filters: FilterConfig,

    /// Keep only the first N ranked stocks in reports (all when unset)
    #[serde(default)]
    pub top: Option<usize>,

    /// Default report format (markdown, json, csv)
    #[serde(default = "default_report_format")]
    pub report_format: String,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            filters: FilterConfig::default(),
            top: None,
            report_format: default_report_format(),
        }
    }
}

fn default_report_format() -> String {
    "markdown".into()
}

/// Thresholds for the screening funnel.
///
/// Accepts both snake_case and the camelCase keys used by spreadsheet
/// tooling exports (`minLiquidity`, `minEbitMargin`, `minRoic`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum average daily financial volume (BRL), exclusive
    #[serde(default = "default_min_liquidity", alias = "minLiquidity")]
    pub min_liquidity: f64,

    /// Minimum EBIT margin (%). Accepted but not enforced: the
    /// profitability stage always requires a strictly positive margin.
    #[serde(default, alias = "minEbitMargin")]
    pub min_ebit_margin: f64,

    /// Minimum ROIC (%), inclusive
    #[serde(default = "default_min_roic", alias = "minRoic")]
    pub min_roic: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_liquidity: default_min_liquidity(),
            min_ebit_margin: 0.0,
            min_roic: default_min_roic(),
        }
    }
}

impl FilterConfig {
    /// One-line summary for logs and reports.
    pub fn summary(&self) -> String {
        format!(
            "liquidity > {}, EBIT margin > 0, ROIC >= {}%",
            self.min_liquidity, self.min_roic
        )
    }
}

fn default_min_liquidity() -> f64 {
    1_000_000.0
}

fn default_min_roic() -> f64 {
    10.0
}

// ============================================================================
// Price History Configuration
// ============================================================================

/// Configuration for the remote price history client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Proxy URL templates. `{url}` is replaced by the percent-encoded
    /// target URL; a bare `{url}` means a direct request.
    #[serde(default = "default_proxies")]
    pub proxies: Vec<String>,

    /// Chart API base URLs, tried in order for every proxy.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of rate-limit retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff after HTTP 429 (milliseconds)
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            proxies: default_proxies(),
            endpoints: default_endpoints(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

fn default_proxies() -> Vec<String> {
    vec![
        "https://corsproxy.io/?url={url}".into(),
        "https://api.allorigins.win/raw?url={url}".into(),
        "https://api.codetabs.com/v1/proxy?quest={url}".into(),
    ]
}

fn default_endpoints() -> Vec<String> {
    vec![
        "https://query1.finance.yahoo.com".into(),
        "https://query2.finance.yahoo.com".into(),
    ]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    2000
}
