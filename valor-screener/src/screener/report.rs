//! Report generation module for screener results.
//!
//! Generates reports in various formats:
//! - Markdown (for reading)
//! - JSON (for programmatic use and for feeding back as input)
//! - CSV (for spreadsheets)

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use valor_common::util::truncate_with_ellipsis;

use super::engine::ScreenerResult;
use super::summary::PortfolioSummary;
use super::types::RankedStock;
use crate::format::{format_compact_currency, format_currency, format_number, format_percent};

/// Company names longer than this are cut in the markdown table.
const MAX_NAME_CHARS: usize = 28;

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (human-readable)
    Markdown,
    /// JSON format (machine-readable)
    Json,
    /// CSV format (spreadsheet)
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

// ============================================================================
// Screener Report
// ============================================================================

/// Report generator for screener results.
pub struct ScreenerReport {
    result: ScreenerResult,
    limit: Option<usize>,
}

impl ScreenerReport {
    /// Create a new report from screener results.
    pub fn new(result: ScreenerResult) -> Self {
        Self {
            result,
            limit: None,
        }
    }

    /// Only list the first `n` ranked stocks.
    pub fn with_limit(mut self, n: Option<usize>) -> Self {
        self.limit = n;
        self
    }

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Csv => self.to_csv(),
        }
    }

    /// Save report to file, adding the format's extension when missing.
    pub fn save_to_file(&self, path: &Path, format: ReportFormat) -> Result<PathBuf> {
        let content = self.generate(format)?;

        let file_path = if path.extension().is_none() {
            path.with_extension(format.extension())
        } else {
            path.to_path_buf()
        };

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create report directory")?;
            }
        }

        std::fs::write(&file_path, content).context("Failed to write report file")?;

        Ok(file_path)
    }

    /// Stocks included in the report, honoring the limit.
    pub fn stocks(&self) -> &[RankedStock] {
        let stocks = &self.result.stocks;
        match self.limit {
            Some(n) => &stocks[..n.min(stocks.len())],
            None => stocks,
        }
    }

    /// Generate markdown report.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "# Value Screening Report\n\n**Run ID**: {}\n**Time**: {}\n**Duration**: {:.3}s\n\n",
            self.result.id,
            self.result.completed_at.format("%Y-%m-%d %H:%M:%S"),
            self.result.duration_secs
        ));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Rows scanned**: {}\n", self.result.total_scanned));
        md.push_str(&format!("- **Input shape**: {}\n", self.result.input_shape));
        md.push_str(&format!("- **Ranked**: {}\n", self.result.stocks.len()));
        md.push_str(&format!("- **Filters**: {}\n", self.result.config_summary));
        if let Some(summary) = PortfolioSummary::from_ranked(&self.result.stocks) {
            md.push_str(&format!(
                "- **Average DY**: {}\n- **Average EV/EBIT**: {}\n- **Average ROIC**: {}\n",
                format_percent(summary.avg_dividend_yield),
                format_number(summary.avg_ev_ebit),
                format_percent(summary.avg_roic)
            ));
        }
        md.push('\n');

        if !self.result.filter_results.is_empty() {
            md.push_str("### Funnel\n\n");
            md.push_str("| Stage | Passed | Eliminated | Rate |\n");
            md.push_str("|-------|--------|------------|------|\n");
            for fr in &self.result.filter_results {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% |\n",
                    fr.stage, fr.passed, fr.eliminated, fr.elimination_rate
                ));
            }
            md.push('\n');
        }

        md.push_str("## Ranking\n\n");
        if self.result.stocks.is_empty() {
            md.push_str("_No stocks passed the filters._\n\n");
        } else {
            md.push_str("| # | Ticker | Company | Price | EV/EBIT | EBIT Margin | ROIC | DY | Liquidity |\n");
            md.push_str("|---|--------|---------|-------|---------|-------------|------|----|-----------|\n");

            for stock in self.stocks() {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                    stock.ranking,
                    stock.ticker,
                    truncate_with_ellipsis(&stock.company_name, MAX_NAME_CHARS),
                    format_currency(stock.price),
                    format_number(stock.ev_ebit),
                    format_percent(stock.ebit_margin),
                    format_percent(stock.roic),
                    format_percent(stock.dividend_yield),
                    format_compact_currency(stock.liquidity),
                ));
            }
            md.push('\n');

            let shown = self.stocks().len();
            if self.result.stocks.len() > shown {
                md.push_str(&format!(
                    "_...and {} more_\n\n",
                    self.result.stocks.len() - shown
                ));
            }
        }

        md.push_str("---\n\n");
        md.push_str(&format!(
            "*Generated at {} UTC*\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ));

        md
    }

    /// Generate JSON report.
    ///
    /// The `stocks` array holds normalized records, so the file can be fed
    /// back to the screener as input.
    pub fn to_json(&self) -> Result<String> {
        if self.limit.is_some() {
            let mut trimmed = self.result.clone();
            trimmed.stocks = self.stocks().to_vec();
            return serde_json::to_string_pretty(&trimmed).context("Failed to serialize report");
        }
        serde_json::to_string_pretty(&self.result).context("Failed to serialize report")
    }

    /// Generate CSV with one row per ranked stock.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "ranking",
            "ticker",
            "companyName",
            "price",
            "evEbit",
            "ebitMargin",
            "roic",
            "dividendYield",
            "liquidity",
        ])?;

        for stock in self.stocks() {
            writer.write_record([
                stock.ranking.to_string(),
                stock.ticker.clone(),
                stock.company_name.clone(),
                stock.price.to_string(),
                stock.ev_ebit.to_string(),
                stock.ebit_margin.to_string(),
                stock.roic.to_string(),
                stock.dividend_yield.to_string(),
                stock.liquidity.to_string(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush CSV report")?;
        String::from_utf8(bytes).context("CSV report is not valid UTF-8")
    }

    /// Get the underlying result.
    pub fn result(&self) -> &ScreenerResult {
        &self.result
    }
}

// ============================================================================
// Tests
// ============================================================================
