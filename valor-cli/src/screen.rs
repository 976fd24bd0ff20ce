//! `valor screen`: rank an exported fundamentals sheet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use valor_common::validation::Validate;
use valor_common::{Config, FilterConfig};
use valor_screener::screener::{FilterConfigPatch, ReportFormat, ScreenerEngine, ScreenerReport};
use valor_screener::read_rows;

/// Arguments of `valor screen`. Threshold flags override the config for this run.
#[derive(Args, Debug)]
pub struct ScreenArgs {
    /// Sheet exported from Fundamentus or Status Invest (.csv, .json, .xlsx)
    pub file: PathBuf,

    /// Minimum average daily volume in BRL (exclusive)
    #[arg(long)]
    pub min_liquidity: Option<f64>,

    /// Minimum EBIT margin (%)
    #[arg(long)]
    pub min_ebit_margin: Option<f64>,

    /// Minimum ROIC (%)
    #[arg(long)]
    pub min_roic: Option<f64>,

    /// Report format: markdown, json or csv
    #[arg(short, long)]
    pub format: Option<String>,

    /// Keep only the first N ranked stocks
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Write the report to this path instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ScreenArgs {
    fn patch(&self) -> FilterConfigPatch {
        FilterConfigPatch {
            min_liquidity: self.min_liquidity,
            min_ebit_margin: self.min_ebit_margin,
            min_roic: self.min_roic,
        }
    }

    /// Thresholds for this run: config values with flag overrides.
    fn filters(&self, config: &Config) -> Result<FilterConfig> {
        let filters = self.patch().apply_to(&config.screener.filters);
        filters
            .validate()
            .map_err(|e| valor_common::Error::Config(e.to_string()))?;
        Ok(filters)
    }

    fn report_format(&self, config: &Config) -> Result<ReportFormat> {
        let raw = self
            .format
            .as_deref()
            .unwrap_or(&config.screener.report_format);
        let format: ReportFormat = raw.parse().map_err(valor_common::Error::InvalidInput)?;
        Ok(format)
    }
}

pub fn run(args: ScreenArgs, config: &Config) -> Result<()> {
    let filters = args.filters(config)?;
    let format = args.report_format(config)?;

    let rows = read_rows(&args.file)
        .map_err(valor_common::Error::from)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let result = ScreenerEngine::new(filters).run(&rows);
    let report = ScreenerReport::new(result).with_limit(args.top.or(config.screener.top));

    match &args.output {
        Some(path) => {
            let saved = report.save_to_file(path, format)?;
            info!(path = %saved.display(), format = %format, "Report saved");
            println!("{}", saved.display());
        }
        None => println!("{}", report.generate(format)?),
    }

    Ok(())
}
