//! `valor history`: daily closes of one ticker.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use valor_common::validation::Validate;
use valor_common::Config;
use valor_screener::format::{format_currency, format_percent};
use valor_screener::history::{PriceHistoryProvider, StockPriceHistory, TimePeriod, YahooChartClient};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// B3 ticker, e.g. PETR4
    pub ticker: String,

    /// Company name shown in the header
    #[arg(long, default_value = "")]
    pub name: String,

    /// Window: 1M, 6M, 1Y, 5Y or MAX
    #[arg(short, long, default_value_t = TimePeriod::OneMonth)]
    pub period: TimePeriod,

    /// Print the series as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: HistoryArgs, config: &Config) -> Result<()> {
    config
        .history
        .validate()
        .map_err(|e| valor_common::Error::Config(e.to_string()))?;

    let provider: Box<dyn PriceHistoryProvider> =
        Box::new(YahooChartClient::new(config.history.clone()));

    let history = provider
        .fetch_history(&args.ticker, &args.name, args.period)
        .await
        .map_err(valor_common::Error::from)
        .with_context(|| format!("Failed to load {} history for {}", args.period, args.ticker))?;

    info!(
        provider = provider.name(),
        ticker = %history.ticker,
        points = history.len(),
        "History loaded"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else {
        print!("{}", render(&history, args.period));
    }
    Ok(())
}

fn render(history: &StockPriceHistory, period: TimePeriod) -> String {
    let sign = if history.variation >= 0.0 { "+" } else { "" };
    let mut out = String::new();

    let title = if history.company_name.is_empty() {
        history.ticker.to_uppercase()
    } else {
        format!("{} - {}", history.ticker.to_uppercase(), history.company_name)
    };
    let _ = writeln!(
        out,
        "{} | {} | {} ({}{})",
        title,
        period,
        format_currency(history.current_price),
        sign,
        format_percent(history.variation)
    );

    for point in &history.history {
        let _ = writeln!(out, "{}  {:>14}", point.date, format_currency(point.price));
    }
    out
}
