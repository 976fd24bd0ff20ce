//! Yahoo Finance chart client for B3 listings.
//!
//! Requests go through a list of proxy templates, each tried against every
//! chart endpoint (`query1`, then `query2`). An HTTP 429 waits with
//! exponential backoff and restarts the whole sweep; any other failure moves
//! on to the next candidate.
//!
//! # Response
//! ```text
//! {"chart": {"result": [{"timestamp": [..],
//!                        "indicators": {"quote": [{"close": [..]}]}}]}}
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use valor_common::config::HistoryConfig;

use super::provider::{HistoryError, PriceHistoryProvider};
use super::{PriceDataPoint, StockPriceHistory, TimePeriod};

/// Exchange suffix for B3 symbols on Yahoo.
const B3_SUFFIX: &str = ".SA";

/// Placeholder replaced by the encoded target URL in proxy templates.
const URL_PLACEHOLDER: &str = "{url}";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    #[serde(default)]
    pub indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Turn a chart response into a daily series.
///
/// `day` is the 1-based index in the raw series; missing, zero and negative
/// closes are dropped afterwards, so gaps in `day` are expected.
pub fn parse_chart(
    response: &ChartResponse,
    ticker: &str,
    company_name: &str,
) -> Result<StockPriceHistory, HistoryError> {
    let result = response
        .chart
        .result
        .as_ref()
        .and_then(|r| r.first())
        .ok_or_else(|| HistoryError::NoData(ticker.to_string()))?;

    let timestamps = result.timestamp.as_deref().unwrap_or_default();
    let quote = result.indicators.as_ref().and_then(|i| i.quote.first());

    let quote = match quote {
        Some(quote) if !timestamps.is_empty() => quote,
        _ => return Err(HistoryError::Parse("missing timestamps or quotes".into())),
    };

    let history: Vec<PriceDataPoint> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = quote.close.get(i).copied().flatten()?;
            let price = round_cents(close);
            if !(price > 0.0) {
                return None;
            }
            let date = DateTime::<Utc>::from_timestamp(ts, 0)?.date_naive();
            Some(PriceDataPoint {
                date,
                price,
                day: i + 1,
            })
        })
        .collect();

    StockPriceHistory::from_points(ticker, company_name, history)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Client
// ============================================================================

/// Chart client with proxy fallback and rate-limit backoff.
pub struct YahooChartClient {
    client: reqwest::Client,
    config: HistoryConfig,
}

impl YahooChartClient {
    pub fn new(config: HistoryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    /// Yahoo symbol for a B3 ticker: "PETR4" → "PETR4.SA".
    pub fn symbol(ticker: &str) -> String {
        format!("{}{}", ticker.trim().to_uppercase(), B3_SUFFIX)
    }

    /// Chart URL on one endpoint.
    pub fn chart_url(endpoint: &str, symbol: &str, period: TimePeriod) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            endpoint.trim_end_matches('/'),
            symbol,
            period.yahoo_range()
        )
    }

    /// Fill a proxy template. A bare `{url}` means a direct request.
    pub fn proxied_url(template: &str, target: &str) -> String {
        if template == URL_PLACEHOLDER {
            return target.to_string();
        }
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        template.replace(URL_PLACEHOLDER, &encoded)
    }

    /// Delay before retry number `attempt + 1`: `2^attempt × base`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.config.backoff_base_ms.saturating_mul(factor))
    }

    /// Every (proxied URL) candidate in sweep order.
    fn candidates(&self, symbol: &str, period: TimePeriod) -> Vec<String> {
        self.config
            .proxies
            .iter()
            .flat_map(|proxy| {
                self.config.endpoints.iter().map(move |endpoint| {
                    Self::proxied_url(proxy, &Self::chart_url(endpoint, symbol, period))
                })
            })
            .collect()
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        period: TimePeriod,
    ) -> Result<ChartResponse, HistoryError> {
        let candidates = self.candidates(symbol, period);
        let mut attempt = 0u32;
        let mut last_error = None;

        'sweep: loop {
            for url in &candidates {
                debug!(url = %url, symbol = symbol, "Fetching chart");

                let response = match self.client.get(url).send().await {
                    Ok(response) => response,
                    Err(e) => {
                        last_error = Some(HistoryError::Network(e.to_string()));
                        continue;
                    }
                };

                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    if attempt < self.config.max_retries {
                        let wait = self.backoff_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            wait_ms = wait.as_millis() as u64,
                            "Rate limited (429), backing off"
                        );
                        tokio::time::sleep(wait).await;
                        attempt += 1;
                        continue 'sweep;
                    }
                    last_error = Some(HistoryError::RateLimited);
                    continue;
                }

                if !status.is_success() {
                    last_error = Some(HistoryError::HttpStatus(status.as_u16()));
                    continue;
                }

                let body = match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        last_error = Some(HistoryError::Network(e.to_string()));
                        continue;
                    }
                };

                match serde_json::from_str::<ChartResponse>(&body) {
                    Ok(chart) => return Ok(chart),
                    Err(e) => last_error = Some(HistoryError::Parse(e.to_string())),
                }
            }

            return Err(last_error.unwrap_or(HistoryError::NotConfigured));
        }
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooChartClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        company_name: &str,
        period: TimePeriod,
    ) -> Result<StockPriceHistory, HistoryError> {
        let symbol = Self::symbol(ticker);
        let chart = self.fetch_chart(&symbol, period).await?;
        let history = parse_chart(&chart, ticker, company_name)?;

        debug!(
            symbol = %symbol,
            points = history.len(),
            variation = history.variation,
            "Price history loaded"
        );
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_symbol_and_urls() {
        assert_eq!(YahooChartClient::symbol("petr4"), "PETR4.SA");
        assert_eq!(
            YahooChartClient::chart_url("https://query1.finance.yahoo.com/", "PETR4.SA", TimePeriod::OneYear),
            "https://query1.finance.yahoo.com/v8/finance/chart/PETR4.SA?range=1y&interval=1d"
        );
        assert_eq!(
            YahooChartClient::proxied_url("https://proxy.test/?url={url}", "https://a.b/c?x=1&y=2"),
            "https://proxy.test/?url=https%3A%2F%2Fa.b%2Fc%3Fx%3D1%26y%3D2"
        );
        assert_eq!(YahooChartClient::proxied_url("{url}", "https://a.b/c"), "https://a.b/c");
    }

    #[test]
    fn test_candidate_order() {
        let client = YahooChartClient::new(HistoryConfig {
            proxies: vec!["{url}".into(), "https://p.test/?u={url}".into()],
            endpoints: vec!["https://q1.test".into(), "https://q2.test".into()],
            ..HistoryConfig::default()
        });

        let urls = client.candidates("VALE3.SA", TimePeriod::OneMonth);
        assert_eq!(urls.len(), 4);
        assert!(urls[0].starts_with("https://q1.test/"));
        assert!(urls[1].starts_with("https://q2.test/"));
        assert!(urls[2].starts_with("https://p.test/?u=https%3A%2F%2Fq1.test"));
        assert!(urls[3].starts_with("https://p.test/?u=https%3A%2F%2Fq2.test"));
    }

    #[test]
    fn test_backoff_doubles() {
        let client = YahooChartClient::new(HistoryConfig::default());
        assert_eq!(client.backoff_delay(0), Duration::from_millis(2000));
        assert_eq!(client.backoff_delay(1), Duration::from_millis(4000));
    }

    #[test]
    fn test_parse_chart() {
        let response = chart(
            r#"{"chart": {"result": [{
                "timestamp": [1704196800, 1704283200, 1704369600, 1704456000],
                "indicators": {"quote": [{"close": [36.514, null, 0.0, 38.0]}]}
            }]}}"#,
        );

        let history = parse_chart(&response, "PETR4", "Petrobras").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.history[0].price, 36.51);
        assert_eq!(history.history[0].day, 1);
        assert_eq!(history.history[0].date.to_string(), "2024-01-02");
        assert_eq!(history.history[1].day, 4);
        assert_eq!(history.current_price, 38.0);
        assert!((history.variation - (38.0 - 36.51) / 36.51 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_chart_without_result() {
        let response = chart(r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#);
        assert!(matches!(
            parse_chart(&response, "XXXX3", ""),
            Err(HistoryError::NoData(_))
        ));
    }

    #[test]
    fn test_parse_chart_without_quotes() {
        let response = chart(r#"{"chart": {"result": [{"timestamp": [1704196800]}]}}"#);
        assert!(matches!(
            parse_chart(&response, "PETR4", ""),
            Err(HistoryError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_chart_all_closes_invalid() {
        let response = chart(
            r#"{"chart": {"result": [{"timestamp": [1704196800],
                "indicators": {"quote": [{"close": [null]}]}}]}}"#,
        );
        assert!(matches!(
            parse_chart(&response, "PETR4", ""),
            Err(HistoryError::NoData(_))
        ));
    }
}
