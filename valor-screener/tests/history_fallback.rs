//! Integration tests for price history fallback.
//!
//! Runs the chart client against local mock servers to verify endpoint and
//! proxy fallback, rate-limit backoff and error reporting.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use valor_common::config::HistoryConfig;
use valor_screener::history::{
    HistoryError, PriceHistoryProvider, StockPriceHistory, TimePeriod, YahooChartClient,
};

// ============================================================================
// Helpers
// ============================================================================

const CHART_PATH: &str = "/v8/finance/chart/PETR4.SA";

fn config(proxies: Vec<String>, endpoints: Vec<String>) -> HistoryConfig {
    HistoryConfig {
        proxies,
        endpoints,
        timeout_secs: 5,
        max_retries: 2,
        backoff_base_ms: 1,
    }
}

fn direct(endpoints: Vec<String>) -> YahooChartClient {
    YahooChartClient::new(config(vec!["{url}".into()], endpoints))
}

fn chart_body() -> serde_json::Value {
    json!({
        "chart": {
            "result": [{
                "timestamp": [1704196800, 1704283200, 1704369600],
                "indicators": {"quote": [{"close": [36.0, 36.9, 37.8]}]}
            }],
            "error": null
        }
    })
}

async fn chart_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(chart_body())
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Chart Client
// ============================================================================

#[tokio::test]
async fn test_direct_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .and(query_param("range", "6mo"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = direct(vec![server.uri()]);
    let history = client
        .fetch_history("petr4", "Petrobras", TimePeriod::SixMonths)
        .await
        .unwrap();

    assert_eq!(history.ticker, "petr4");
    assert_eq!(history.company_name, "Petrobras");
    assert_eq!(history.len(), 3);
    assert_eq!(history.current_price, 37.8);
    assert!((history.variation - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_falls_back_to_second_endpoint() {
    let failing = chart_server(500).await;
    let healthy = chart_server(200).await;

    let client = direct(vec![failing.uri(), healthy.uri()]);
    let history = client
        .fetch_history("PETR4", "", TimePeriod::OneMonth)
        .await
        .unwrap();

    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_falls_back_across_proxies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxy-a"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy-b"))
        .and(query_param(
            "url",
            "https://query1.finance.yahoo.com/v8/finance/chart/PETR4.SA?range=1y&interval=1d",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = YahooChartClient::new(config(
        vec![
            format!("{}/proxy-a?url={{url}}", server.uri()),
            format!("{}/proxy-b?url={{url}}", server.uri()),
        ],
        vec!["https://query1.finance.yahoo.com".into()],
    ));

    let history = client
        .fetch_history("PETR4", "Petrobras", TimePeriod::OneYear)
        .await
        .unwrap();
    assert_eq!(history.current_price, 37.8);
}

#[tokio::test]
async fn test_rate_limit_backs_off_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = direct(vec![server.uri()]);
    let history = client
        .fetch_history("PETR4", "", TimePeriod::OneMonth)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let client = direct(vec![server.uri()]);
    let err = client
        .fetch_history("PETR4", "", TimePeriod::OneMonth)
        .await
        .unwrap_err();

    assert_eq!(err, HistoryError::RateLimited);
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_last_error_is_reported() {
    let first = chart_server(500).await;
    let second = chart_server(404).await;

    let client = direct(vec![first.uri(), second.uri()]);
    let err = client
        .fetch_history("PETR4", "", TimePeriod::OneMonth)
        .await
        .unwrap_err();

    assert_eq!(err, HistoryError::HttpStatus(404));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let client = direct(vec!["http://127.0.0.1:1".into()]);
    let err = client
        .fetch_history("PETR4", "", TimePeriod::OneMonth)
        .await
        .unwrap_err();

    assert!(matches!(err, HistoryError::Network(_)));
}

#[tokio::test]
async fn test_invalid_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CHART_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let err = direct(vec![server.uri()])
        .fetch_history("PETR4", "", TimePeriod::OneMonth)
        .await
        .unwrap_err();
    assert!(matches!(err, HistoryError::Parse(_)));
}

#[tokio::test]
async fn test_unknown_symbol_has_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {"result": null, "error": {"code": "Not Found"}}
        })))
        .mount(&server)
        .await;

    let err = direct(vec![server.uri()])
        .fetch_history("ZZZZ3", "", TimePeriod::Max)
        .await
        .unwrap_err();
    assert_eq!(err, HistoryError::NoData("ZZZZ3".into()));
}

#[tokio::test]
async fn test_empty_configuration() {
    let client = YahooChartClient::new(config(Vec::new(), Vec::new()));
    let err = client
        .fetch_history("PETR4", "", TimePeriod::OneMonth)
        .await
        .unwrap_err();
    assert_eq!(err, HistoryError::NotConfigured);
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Mock provider that fails a set number of times, then answers with an
/// empty series.
struct FlakeyProvider {
    failures_remaining: AtomicU32,
    total_calls: AtomicU32,
}

impl FlakeyProvider {
    fn new(failures: u32) -> Self {
        Self {
            failures_remaining: AtomicU32::new(failures),
            total_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl PriceHistoryProvider for FlakeyProvider {
    fn name(&self) -> &'static str {
        "flakey"
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        company_name: &str,
        _period: TimePeriod,
    ) -> Result<StockPriceHistory, HistoryError> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let remaining = self.failures_remaining.load(Ordering::Relaxed);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::Relaxed);
            return Err(HistoryError::Network("connection reset".into()));
        }
        StockPriceHistory::from_points(ticker, company_name, Vec::new())
    }
}

#[tokio::test]
async fn test_provider_trait_object_retry_on_recoverable() {
    let flakey = Arc::new(FlakeyProvider::new(2));
    let provider: Arc<dyn PriceHistoryProvider> = flakey.clone();

    let mut last = None;
    for _ in 0..3 {
        match provider.fetch_history("VALE3", "Vale", TimePeriod::OneMonth).await {
            Err(e) if e.is_recoverable() => last = Some(e),
            other => {
                last = other.err();
                break;
            }
        }
    }

    // Two network failures, then the provider answers with an empty series.
    assert_eq!(last, Some(HistoryError::NoData("VALE3".into())));
    assert_eq!(flakey.total_calls.load(Ordering::Relaxed), 3);
    assert_eq!(provider.name(), "flakey");
}
