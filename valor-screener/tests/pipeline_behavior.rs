//! Integration tests for the screening pipeline.
//!
//! Covers the documented funnel behavior end to end plus invariants that
//! must hold for any input: dense rankings, determinism, idempotence and
//! filter post-conditions.

use proptest::prelude::*;

use valor_common::config::FilterConfig;
use valor_screener::screener::{
    base_issuer_key, deduplicate_companies, parse_numeric, process_stocks, sort_by_value,
    CellValue, InputRow, NormalizedStock, RankedStock, RawRow,
};

// ============================================================================
// Helpers
// ============================================================================

fn raw_row(cells: &[(&str, &str)]) -> InputRow {
    cells.iter().map(|(h, v)| (*h, *v)).collect::<RawRow>().into()
}

fn tickers(ranked: &[RankedStock]) -> Vec<&str> {
    ranked.iter().map(|s| s.ticker.as_str()).collect()
}

fn stock(ticker: &str, liquidity: f64) -> NormalizedStock {
    NormalizedStock {
        ticker: ticker.to_string(),
        company_name: String::new(),
        price: 10.0,
        ebit_margin: 10.0,
        ev_ebit: 5.0,
        dividend_yield: 0.0,
        liquidity,
        roic: 15.0,
    }
}

fn sample_sheet() -> Vec<InputRow> {
    vec![
        raw_row(&[("Papel", "BAD"), ("Liquidez", "500"), ("Cotação", "10")]),
        raw_row(&[
            ("Papel", "GOOD"),
            ("Liquidez", "2000000"),
            ("EV/EBIT", "5"),
            ("ROIC", "15%"),
            ("Margem EBIT", "10%"),
            ("Cotação", "20"),
        ]),
        raw_row(&[
            ("Papel", "BEST"),
            ("Liquidez", "3000000"),
            ("EV/EBIT", "2"),
            ("ROIC", "25%"),
            ("Margem EBIT", "20%"),
            ("Cotação", "30"),
        ]),
        raw_row(&[
            ("Papel", "NEG"),
            ("Liquidez", "2000000"),
            ("EV/EBIT", "-5"),
            ("ROIC", "10%"),
            ("Margem EBIT", "10%"),
            ("Cotação", "10"),
        ]),
    ]
}

// ============================================================================
// Documented Behavior
// ============================================================================

#[test]
fn test_parse_numeric_examples() {
    let text = |s: &str| CellValue::Text(s.to_string());
    assert_eq!(parse_numeric(Some(&text("R$ 1.000,00"))), 1000.0);
    assert_eq!(parse_numeric(Some(&text("10,5"))), 10.5);
    assert_eq!(parse_numeric(Some(&text("10,5%"))), 10.5);
    assert_eq!(parse_numeric(Some(&text("1.000"))), 1000.0);
    assert_eq!(parse_numeric(Some(&text("500"))), 500.0);
    assert_eq!(parse_numeric(None), 0.0);
}

#[test]
fn test_dedup_keeps_highest_liquidity() {
    let result = deduplicate_companies(vec![
        stock("PETR3", 100.0),
        stock("PETR4", 500.0),
        stock("VALE3", 1000.0),
    ]);

    assert_eq!(result.len(), 2);
    assert!(result.iter().any(|s| s.ticker == "PETR4"));
    assert!(!result.iter().any(|s| s.ticker == "PETR3"));
}

#[test]
fn test_sort_by_ev_ebit() {
    let mut stocks = vec![
        NormalizedStock { ev_ebit: 10.0, ..stock("A", 0.0) },
        NormalizedStock { ev_ebit: 5.0, ..stock("B", 0.0) },
        NormalizedStock { ev_ebit: 20.0, ..stock("C", 0.0) },
    ];
    sort_by_value(&mut stocks);

    let order: Vec<&str> = stocks.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(order, vec!["B", "A", "C"]);
}

#[test]
fn test_full_pipeline() {
    let result = process_stocks(&sample_sheet(), &FilterConfig::default());

    assert_eq!(tickers(&result), vec!["BEST", "GOOD"]);
    assert_eq!(result[0].ranking, 1);
    assert_eq!(result[1].ranking, 2);
}

#[test]
fn test_reprocessing_output_is_stable() {
    let config = FilterConfig::default();
    let first = process_stocks(&sample_sheet(), &config);

    let fed_back: Vec<InputRow> = first.iter().cloned().map(InputRow::from).collect();
    let second = process_stocks(&fed_back, &config);

    assert_eq!(first, second);
}

#[test]
fn test_threshold_boundaries() {
    let config = FilterConfig::default();
    let rows: Vec<InputRow> = vec![
        NormalizedStock { liquidity: config.min_liquidity, ..stock("EQLQ3", 0.0) }.into(),
        NormalizedStock { roic: config.min_roic, ..stock("EQRO3", 2e6) }.into(),
    ];

    let result = process_stocks(&rows, &config);
    assert_eq!(tickers(&result), vec!["EQRO3"]);
}

#[test]
fn test_judicial_recovery_excluded() {
    let rows: Vec<InputRow> = vec![
        NormalizedStock { company_name: "ABC Recup Jud".into(), ..stock("ABCD3", 2e6) }.into(),
        stock("EFGH3", 2e6).into(),
    ];

    let result = process_stocks(&rows, &FilterConfig::default());
    assert_eq!(tickers(&result), vec!["EFGH3"]);
}

#[test]
fn test_empty_input() {
    assert!(process_stocks(&[], &FilterConfig::default()).is_empty());
}

#[test]
fn test_garbage_rows_never_fail() {
    let rows = vec![
        raw_row(&[("???", "x")]),
        raw_row(&[]),
        raw_row(&[("Papel", ""), ("Liquidez", "muito"), ("ROIC", "--")]),
    ];
    assert!(process_stocks(&rows, &FilterConfig::default()).is_empty());
}

#[test]
fn test_raw_first_row_reads_records_by_header() {
    let rows = vec![
        raw_row(&[("Papel", "AAAA3"), ("Liquidez", "10"), ("ROIC", "20%")]),
        stock("SAPR4", 5e6).into(),
    ];

    // The normalized record goes through header matching too; its
    // "liquidity" and "ebitMargin" keys match no alias, so it is cut.
    assert!(process_stocks(&rows, &FilterConfig::default()).is_empty());
}

#[test]
fn test_normalized_first_row_takes_records_as_is() {
    let rows = vec![
        stock("SAPR4", 5e6).into(),
        raw_row(&[
            ("Papel", "WEGE3"),
            ("Cotação", "38,90"),
            ("EV/EBIT", "18,2"),
            ("Marg. EBIT", "19,5%"),
            ("ROIC", "28,0%"),
            ("Liquidez", "250.000.000,00"),
        ]),
    ];

    let result = process_stocks(&rows, &FilterConfig::default());
    assert_eq!(tickers(&result), vec!["SAPR4"]);
}

#[test]
fn test_first_row_liquidity_header_precedence() {
    let rows = vec![raw_row(&[
        ("Papel", "TAEE11"),
        ("Cotação", "35,10"),
        ("EV/EBIT", "7,2"),
        ("Marg. EBIT", "70,0%"),
        ("ROIC", "14,0%"),
        ("Liq. Corr.", "1.000,00"),
        ("Liquidez Média Diária", "80.000.000,00"),
    ])];

    // "Liq. Corr." sits left of the volume column, so TAEE11 reads 1.000 of
    // liquidity and is cut by the floor.
    assert!(process_stocks(&rows, &FilterConfig::default()).is_empty());
}

// ============================================================================
// Invariants
// ============================================================================

fn arb_stock() -> impl Strategy<Value = NormalizedStock> {
    let ticker = prop_oneof![
        (
            prop::sample::select(vec!["PETR", "VALE", "ITSA", "WEGE", "BBAS", "TAEE"]),
            prop::sample::select(vec!["3", "4", "11"]),
        )
            .prop_map(|(root, class)| format!("{}{}", root, class)),
        Just("UNKNOWN".to_string()),
        Just(String::new()),
    ];
    let name = prop::sample::select(vec!["Cia Alfa", "Beta Recup Jud", "Gama S.A.", ""]);

    (
        ticker,
        name,
        -5.0f64..100.0,
        -20.0f64..60.0,
        -10.0f64..40.0,
        0.0f64..20.0,
        0.0f64..5e6,
        -10.0f64..50.0,
    )
        .prop_map(
            |(ticker, name, price, ebit_margin, ev_ebit, dividend_yield, liquidity, roic)| {
                NormalizedStock {
                    ticker,
                    company_name: name.to_string(),
                    price,
                    ebit_margin,
                    ev_ebit,
                    dividend_yield,
                    liquidity,
                    roic,
                }
            },
        )
}

fn arb_config() -> impl Strategy<Value = FilterConfig> {
    (0.0f64..3e6, -5.0f64..5.0, 0.0f64..30.0).prop_map(|(min_liquidity, min_ebit_margin, min_roic)| {
        FilterConfig {
            min_liquidity,
            min_ebit_margin,
            min_roic,
        }
    })
}

proptest! {
    #[test]
    fn prop_rankings_are_dense(stocks in prop::collection::vec(arb_stock(), 0..40), config in arb_config()) {
        let rows: Vec<InputRow> = stocks.into_iter().map(InputRow::from).collect();
        let result = process_stocks(&rows, &config);

        for (index, stock) in result.iter().enumerate() {
            prop_assert_eq!(stock.ranking, index + 1);
        }
    }

    #[test]
    fn prop_output_satisfies_every_filter(stocks in prop::collection::vec(arb_stock(), 0..40), config in arb_config()) {
        let rows: Vec<InputRow> = stocks.into_iter().map(InputRow::from).collect();
        let result = process_stocks(&rows, &config);

        let mut keys = std::collections::HashSet::new();
        for stock in &result {
            prop_assert!(stock.liquidity > config.min_liquidity);
            prop_assert!(stock.ebit_margin > 0.0);
            prop_assert!(stock.roic >= config.min_roic);
            prop_assert!(stock.price > 0.0);
            prop_assert!(stock.ev_ebit > 0.0);
            prop_assert!(stock.ticker != "UNKNOWN" && !stock.ticker.is_empty());
            prop_assert!(!stock.company_name.to_lowercase().contains("recup jud"));
            prop_assert!(keys.insert(base_issuer_key(&stock.ticker).to_string()));
        }

        for pair in result.windows(2) {
            prop_assert!(pair[0].ev_ebit <= pair[1].ev_ebit);
        }
    }

    #[test]
    fn prop_deterministic_and_idempotent(stocks in prop::collection::vec(arb_stock(), 0..40), config in arb_config()) {
        let rows: Vec<InputRow> = stocks.into_iter().map(InputRow::from).collect();

        let first = process_stocks(&rows, &config);
        let again = process_stocks(&rows, &config);
        prop_assert_eq!(&first, &again);

        let fed_back: Vec<InputRow> = first.iter().cloned().map(InputRow::from).collect();
        let second = process_stocks(&fed_back, &config);
        prop_assert_eq!(&first, &second);
    }
}
