//! End-to-end event study over one disclosure event and one window.

use std::collections::BTreeMap;

use evs_events::{AnchorMode, PoliticalEvent, Side};
use evs_returns::{
    run_event_study_core, BenchmarkMode, EventStudyRequest, PriceBar, PriceTable,
};

fn event() -> PoliticalEvent {
    PoliticalEvent {
        event_id: "congress:TEST:0011223344556677".to_string(),
        ticker: "TEST".to_string(),
        source_dataset_id: "congress".to_string(),
        actor: Some("A. Person".to_string()),
        side: Side::Buy,
        transaction_date: Some("2025-01-03".to_string()),
        report_date: None,
        shares: Some(100.0),
    }
}

fn prices() -> PriceTable {
    let mut table = PriceTable::new();
    table.insert(
        "TEST".to_string(),
        vec![
            PriceBar::new("TEST", "2025-01-03", 100.0),
            PriceBar::new("TEST", "2025-01-06", 110.0),
        ],
    );
    table.insert(
        "SPY".to_string(),
        vec![
            PriceBar::new("SPY", "2025-01-03", 500.0),
            PriceBar::new("SPY", "2025-01-06", 505.0),
        ],
    );
    table
}

#[test]
fn one_event_one_window_against_spy() {
    let events = vec![event()];
    let prices = prices();
    let outcome = run_event_study_core(&EventStudyRequest {
        events: &events,
        anchor_mode: AnchorMode::Transaction,
        sector: None,
        benchmark_mode: BenchmarkMode::SpyOnly,
        sector_etf_overrides: None,
        windows: &[1],
        prices: &prices,
    })
    .unwrap();

    assert_eq!(outcome.benchmarks.symbols, vec!["SPY"]);

    assert_eq!(outcome.window_returns.len(), 1);
    let wr = &outcome.window_returns[0];
    assert_eq!(wr.aligned_anchor_date, "2025-01-03");
    assert_eq!(wr.forward_return_percent, 10.0);

    assert_eq!(outcome.benchmark_returns.len(), 1);
    let br = &outcome.benchmark_returns[0];
    assert_eq!(br.benchmark_return_percent, 1.0);
    assert_eq!(br.excess_return_percent, 9.0);

    assert_eq!(outcome.aggregates.len(), 1);
    let agg = &outcome.aggregates[0];
    assert_eq!(agg.window_sessions, 1);
    assert_eq!(agg.benchmark_symbol, "SPY");
    assert_eq!(agg.sample_size, 1);
    assert_eq!(agg.hit_rate_percent, 100.0);
    assert_eq!(agg.mean_return_percent, 10.0);
    assert_eq!(agg.median_return_percent, 10.0);
    assert_eq!(agg.stdev_return_percent, 0.0);
    assert_eq!(agg.mean_excess_return_percent, 9.0);
}

#[test]
fn financial_sector_runs_against_spy_and_xlf() {
    let mut prices = prices();
    prices.insert(
        "XLF".to_string(),
        vec![
            PriceBar::new("XLF", "2025-01-03", 40.0),
            PriceBar::new("XLF", "2025-01-06", 40.8),
        ],
    );

    let events = vec![event()];
    let outcome = run_event_study_core(&EventStudyRequest {
        events: &events,
        anchor_mode: AnchorMode::Transaction,
        sector: Some("Financial"),
        benchmark_mode: BenchmarkMode::SpyPlusSectorIfRelevant,
        sector_etf_overrides: None,
        windows: &[1],
        prices: &prices,
    })
    .unwrap();

    assert_eq!(outcome.benchmarks.symbols, vec!["SPY", "XLF"]);
    assert_eq!(outcome.benchmark_returns.len(), 2);
    assert_eq!(outcome.aggregates.len(), 2);

    let xlf = outcome
        .benchmark_returns
        .iter()
        .find(|r| r.benchmark_symbol == "XLF")
        .unwrap();
    assert_eq!(xlf.benchmark_return_percent, 2.0);
    assert_eq!(xlf.excess_return_percent, 8.0);
}

#[test]
fn required_sector_benchmark_without_prices_fails() {
    // The sector maps cleanly to XLK, so selection succeeds; the failure
    // surfaces later when XLK's price series is absent.
    let events = vec![event()];
    let prices = prices();
    let err = run_event_study_core(&EventStudyRequest {
        events: &events,
        anchor_mode: AnchorMode::Transaction,
        sector: Some("Technology"),
        benchmark_mode: BenchmarkMode::SpyPlusSectorRequired,
        sector_etf_overrides: None,
        windows: &[1],
        prices: &prices,
    })
    .unwrap_err();
    assert_eq!(err.code(), "MissingPriceSeries");
}

#[test]
fn override_table_is_honored_end_to_end() {
    let mut prices = prices();
    prices.insert(
        "QQQ".to_string(),
        vec![
            PriceBar::new("QQQ", "2025-01-03", 400.0),
            PriceBar::new("QQQ", "2025-01-06", 404.0),
        ],
    );
    let mut overrides = BTreeMap::new();
    overrides.insert("technology".to_string(), "QQQ".to_string());

    let events = vec![event()];
    let outcome = run_event_study_core(&EventStudyRequest {
        events: &events,
        anchor_mode: AnchorMode::Transaction,
        sector: Some("Technology"),
        benchmark_mode: BenchmarkMode::SpyPlusSectorRequired,
        sector_etf_overrides: Some(&overrides),
        windows: &[1],
        prices: &prices,
    })
    .unwrap();
    assert_eq!(outcome.benchmarks.symbols, vec!["SPY", "QQQ"]);
}
