//! Run-over-run comparison scenarios: a first run with no history, and a
//! follow-up run whose mean excess return flips sign.

use chrono::{TimeZone, Utc};
use evs_compare::{compare_runs, BacktestRunSnapshot, ConclusionView};
use evs_events::AnchorKind;
use evs_stats::AggregateWindow;

fn aggregate(mean_excess: f64) -> AggregateWindow {
    AggregateWindow {
        anchor_kind: AnchorKind::Transaction,
        window_sessions: 5,
        benchmark_symbol: "SPY".to_string(),
        sample_size: 12,
        hit_rate_percent: 58.333333,
        mean_return_percent: 0.8,
        median_return_percent: 0.6,
        stdev_return_percent: 2.1,
        mean_excess_return_percent: mean_excess,
        mean_relative_return_percent: mean_excess,
    }
}

#[test]
fn first_run_has_no_baseline_and_all_new_ids() {
    let current = BacktestRunSnapshot::new(
        "run-001",
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        vec![aggregate(0.3)],
        ["congress:AAA:1".to_string(), "congress:BBB:2".to_string()],
    );

    let cmp = compare_runs(&current, None);
    assert!(cmp.first_run);
    assert!(cmp.baseline.is_none());
    assert_eq!(
        cmp.event_sample.new,
        vec!["congress:AAA:1", "congress:BBB:2"]
    );
    assert!(cmp.event_sample.removed.is_empty());
    assert!(cmp.event_sample.persisted.is_empty());
    assert!(cmp.conclusion_changes.is_empty());
    assert!(cmp.aggregate_drift.is_empty());
}

#[test]
fn mean_excess_sign_flip_is_one_conclusion_change() {
    let baseline = BacktestRunSnapshot::new(
        "run-001",
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        vec![aggregate(-0.5)],
        ["congress:AAA:1".to_string()],
    );
    let current = BacktestRunSnapshot::new(
        "run-002",
        Utc.timestamp_opt(1_700_086_400, 0).unwrap(),
        vec![aggregate(0.3)],
        ["congress:AAA:1".to_string(), "congress:CCC:3".to_string()],
    );

    let cmp = compare_runs(&current, Some(&baseline));
    assert!(!cmp.first_run);
    assert_eq!(cmp.baseline.as_deref(), Some("run-001"));

    assert_eq!(cmp.conclusion_changes.len(), 1);
    let change = &cmp.conclusion_changes[0];
    assert_eq!(change.key.window_sessions, 5);
    assert_eq!(change.key.benchmark_symbol, "SPY");
    assert_eq!(change.baseline_view, ConclusionView::Underperform);
    assert_eq!(change.current_view, ConclusionView::Outperform);
    assert_eq!(change.baseline_mean_excess, -0.5);
    assert_eq!(change.current_mean_excess, 0.3);

    assert_eq!(cmp.aggregate_drift.len(), 1);
    assert_eq!(cmp.aggregate_drift[0].mean_excess_delta, 0.8);

    assert_eq!(cmp.event_sample.new, vec!["congress:CCC:3"]);
    assert_eq!(cmp.event_sample.persisted, vec!["congress:AAA:1"]);
    assert!(cmp.event_sample.removed.is_empty());
}
