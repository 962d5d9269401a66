//! Statistical aggregation of benchmark-relative returns.
//!
//! Deterministic, pure logic. Buckets return observations by
//! (anchor kind, window, benchmark) and summarizes each bucket. All
//! percentage figures are rounded with a single half-away-from-zero policy
//! at 6 decimal places.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use evs_events::AnchorKind;

// ---------------------------------------------------------------------------
// Rounding policy
// ---------------------------------------------------------------------------

/// Round half away from zero at 6 decimal places.
///
/// The one rounding policy for every percentage figure in the pipeline, so
/// repeated runs over identical inputs produce byte-identical numbers.
pub fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced during aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// A bucket or primitive was handed an empty value list.
    EmptyBucket { context: String },
    /// A value in a bucket was NaN or infinite.
    NonFiniteValue { context: String },
    /// Compared event sets did not share an identical ordered window list.
    WindowListMismatch { expected: Vec<u32>, found: Vec<u32>, label: String },
}

impl StatsError {
    /// Stable string code for this error kind.
    pub fn code(&self) -> &'static str {
        "StatsComputationError"
    }
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsError::EmptyBucket { context } => {
                write!(f, "cannot aggregate empty bucket: {context}")
            }
            StatsError::NonFiniteValue { context } => {
                write!(f, "non-finite value in bucket: {context}")
            }
            StatsError::WindowListMismatch {
                expected,
                found,
                label,
            } => write!(
                f,
                "event set '{label}' window list {found:?} does not match expected {expected:?}"
            ),
        }
    }
}

impl std::error::Error for StatsError {}

// ---------------------------------------------------------------------------
// Primitive statistics
// ---------------------------------------------------------------------------

fn require_finite(values: &[f64], context: &str) -> Result<(), StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyBucket {
            context: context.to_string(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::NonFiniteValue {
            context: context.to_string(),
        });
    }
    Ok(())
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    require_finite(values, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; even-length lists average the two middle values.
pub fn median(values: &[f64]) -> Result<f64, StatsError> {
    require_finite(values, "median")?;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Ok(sorted[n / 2])
    } else {
        Ok((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Population standard deviation (not sample).
pub fn population_stdev(values: &[f64]) -> Result<f64, StatsError> {
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// Fraction of values strictly greater than zero, in `[0, 1]`.
pub fn hit_rate_fraction(values: &[f64]) -> Result<f64, StatsError> {
    require_finite(values, "hit_rate")?;
    let hits = values.iter().filter(|v| **v > 0.0).count();
    Ok(hits as f64 / values.len() as f64)
}

// ---------------------------------------------------------------------------
// Bucketed aggregation
// ---------------------------------------------------------------------------

/// Bucket identity for aggregation and drift comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub anchor_kind: AnchorKind,
    pub window_sessions: u32,
    pub benchmark_symbol: String,
}

/// One benchmark-relative observation, as produced by the return engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnObservation {
    pub anchor_kind: AnchorKind,
    pub window_sessions: u32,
    pub benchmark_symbol: String,
    pub forward_return_percent: f64,
    pub excess_return_percent: f64,
    pub relative_return_percent: f64,
}

/// Summary statistics for one (anchor kind, window, benchmark) bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateWindow {
    pub anchor_kind: AnchorKind,
    pub window_sessions: u32,
    pub benchmark_symbol: String,
    pub sample_size: usize,
    /// Fraction of positive subject returns, reported as a percentage.
    pub hit_rate_percent: f64,
    pub mean_return_percent: f64,
    pub median_return_percent: f64,
    pub stdev_return_percent: f64,
    pub mean_excess_return_percent: f64,
    pub mean_relative_return_percent: f64,
}

impl AggregateWindow {
    pub fn key(&self) -> BucketKey {
        BucketKey {
            anchor_kind: self.anchor_kind,
            window_sessions: self.window_sessions,
            benchmark_symbol: self.benchmark_symbol.clone(),
        }
    }
}

/// Aggregate observations into per-bucket summary rows.
///
/// Buckets are keyed by (anchor kind, window, benchmark) and emitted in
/// deterministic key order. An empty input, an empty bucket or any
/// non-finite value fails.
pub fn aggregate_windows(
    observations: &[ReturnObservation],
) -> Result<Vec<AggregateWindow>, StatsError> {
    if observations.is_empty() {
        return Err(StatsError::EmptyBucket {
            context: "no observations".to_string(),
        });
    }

    let mut buckets: BTreeMap<BucketKey, Vec<&ReturnObservation>> = BTreeMap::new();
    for obs in observations {
        let key = BucketKey {
            anchor_kind: obs.anchor_kind,
            window_sessions: obs.window_sessions,
            benchmark_symbol: obs.benchmark_symbol.clone(),
        };
        buckets.entry(key).or_default().push(obs);
    }

    let mut out = Vec::with_capacity(buckets.len());
    for (key, rows) in buckets {
        let context = format!(
            "{}/{}s/{}",
            key.anchor_kind.as_str(),
            key.window_sessions,
            key.benchmark_symbol
        );
        let returns: Vec<f64> = rows.iter().map(|r| r.forward_return_percent).collect();
        let excess: Vec<f64> = rows.iter().map(|r| r.excess_return_percent).collect();
        let relative: Vec<f64> = rows.iter().map(|r| r.relative_return_percent).collect();
        require_finite(&returns, &context)?;
        require_finite(&excess, &context)?;
        require_finite(&relative, &context)?;

        out.push(AggregateWindow {
            anchor_kind: key.anchor_kind,
            window_sessions: key.window_sessions,
            benchmark_symbol: key.benchmark_symbol,
            sample_size: returns.len(),
            hit_rate_percent: round6(hit_rate_fraction(&returns)? * 100.0),
            mean_return_percent: round6(mean(&returns)?),
            median_return_percent: round6(median(&returns)?),
            stdev_return_percent: round6(population_stdev(&returns)?),
            mean_excess_return_percent: round6(mean(&excess)?),
            mean_relative_return_percent: round6(mean(&relative)?),
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Multi-set forward-return aggregation
// ---------------------------------------------------------------------------

/// One labelled set of per-window forward returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardReturnSet {
    pub label: String,
    /// (window_sessions, forward_return_percent) pairs.
    pub rows: Vec<(u32, f64)>,
}

impl ForwardReturnSet {
    /// Ordered distinct window list present in this set.
    fn window_list(&self) -> Vec<u32> {
        let mut windows: Vec<u32> = self.rows.iter().map(|(w, _)| *w).collect();
        windows.sort_unstable();
        windows.dedup();
        windows
    }
}

/// Per-(label, window) summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetWindowSummary {
    pub label: String,
    pub window_sessions: u32,
    pub sample_size: usize,
    pub hit_rate_percent: f64,
    pub mean_return_percent: f64,
    pub median_return_percent: f64,
    pub stdev_return_percent: f64,
}

/// Aggregate several labelled forward-return sets side by side.
///
/// All sets must share an identical ordered window list, so the resulting
/// summaries are directly comparable across labels.
pub fn aggregate_forward_return_sets(
    sets: &[ForwardReturnSet],
) -> Result<Vec<SetWindowSummary>, StatsError> {
    if sets.is_empty() {
        return Err(StatsError::EmptyBucket {
            context: "no forward-return sets".to_string(),
        });
    }

    let expected = sets[0].window_list();
    for set in &sets[1..] {
        let found = set.window_list();
        if found != expected {
            return Err(StatsError::WindowListMismatch {
                expected,
                found,
                label: set.label.clone(),
            });
        }
    }

    let mut out = Vec::new();
    for set in sets {
        for &window in &expected {
            let values: Vec<f64> = set
                .rows
                .iter()
                .filter(|(w, _)| *w == window)
                .map(|(_, r)| *r)
                .collect();
            let context = format!("{}/{}s", set.label, window);
            require_finite(&values, &context)?;
            out.push(SetWindowSummary {
                label: set.label.clone(),
                window_sessions: window,
                sample_size: values.len(),
                hit_rate_percent: round6(hit_rate_fraction(&values)? * 100.0),
                mean_return_percent: round6(mean(&values)?),
                median_return_percent: round6(median(&values)?),
                stdev_return_percent: round6(population_stdev(&values)?),
            });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(
        kind: AnchorKind,
        window: u32,
        benchmark: &str,
        ret: f64,
        excess: f64,
    ) -> ReturnObservation {
        ReturnObservation {
            anchor_kind: kind,
            window_sessions: window,
            benchmark_symbol: benchmark.to_string(),
            forward_return_percent: ret,
            excess_return_percent: excess,
            relative_return_percent: excess, // close enough for bucket math
        }
    }

    // --- round6 ---

    #[test]
    fn round6_half_away_from_zero() {
        assert_eq!(round6(0.0000005), 0.000001);
        assert_eq!(round6(-0.0000005), -0.000001);
        assert_eq!(round6(1.2345674), 1.234567);
        assert_eq!(round6(10.0), 10.0);
    }

    // --- primitives ---

    #[test]
    fn mean_of_simple_values() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]).unwrap(), 2.5);
    }

    #[test]
    fn stdev_is_population_not_sample() {
        // Population stdev of [2, 4] is 1.0 (sample would be sqrt(2)).
        assert_eq!(population_stdev(&[2.0, 4.0]).unwrap(), 1.0);
    }

    #[test]
    fn stdev_nonnegative_and_median_within_bounds() {
        let values = [5.0, -3.0, 2.0, 0.5, -1.0];
        let sd = population_stdev(&values).unwrap();
        let md = median(&values).unwrap();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(sd >= 0.0);
        assert!(md >= min && md <= max);
    }

    #[test]
    fn hit_rate_within_unit_interval() {
        let hr = hit_rate_fraction(&[1.0, -1.0, 2.0, 0.0]).unwrap();
        assert_eq!(hr, 0.5);
        assert!((0.0..=1.0).contains(&hr));
    }

    #[test]
    fn primitives_reject_empty_input() {
        assert!(matches!(mean(&[]), Err(StatsError::EmptyBucket { .. })));
        let err = median(&[]).unwrap_err();
        assert_eq!(err.code(), "StatsComputationError");
    }

    #[test]
    fn primitives_reject_non_finite() {
        let err = mean(&[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, StatsError::NonFiniteValue { .. }));
        assert!(population_stdev(&[f64::INFINITY]).is_err());
    }

    // --- aggregate_windows ---

    #[test]
    fn buckets_by_kind_window_and_benchmark() {
        let rows = vec![
            obs(AnchorKind::Transaction, 5, "SPY", 2.0, 1.0),
            obs(AnchorKind::Transaction, 5, "SPY", -1.0, -2.0),
            obs(AnchorKind::Transaction, 10, "SPY", 3.0, 2.0),
            obs(AnchorKind::Report, 5, "XLF", 4.0, 3.0),
        ];
        let aggregates = aggregate_windows(&rows).unwrap();
        assert_eq!(aggregates.len(), 3);

        let spy5 = aggregates
            .iter()
            .find(|a| a.window_sessions == 5 && a.benchmark_symbol == "SPY")
            .unwrap();
        assert_eq!(spy5.sample_size, 2);
        assert_eq!(spy5.hit_rate_percent, 50.0);
        assert_eq!(spy5.mean_return_percent, 0.5);
        assert_eq!(spy5.median_return_percent, 0.5);
        assert_eq!(spy5.stdev_return_percent, 1.5);
        assert_eq!(spy5.mean_excess_return_percent, -0.5);
    }

    #[test]
    fn empty_observation_list_fails() {
        let err = aggregate_windows(&[]).unwrap_err();
        assert_eq!(err.code(), "StatsComputationError");
    }

    #[test]
    fn non_finite_observation_fails() {
        let rows = vec![obs(AnchorKind::Transaction, 5, "SPY", f64::NAN, 0.0)];
        assert!(aggregate_windows(&rows).is_err());
    }

    #[test]
    fn bucket_order_is_deterministic() {
        let rows = vec![
            obs(AnchorKind::Report, 10, "SPY", 1.0, 1.0),
            obs(AnchorKind::Transaction, 5, "XLF", 1.0, 1.0),
            obs(AnchorKind::Transaction, 5, "SPY", 1.0, 1.0),
        ];
        let keys: Vec<BucketKey> = aggregate_windows(&rows)
            .unwrap()
            .iter()
            .map(AggregateWindow::key)
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    // --- aggregate_forward_return_sets ---

    #[test]
    fn sets_with_identical_windows_aggregate() {
        let sets = vec![
            ForwardReturnSet {
                label: "buys".to_string(),
                rows: vec![(1, 2.0), (5, 4.0), (1, -1.0)],
            },
            ForwardReturnSet {
                label: "sells".to_string(),
                rows: vec![(1, 0.5), (5, -0.5)],
            },
        ];
        let summaries = aggregate_forward_return_sets(&sets).unwrap();
        assert_eq!(summaries.len(), 4);
        let buys_1 = &summaries[0];
        assert_eq!(buys_1.label, "buys");
        assert_eq!(buys_1.window_sessions, 1);
        assert_eq!(buys_1.sample_size, 2);
        assert_eq!(buys_1.mean_return_percent, 0.5);
    }

    #[test]
    fn mismatched_window_lists_fail() {
        let sets = vec![
            ForwardReturnSet {
                label: "a".to_string(),
                rows: vec![(1, 2.0), (5, 4.0)],
            },
            ForwardReturnSet {
                label: "b".to_string(),
                rows: vec![(1, 0.5), (10, -0.5)],
            },
        ];
        let err = aggregate_forward_return_sets(&sets).unwrap_err();
        assert!(matches!(err, StatsError::WindowListMismatch { .. }));
        assert_eq!(err.code(), "StatsComputationError");
    }
}
