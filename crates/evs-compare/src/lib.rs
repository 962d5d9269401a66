//! evs-compare
//!
//! Run snapshots and run-over-run comparison. A snapshot captures the
//! durable output of one event-study run (aggregates plus the event-id
//! sample); comparing the current snapshot against the most recent prior
//! one surfaces aggregate drift, sample churn and conclusion flips.
//!
//! Pure data and arithmetic; persistence and discovery live in
//! `evs-artifacts`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use evs_stats::{round6, AggregateWindow, BucketKey};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The durable record of one completed run. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRunSnapshot {
    /// Opaque run identifier, typically the run's output directory name.
    pub output_root: String,
    pub generated_at: DateTime<Utc>,
    pub aggregates: Vec<AggregateWindow>,
    /// Deduplicated, sorted.
    pub event_ids: Vec<String>,
}

impl BacktestRunSnapshot {
    /// Build a snapshot, normalizing the event-id sample to a sorted
    /// deduplicated set and the aggregates to key order so two snapshots
    /// of the same run content compare equal regardless of input order.
    pub fn new(
        output_root: impl Into<String>,
        generated_at: DateTime<Utc>,
        mut aggregates: Vec<AggregateWindow>,
        event_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        aggregates.sort_by_key(|a| a.key());
        let ids: BTreeSet<String> = event_ids.into_iter().collect();
        Self {
            output_root: output_root.into(),
            generated_at,
            aggregates,
            event_ids: ids.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conclusion view
// ---------------------------------------------------------------------------

/// Three-way reading of a bucket's mean excess return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConclusionView {
    Outperform,
    Underperform,
    Flat,
}

impl ConclusionView {
    pub fn from_mean_excess(mean_excess_return_percent: f64) -> Self {
        if mean_excess_return_percent > 0.0 {
            ConclusionView::Outperform
        } else if mean_excess_return_percent < 0.0 {
            ConclusionView::Underperform
        } else {
            ConclusionView::Flat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConclusionView::Outperform => "outperform",
            ConclusionView::Underperform => "underperform",
            ConclusionView::Flat => "flat",
        }
    }
}

impl fmt::Display for ConclusionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Comparison rows
// ---------------------------------------------------------------------------

/// Per-bucket deltas between baseline and current aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketDrift {
    pub key: BucketKey,
    /// Current minus baseline sample size.
    pub sample_delta: i64,
    pub hit_rate_delta: f64,
    pub median_return_delta: f64,
    pub mean_excess_delta: f64,
}

/// A bucket whose mean-excess view changed between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConclusionChange {
    pub key: BucketKey,
    pub baseline_view: ConclusionView,
    pub current_view: ConclusionView,
    pub baseline_mean_excess: f64,
    pub current_mean_excess: f64,
}

/// Event-id churn between runs; each list sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSampleDiff {
    pub new: Vec<String>,
    pub removed: Vec<String>,
    pub persisted: Vec<String>,
}

/// The full comparison of a current run against its baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRunComparison {
    pub first_run: bool,
    /// The baseline's `output_root`, when one existed.
    pub baseline: Option<String>,
    pub aggregate_drift: Vec<BucketDrift>,
    pub event_sample: EventSampleDiff,
    pub conclusion_changes: Vec<ConclusionChange>,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

fn by_key(aggregates: &[AggregateWindow]) -> BTreeMap<BucketKey, &AggregateWindow> {
    aggregates.iter().map(|a| (a.key(), a)).collect()
}

/// Compare the current snapshot against an optional baseline.
///
/// With no baseline: `first_run = true`, every current event id is new,
/// no drift and no conclusion changes. Otherwise deltas are computed for
/// every bucket key present in both aggregate lists; buckets present in
/// only one snapshot are skipped without error. Any change of view
/// (including to or from flat) counts as a conclusion change.
pub fn compare_runs(
    current: &BacktestRunSnapshot,
    baseline: Option<&BacktestRunSnapshot>,
) -> BacktestRunComparison {
    let baseline = match baseline {
        None => {
            return BacktestRunComparison {
                first_run: true,
                baseline: None,
                aggregate_drift: Vec::new(),
                event_sample: EventSampleDiff {
                    new: current.event_ids.clone(),
                    removed: Vec::new(),
                    persisted: Vec::new(),
                },
                conclusion_changes: Vec::new(),
            }
        }
        Some(b) => b,
    };

    let baseline_buckets = by_key(&baseline.aggregates);
    let current_buckets = by_key(&current.aggregates);

    let mut aggregate_drift = Vec::new();
    let mut conclusion_changes = Vec::new();
    for (key, cur) in &current_buckets {
        let Some(base) = baseline_buckets.get(key) else {
            continue;
        };
        aggregate_drift.push(BucketDrift {
            key: key.clone(),
            sample_delta: cur.sample_size as i64 - base.sample_size as i64,
            hit_rate_delta: round6(cur.hit_rate_percent - base.hit_rate_percent),
            median_return_delta: round6(
                cur.median_return_percent - base.median_return_percent,
            ),
            mean_excess_delta: round6(
                cur.mean_excess_return_percent - base.mean_excess_return_percent,
            ),
        });

        let baseline_view = ConclusionView::from_mean_excess(base.mean_excess_return_percent);
        let current_view = ConclusionView::from_mean_excess(cur.mean_excess_return_percent);
        if baseline_view != current_view {
            conclusion_changes.push(ConclusionChange {
                key: key.clone(),
                baseline_view,
                current_view,
                baseline_mean_excess: base.mean_excess_return_percent,
                current_mean_excess: cur.mean_excess_return_percent,
            });
        }
    }

    let baseline_ids: BTreeSet<&String> = baseline.event_ids.iter().collect();
    let current_ids: BTreeSet<&String> = current.event_ids.iter().collect();
    let event_sample = EventSampleDiff {
        new: current_ids
            .difference(&baseline_ids)
            .map(|s| (*s).clone())
            .collect(),
        removed: baseline_ids
            .difference(&current_ids)
            .map(|s| (*s).clone())
            .collect(),
        persisted: current_ids
            .intersection(&baseline_ids)
            .map(|s| (*s).clone())
            .collect(),
    };

    BacktestRunComparison {
        first_run: false,
        baseline: Some(baseline.output_root.clone()),
        aggregate_drift,
        event_sample,
        conclusion_changes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
