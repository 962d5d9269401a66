//! evs-artifacts
//!
//! Persistence and discovery of run snapshots. Each completed run is
//! materialized as a directory of JSON documents under a scoped history
//! root, closed by a `run.json` marker written last so half-written runs
//! are never discovered as history.
//!
//! Layout per run directory (`<history_root>/<run_id>/`):
//! - `events.json`            normalized events
//! - `window_returns.json`    per-(anchor, window) forward returns
//! - `benchmark_returns.json` benchmark-relative rows
//! - `aggregates.json`        per-bucket summary statistics
//! - `comparison.json`        run-over-run comparison (when one was made)
//! - `summary.txt`            free-text recap
//! - `run.json`               marker; its presence makes the run durable

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use evs_compare::{BacktestRunComparison, BacktestRunSnapshot};
use evs_events::PoliticalEvent;
use evs_returns::EventStudyOutcome;
use evs_stats::AggregateWindow;

const MARKER_FILE: &str = "run.json";
const EVENTS_FILE: &str = "events.json";
const WINDOW_RETURNS_FILE: &str = "window_returns.json";
const BENCHMARK_RETURNS_FILE: &str = "benchmark_returns.json";
const AGGREGATES_FILE: &str = "aggregates.json";
const COMPARISON_FILE: &str = "comparison.json";
const SUMMARY_FILE: &str = "summary.txt";

const SCHEMA_VERSION: i32 = 1;

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

/// The per-run marker. Written after every companion document, so a
/// directory carrying one is expected to be complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMarker {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub event_count: usize,
    pub aggregate_count: usize,
}

// ---------------------------------------------------------------------------
// History errors
// ---------------------------------------------------------------------------

/// Errors raised while reading stored run history.
///
/// A marked run missing (or failing to decode) a required companion
/// document is corrupt history, not something to skip silently.
#[derive(Debug)]
pub enum HistoryError {
    Io { path: PathBuf, detail: String },
    CorruptRun { run_dir: PathBuf, detail: String },
}

impl HistoryError {
    /// Stable string code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::Io { .. } => "HistoryIoError",
            HistoryError::CorruptRun { .. } => "InvalidPriceSeries",
        }
    }
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Io { path, detail } => {
                write!(f, "history read failed at {}: {detail}", path.display())
            }
            HistoryError::CorruptRun { run_dir, detail } => {
                write!(f, "corrupt run snapshot at {}: {detail}", run_dir.display())
            }
        }
    }
}

impl std::error::Error for HistoryError {}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

pub struct PersistRunArgs<'a> {
    pub history_root: &'a Path,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub events: &'a [PoliticalEvent],
    pub outcome: &'a EventStudyOutcome,
    pub comparison: Option<&'a BacktestRunComparison>,
}

pub struct PersistedRun {
    pub run_dir: PathBuf,
    /// The snapshot equivalent to what discovery will later reconstruct.
    pub snapshot: BacktestRunSnapshot,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize failed: {}", path.display()))?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write failed: {}", path.display()))?;
    Ok(())
}

/// Persist one run as a snapshot directory. The marker is written last;
/// until it lands the directory is invisible to discovery.
pub fn write_run_snapshot(args: PersistRunArgs<'_>) -> Result<PersistedRun> {
    let run_dir = args.history_root.join(args.run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create run dir failed: {}", run_dir.display()))?;

    write_json(&run_dir.join(EVENTS_FILE), &args.events)?;
    write_json(&run_dir.join(WINDOW_RETURNS_FILE), &args.outcome.window_returns)?;
    write_json(
        &run_dir.join(BENCHMARK_RETURNS_FILE),
        &args.outcome.benchmark_returns,
    )?;
    write_json(&run_dir.join(AGGREGATES_FILE), &args.outcome.aggregates)?;
    if let Some(comparison) = args.comparison {
        write_json(&run_dir.join(COMPARISON_FILE), comparison)?;
    }

    let summary = render_summary(args.events, args.outcome, args.comparison);
    let summary_path = run_dir.join(SUMMARY_FILE);
    fs::write(&summary_path, summary)
        .with_context(|| format!("write failed: {}", summary_path.display()))?;

    let marker = RunMarker {
        schema_version: SCHEMA_VERSION,
        run_id: args.run_id,
        generated_at: args.generated_at,
        event_count: args.events.len(),
        aggregate_count: args.outcome.aggregates.len(),
    };
    write_json(&run_dir.join(MARKER_FILE), &marker)?;

    info!(
        run_id = %args.run_id,
        events = args.events.len(),
        aggregates = args.outcome.aggregates.len(),
        "run snapshot written"
    );

    let snapshot = BacktestRunSnapshot::new(
        args.run_id.to_string(),
        args.generated_at,
        args.outcome.aggregates.clone(),
        args.events.iter().map(|e| e.event_id.clone()),
    );
    Ok(PersistedRun { run_dir, snapshot })
}

fn render_summary(
    events: &[PoliticalEvent],
    outcome: &EventStudyOutcome,
    comparison: Option<&BacktestRunComparison>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "events: {}\nbenchmarks: {}\n",
        events.len(),
        outcome.benchmarks.symbols.join(", ")
    ));
    for line in &outcome.benchmarks.rationale {
        out.push_str(&format!("  - {line}\n"));
    }
    out.push_str("aggregates:\n");
    for agg in &outcome.aggregates {
        out.push_str(&format!(
            "  {}/{}s vs {}: n={} hit={:.2}% mean={:.4}% excess={:.4}%\n",
            agg.anchor_kind,
            agg.window_sessions,
            agg.benchmark_symbol,
            agg.sample_size,
            agg.hit_rate_percent,
            agg.mean_return_percent,
            agg.mean_excess_return_percent,
        ));
    }
    if let Some(cmp) = comparison {
        if cmp.first_run {
            out.push_str("comparison: first run, no baseline\n");
        } else {
            out.push_str(&format!(
                "comparison vs {}: {} drifted buckets, {} conclusion changes, {} new / {} removed events\n",
                cmp.baseline.as_deref().unwrap_or("?"),
                cmp.aggregate_drift.len(),
                cmp.conclusion_changes.len(),
                cmp.event_sample.new.len(),
                cmp.event_sample.removed.len(),
            ));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

fn read_json<T: for<'de> Deserialize<'de>>(
    run_dir: &Path,
    file: &str,
) -> Result<T, HistoryError> {
    let path = run_dir.join(file);
    let bytes = fs::read(&path).map_err(|e| HistoryError::CorruptRun {
        run_dir: run_dir.to_path_buf(),
        detail: format!("missing or unreadable {file}: {e}"),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| HistoryError::CorruptRun {
        run_dir: run_dir.to_path_buf(),
        detail: format!("undecodable {file}: {e}"),
    })
}

/// Scan a history root for prior run snapshots, ascending by
/// `generated_at`.
///
/// Directories without a `run.json` marker are ignored; a marked run
/// missing its aggregates or events document fails as corrupt history.
/// A nonexistent root is an empty history.
pub fn discover_run_snapshots(
    history_root: &Path,
) -> Result<Vec<BacktestRunSnapshot>, HistoryError> {
    if !history_root.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(history_root).map_err(|e| HistoryError::Io {
        path: history_root.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut snapshots = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HistoryError::Io {
            path: history_root.to_path_buf(),
            detail: e.to_string(),
        })?;
        let run_dir = entry.path();
        if !run_dir.is_dir() || !run_dir.join(MARKER_FILE).exists() {
            debug!(path = %run_dir.display(), "skipping unmarked history entry");
            continue;
        }

        let marker: RunMarker = read_json(&run_dir, MARKER_FILE)?;
        let aggregates: Vec<AggregateWindow> = read_json(&run_dir, AGGREGATES_FILE)?;
        let events: Vec<PoliticalEvent> = read_json(&run_dir, EVENTS_FILE)?;

        let output_root = entry.file_name().to_string_lossy().into_owned();
        snapshots.push(BacktestRunSnapshot::new(
            output_root,
            marker.generated_at,
            aggregates,
            events.into_iter().map(|e| e.event_id),
        ));
    }

    snapshots.sort_by(|a, b| {
        a.generated_at
            .cmp(&b.generated_at)
            .then_with(|| a.output_root.cmp(&b.output_root))
    });
    debug!(count = snapshots.len(), "discovered run snapshots");
    Ok(snapshots)
}

/// The most recent prior snapshot, if any.
pub fn latest_snapshot(
    history_root: &Path,
) -> Result<Option<BacktestRunSnapshot>, HistoryError> {
    Ok(discover_run_snapshots(history_root)?.pop())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
