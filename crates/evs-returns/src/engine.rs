//! Forward-return computation and event-study composition.
//!
//! Pipeline per anchor: ALIGN → OFFSET → ENTRY/EXIT CLOSES → RETURN.
//! Benchmark-relative rows re-align the subject's entry date against each
//! benchmark's own calendar, since a benchmark may trade on a different
//! session set.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use evs_calendar::TradingCalendar;
use evs_events::{resolve_anchors, AnchorMode, EventAnchor, PoliticalEvent};
use evs_stats::{aggregate_windows, round6, AggregateWindow, ReturnObservation};

use crate::benchmark::{select_benchmarks, BenchmarkMode, BenchmarkSelection};
use crate::types::{BenchmarkRelativeReturn, EventWindowReturn, PriceTable};
use crate::EventStudyError;

// ---------------------------------------------------------------------------
// Per-symbol series
// ---------------------------------------------------------------------------

/// One symbol's calendar plus date → adjusted-close lookup, built once per
/// run from that symbol's bars.
struct SymbolSeries {
    calendar: TradingCalendar,
    closes: BTreeMap<String, f64>,
}

type SeriesCache = BTreeMap<String, SymbolSeries>;

fn build_series(symbol: &str, prices: &PriceTable) -> Result<SymbolSeries, EventStudyError> {
    let bars = prices
        .get(symbol)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| EventStudyError::MissingPriceSeries {
            symbol: symbol.to_string(),
            date: None,
        })?;

    let mut dates = Vec::with_capacity(bars.len());
    let mut closes = BTreeMap::new();
    for bar in bars {
        if !bar.adjusted_close.is_finite() || bar.adjusted_close <= 0.0 {
            return Err(EventStudyError::InvalidPriceSeries {
                symbol: symbol.to_string(),
                detail: format!(
                    "adjusted close {} on {} is not a positive finite number",
                    bar.adjusted_close, bar.date
                ),
            });
        }
        dates.push(bar.date.clone());
        closes.insert(bar.date.clone(), bar.adjusted_close);
    }

    // Duplicate or out-of-order bar dates are a corrupt series, surfaced
    // with the series code rather than a calendar code.
    let calendar = TradingCalendar::from_dates(&dates).map_err(|e| {
        EventStudyError::InvalidPriceSeries {
            symbol: symbol.to_string(),
            detail: e.to_string(),
        }
    })?;

    Ok(SymbolSeries { calendar, closes })
}

fn series<'a>(
    cache: &'a mut SeriesCache,
    symbol: &str,
    prices: &PriceTable,
) -> Result<&'a SymbolSeries, EventStudyError> {
    match cache.entry(symbol.to_string()) {
        Entry::Occupied(e) => Ok(e.into_mut()),
        Entry::Vacant(v) => Ok(v.insert(build_series(symbol, prices)?)),
    }
}

fn close_on(series: &SymbolSeries, symbol: &str, date: &str) -> Result<f64, EventStudyError> {
    series
        .closes
        .get(date)
        .copied()
        .ok_or_else(|| EventStudyError::MissingPriceSeries {
            symbol: symbol.to_string(),
            date: Some(date.to_string()),
        })
}

/// `round6((exit/entry − 1) × 100)`. Inputs are already validated positive.
fn forward_return_percent(entry: f64, exit: f64) -> f64 {
    round6(((exit / entry) - 1.0) * 100.0)
}

// ---------------------------------------------------------------------------
// Window normalization
// ---------------------------------------------------------------------------

/// Deduplicate and sort the requested windows; every window must be >= 1.
fn normalize_windows(windows: &[u32]) -> Result<Vec<u32>, EventStudyError> {
    if windows.is_empty() {
        return Err(EventStudyError::WindowOutOfRange {
            window_sessions: 0,
            detail: "no forward windows requested".to_string(),
        });
    }
    if windows.contains(&0) {
        return Err(EventStudyError::WindowOutOfRange {
            window_sessions: 0,
            detail: "window session counts must be >= 1".to_string(),
        });
    }
    let mut out = windows.to_vec();
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Forward returns
// ---------------------------------------------------------------------------

/// Compute per-(anchor, window) forward returns for the subject symbols.
///
/// Alignment failures surface as `AnchorOutOfRange`; offset failures as
/// `WindowOutOfRange`; both preserve the inner calendar message.
pub fn compute_event_window_returns(
    anchors: &[EventAnchor],
    prices: &PriceTable,
    windows: &[u32],
) -> Result<Vec<EventWindowReturn>, EventStudyError> {
    let windows = normalize_windows(windows)?;
    let mut cache = SeriesCache::new();
    let mut out = Vec::with_capacity(anchors.len() * windows.len());

    for anchor in anchors {
        let s = series(&mut cache, &anchor.ticker, prices)?;
        let aligned = s
            .calendar
            .align_to_next_session(&anchor.anchor_date)
            .map_err(|e| EventStudyError::AnchorOutOfRange {
                event_id: anchor.event_id.clone(),
                anchor_date: anchor.anchor_date.clone(),
                detail: e.to_string(),
            })?;
        let start_close = close_on(s, &anchor.ticker, &aligned.date)?;

        for &window in &windows {
            let exit_date = s
                .calendar
                .session_by_offset(aligned.index, window as usize)
                .map_err(|e| EventStudyError::WindowOutOfRange {
                    window_sessions: window,
                    detail: format!("event '{}': {e}", anchor.event_id),
                })?
                .to_string();
            let end_close = close_on(s, &anchor.ticker, &exit_date)?;

            out.push(EventWindowReturn {
                event_id: anchor.event_id.clone(),
                ticker: anchor.ticker.clone(),
                anchor_kind: anchor.anchor_kind,
                anchor_date: anchor.anchor_date.clone(),
                aligned_anchor_date: aligned.date.clone(),
                window_sessions: window,
                start_close,
                end_close,
                forward_return_percent: forward_return_percent(start_close, end_close),
            });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Benchmark-relative returns
// ---------------------------------------------------------------------------

/// Measure each window return against each benchmark symbol.
///
/// The benchmark's own forward return is computed the same way as the
/// subject's, from the subject's aligned entry date re-aligned onto the
/// benchmark calendar. Excess and relative returns are derived from the
/// already-rounded per-leg returns, preserving the established order of
/// operations.
pub fn compute_benchmark_relative_returns(
    rows: &[EventWindowReturn],
    prices: &PriceTable,
    benchmark_symbols: &[String],
) -> Result<Vec<BenchmarkRelativeReturn>, EventStudyError> {
    let mut cache = SeriesCache::new();
    let mut out = Vec::with_capacity(rows.len() * benchmark_symbols.len());

    for row in rows {
        for benchmark in benchmark_symbols {
            let s = series(&mut cache, benchmark, prices)?;
            let aligned = s
                .calendar
                .align_to_next_session(&row.aligned_anchor_date)
                .map_err(|e| EventStudyError::AnchorOutOfRange {
                    event_id: row.event_id.clone(),
                    anchor_date: row.aligned_anchor_date.clone(),
                    detail: format!("benchmark '{benchmark}': {e}"),
                })?;
            let exit_date = s
                .calendar
                .session_by_offset(aligned.index, row.window_sessions as usize)
                .map_err(|e| EventStudyError::WindowOutOfRange {
                    window_sessions: row.window_sessions,
                    detail: format!("benchmark '{benchmark}': {e}"),
                })?
                .to_string();

            let bench_entry = close_on(s, benchmark, &aligned.date)?;
            let bench_exit = close_on(s, benchmark, &exit_date)?;
            let benchmark_return = forward_return_percent(bench_entry, bench_exit);

            let asset_factor = 1.0 + row.forward_return_percent / 100.0;
            let bench_factor = 1.0 + benchmark_return / 100.0;
            if asset_factor <= 0.0 || bench_factor <= 0.0 {
                return Err(EventStudyError::InvalidPriceSeries {
                    symbol: benchmark.clone(),
                    detail: format!(
                        "non-positive compounded factor (asset {asset_factor}, benchmark {bench_factor})"
                    ),
                });
            }

            out.push(BenchmarkRelativeReturn {
                event_id: row.event_id.clone(),
                ticker: row.ticker.clone(),
                anchor_kind: row.anchor_kind,
                anchor_date: row.anchor_date.clone(),
                aligned_anchor_date: row.aligned_anchor_date.clone(),
                window_sessions: row.window_sessions,
                start_close: row.start_close,
                end_close: row.end_close,
                forward_return_percent: row.forward_return_percent,
                benchmark_symbol: benchmark.clone(),
                benchmark_return_percent: benchmark_return,
                excess_return_percent: round6(
                    row.forward_return_percent - benchmark_return,
                ),
                relative_return_percent: round6((asset_factor / bench_factor - 1.0) * 100.0),
            });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Inputs for one event-study run, already materialized by the caller.
#[derive(Debug, Clone)]
pub struct EventStudyRequest<'a> {
    pub events: &'a [PoliticalEvent],
    pub anchor_mode: AnchorMode,
    pub sector: Option<&'a str>,
    pub benchmark_mode: BenchmarkMode,
    pub sector_etf_overrides: Option<&'a BTreeMap<String, String>>,
    pub windows: &'a [u32],
    pub prices: &'a PriceTable,
}

/// Everything one run produces, ready for persistence and comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct EventStudyOutcome {
    pub benchmarks: BenchmarkSelection,
    pub window_returns: Vec<EventWindowReturn>,
    pub benchmark_returns: Vec<BenchmarkRelativeReturn>,
    pub aggregates: Vec<AggregateWindow>,
}

/// Run the full event-study core:
/// resolve benchmarks → resolve anchors → window returns →
/// benchmark-relative returns → aggregate.
///
/// All-or-nothing: any violated precondition fails the run; partial results
/// are never returned.
pub fn run_event_study_core(
    req: &EventStudyRequest<'_>,
) -> Result<EventStudyOutcome, EventStudyError> {
    let benchmarks = select_benchmarks(req.sector, req.benchmark_mode, req.sector_etf_overrides)?;
    let anchors = resolve_anchors(req.events, req.anchor_mode)?;
    let window_returns = compute_event_window_returns(&anchors, req.prices, req.windows)?;
    let benchmark_returns =
        compute_benchmark_relative_returns(&window_returns, req.prices, &benchmarks.symbols)?;
    if benchmark_returns.is_empty() {
        return Err(EventStudyError::MissingBenchmarkSeries);
    }

    let observations: Vec<ReturnObservation> = benchmark_returns
        .iter()
        .map(|r| ReturnObservation {
            anchor_kind: r.anchor_kind,
            window_sessions: r.window_sessions,
            benchmark_symbol: r.benchmark_symbol.clone(),
            forward_return_percent: r.forward_return_percent,
            excess_return_percent: r.excess_return_percent,
            relative_return_percent: r.relative_return_percent,
        })
        .collect();
    let aggregates = aggregate_windows(&observations)?;

    Ok(EventStudyOutcome {
        benchmarks,
        window_returns,
        benchmark_returns,
        aggregates,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
