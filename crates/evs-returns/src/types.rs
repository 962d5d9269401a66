//! Price and return row types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use evs_events::AnchorKind;

/// A single daily adjusted-close observation, the source of truth for
/// calendar construction and return computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Split/dividend-adjusted close; must be finite and > 0.
    pub adjusted_close: f64,
}

impl PriceBar {
    pub fn new(symbol: impl Into<String>, date: impl Into<String>, adjusted_close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date: date.into(),
            adjusted_close,
        }
    }
}

/// Symbol → ordered daily bars, as materialized by the retrieval layer.
/// One entry per symbol the study needs: subject tickers plus benchmarks.
pub type PriceTable = BTreeMap<String, Vec<PriceBar>>;

/// Forward return of one event over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWindowReturn {
    pub event_id: String,
    pub ticker: String,
    pub anchor_kind: AnchorKind,
    /// The anchor date as resolved from the event (`YYYY-MM-DD`).
    pub anchor_date: String,
    /// Entry session after rolling the anchor forward to a trading day.
    pub aligned_anchor_date: String,
    pub window_sessions: u32,
    pub start_close: f64,
    pub end_close: f64,
    /// `round6((end/start − 1) × 100)`.
    pub forward_return_percent: f64,
}

/// One event-window return measured against one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRelativeReturn {
    pub event_id: String,
    pub ticker: String,
    pub anchor_kind: AnchorKind,
    pub anchor_date: String,
    pub aligned_anchor_date: String,
    pub window_sessions: u32,
    pub start_close: f64,
    pub end_close: f64,
    pub forward_return_percent: f64,
    pub benchmark_symbol: String,
    pub benchmark_return_percent: f64,
    /// Arithmetic difference of the rounded subject and benchmark returns.
    pub excess_return_percent: f64,
    /// Compounded ratio: `round6(((1+a/100)/(1+b/100) − 1) × 100)`.
    pub relative_return_percent: f64,
}
