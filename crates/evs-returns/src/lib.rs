//! evs-returns
//!
//! Benchmark selection, forward-return computation and the event-study
//! composition. This crate owns the numerical heart of the pipeline: it
//! aligns anchors to real trading sessions, reads entry/exit adjusted
//! closes, and derives benchmark-relative return rows for aggregation.
//!
//! All logic is synchronous and IO-free; price series arrive already
//! materialized from the excluded retrieval layer.

pub mod benchmark;
pub mod engine;
pub mod types;

pub use benchmark::{select_benchmarks, BenchmarkMode, BenchmarkSelection};
pub use engine::{
    compute_benchmark_relative_returns, compute_event_window_returns, run_event_study_core,
    EventStudyOutcome, EventStudyRequest,
};
pub use types::{BenchmarkRelativeReturn, EventWindowReturn, PriceBar, PriceTable};

use std::fmt;

use evs_events::EventError;
use evs_stats::StatsError;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by benchmark selection and return computation.
///
/// Lower-level calendar and alignment failures are re-wrapped here with a
/// code meaningful at the event-study level, preserving the inner message.
#[derive(Debug, Clone, PartialEq)]
pub enum EventStudyError {
    /// An anchor date could not be aligned to the subject's calendar.
    AnchorOutOfRange {
        event_id: String,
        anchor_date: String,
        detail: String,
    },
    /// A window's exit session fell outside the calendar, or the requested
    /// window list itself was invalid.
    WindowOutOfRange { window_sessions: u32, detail: String },
    /// No price series (or no price on a needed session) for a symbol.
    MissingPriceSeries { symbol: String, date: Option<String> },
    /// A price series carried a non-finite or non-positive value, or could
    /// not produce a valid calendar.
    InvalidPriceSeries { symbol: String, detail: String },
    /// Sector benchmark required but the sector is unknown or unmapped.
    MissingBenchmarkMapping { sector: Option<String> },
    /// Benchmark-relative computation produced no rows.
    MissingBenchmarkSeries,
    /// Forwarded normalization / anchor-resolution failure.
    Event(EventError),
    /// Forwarded aggregation failure.
    Stats(StatsError),
}

impl EventStudyError {
    /// Stable string code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            EventStudyError::AnchorOutOfRange { .. } => "AnchorOutOfRange",
            EventStudyError::WindowOutOfRange { .. } => "WindowOutOfRange",
            EventStudyError::MissingPriceSeries { .. } => "MissingPriceSeries",
            EventStudyError::InvalidPriceSeries { .. } => "InvalidPriceSeries",
            EventStudyError::MissingBenchmarkMapping { .. } => "MissingBenchmarkMapping",
            EventStudyError::MissingBenchmarkSeries => "MissingBenchmarkSeries",
            EventStudyError::Event(e) => e.code(),
            EventStudyError::Stats(e) => e.code(),
        }
    }
}

impl fmt::Display for EventStudyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStudyError::AnchorOutOfRange {
                event_id,
                anchor_date,
                detail,
            } => write!(
                f,
                "anchor '{anchor_date}' for event '{event_id}' is out of range: {detail}"
            ),
            EventStudyError::WindowOutOfRange {
                window_sessions,
                detail,
            } => write!(f, "window of {window_sessions} sessions is out of range: {detail}"),
            EventStudyError::MissingPriceSeries { symbol, date } => match date {
                Some(d) => write!(f, "no price for '{symbol}' on {d}"),
                None => write!(f, "no price series supplied for '{symbol}'"),
            },
            EventStudyError::InvalidPriceSeries { symbol, detail } => {
                write!(f, "invalid price series for '{symbol}': {detail}")
            }
            EventStudyError::MissingBenchmarkMapping { sector } => match sector {
                Some(s) => write!(f, "no benchmark mapping for sector '{s}'"),
                None => write!(f, "sector benchmark required but sector is unknown"),
            },
            EventStudyError::MissingBenchmarkSeries => {
                write!(f, "benchmark-relative computation produced no rows")
            }
            EventStudyError::Event(e) => write!(f, "{e}"),
            EventStudyError::Stats(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EventStudyError {}

impl From<EventError> for EventStudyError {
    fn from(e: EventError) -> Self {
        EventStudyError::Event(e)
    }
}

impl From<StatsError> for EventStudyError {
    fn from(e: StatsError) -> Self {
        EventStudyError::Stats(e)
    }
}
