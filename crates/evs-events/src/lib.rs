//! evs-events
//!
//! Canonical normalization of raw political-disclosure rows.
//!
//! This crate owns event normalization (one raw string-keyed row in, one
//! [`PoliticalEvent`] out, with a content-derived identity) and anchor
//! resolution (dated anchor points per event, per configured mode).
//! It does **not** fetch rows, read price data, or touch the filesystem;
//! callers hand it already-materialized inputs.

pub mod anchor;
pub mod dataset;
pub mod identity;
pub mod normalizer;
pub mod row;

pub use anchor::{resolve_anchors, AnchorKind, AnchorMode, EventAnchor};
pub use dataset::{DatasetIntent, DatasetSource};
pub use normalizer::{normalize_batch, normalize_event, PoliticalEvent, Side};
pub use row::RawRow;

use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced during normalization and anchor resolution.
///
/// Every variant carries a stable string code via [`EventError::code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Neither a transaction date nor a report date was found on the row.
    MissingRequiredField { field: &'static str },
    /// A date field was found but its value did not parse.
    InvalidDate { field: &'static str, raw: String },
    /// The row contradicts the target symbol, or the symbol is malformed.
    InvalidQuiverRow { detail: String },
    /// Two normalized rows produced the same event id.
    DuplicateEventId { event_id: String },
    /// Anchor resolution was given an empty event list.
    EmptyEventSet,
    /// The anchor mode requires a date the event does not carry.
    MissingRequiredAnchorDate { event_id: String, kind: AnchorKind },
    /// An event date failed to parse during anchor resolution.
    InvalidEventDate { event_id: String, raw: String },
}

impl EventError {
    /// Stable string code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            EventError::MissingRequiredField { .. } => "MissingRequiredField",
            EventError::InvalidDate { .. } => "InvalidDate",
            EventError::InvalidQuiverRow { .. } => "InvalidQuiverRow",
            EventError::DuplicateEventId { .. } => "DuplicateEventId",
            EventError::EmptyEventSet => "EmptyEventSet",
            EventError::MissingRequiredAnchorDate { .. } => "MissingRequiredAnchorDate",
            EventError::InvalidEventDate { .. } => "InvalidEventDate",
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::MissingRequiredField { field } => {
                write!(f, "required field '{field}' not found on row")
            }
            EventError::InvalidDate { field, raw } => {
                write!(f, "date field '{field}' could not be parsed: '{raw}'")
            }
            EventError::InvalidQuiverRow { detail } => {
                write!(f, "invalid disclosure row: {detail}")
            }
            EventError::DuplicateEventId { event_id } => {
                write!(f, "duplicate event id produced: '{event_id}'")
            }
            EventError::EmptyEventSet => write!(f, "event set is empty"),
            EventError::MissingRequiredAnchorDate { event_id, kind } => {
                write!(
                    f,
                    "event '{event_id}' lacks the {kind} date required by the anchor mode"
                )
            }
            EventError::InvalidEventDate { event_id, raw } => {
                write!(f, "event '{event_id}' carries an unparseable date: '{raw}'")
            }
        }
    }
}

impl std::error::Error for EventError {}
