//! Trading session calendar for one symbol.
//!
//! Deterministic, pure logic. No IO, no wall-clock, no randomness.
//!
//! # Design
//!
//! A [`TradingCalendar`] is built once per symbol per run from that symbol's
//! price-series dates. It holds an ordered, strictly increasing, duplicate-free
//! sequence of session dates plus their epoch-day integers, so alignment is a
//! binary search and offset lookup is plain indexing.
//!
//! The instrument is strictly forward-looking:
//! - [`TradingCalendar::align_to_next_session`] rolls non-trading days forward
//!   to the next session, never backward.
//! - [`TradingCalendar::session_by_offset`] takes a non-negative offset only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced during calendar construction and session lookups.
///
/// Construction failures carry the stable code `TradingCalendarError`;
/// alignment and offset failures carry `SessionAlignmentError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// No session dates were supplied.
    EmptyCalendar,
    /// A session date was not strict `YYYY-MM-DD`.
    InvalidSessionDate { raw: String },
    /// The supplied sequence was not strictly increasing once parsed.
    /// Callers must supply already-deduplicated, sorted price dates.
    NonIncreasingSessions { prev: String, next: String },
    /// The date given to alignment could not be parsed.
    UnparseableAlignmentDate { raw: String },
    /// The input date predates the calendar's first session.
    BeforeFirstSession { input: String, first: String },
    /// No session exists on or after the input date.
    AfterLastSession { input: String, last: String },
    /// A start index was outside the calendar.
    StartIndexOutOfRange { index: usize, len: usize },
    /// A forward offset pushed past the calendar's end.
    OffsetPastEnd { index: usize, offset: usize, len: usize },
}

impl CalendarError {
    /// Stable string code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CalendarError::EmptyCalendar
            | CalendarError::InvalidSessionDate { .. }
            | CalendarError::NonIncreasingSessions { .. } => "TradingCalendarError",
            CalendarError::UnparseableAlignmentDate { .. }
            | CalendarError::BeforeFirstSession { .. }
            | CalendarError::AfterLastSession { .. }
            | CalendarError::StartIndexOutOfRange { .. }
            | CalendarError::OffsetPastEnd { .. } => "SessionAlignmentError",
        }
    }
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::EmptyCalendar => {
                write!(f, "calendar requires at least one session date")
            }
            CalendarError::InvalidSessionDate { raw } => {
                write!(f, "session date is not strict YYYY-MM-DD: '{raw}'")
            }
            CalendarError::NonIncreasingSessions { prev, next } => {
                write!(
                    f,
                    "session dates must be strictly increasing: '{next}' follows '{prev}'"
                )
            }
            CalendarError::UnparseableAlignmentDate { raw } => {
                write!(f, "alignment date could not be parsed: '{raw}'")
            }
            CalendarError::BeforeFirstSession { input, first } => {
                write!(
                    f,
                    "date '{input}' predates the first session '{first}'"
                )
            }
            CalendarError::AfterLastSession { input, last } => {
                write!(
                    f,
                    "no session on or after '{input}' (last session is '{last}')"
                )
            }
            CalendarError::StartIndexOutOfRange { index, len } => {
                write!(f, "start index {index} is out of range (calendar has {len} sessions)")
            }
            CalendarError::OffsetPastEnd { index, offset, len } => {
                write!(
                    f,
                    "offset {offset} from index {index} pushes past the calendar end ({len} sessions)"
                )
            }
        }
    }
}

impl std::error::Error for CalendarError {}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parse a strict `YYYY-MM-DD` string to a whole epoch-day integer.
///
/// Strict means exactly ten characters with zero-padded fields; chrono's
/// lenient forms (`2025-1-3`) are rejected.
pub fn parse_session_day(s: &str) -> Option<i64> {
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let digits = b
        .iter()
        .enumerate()
        .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit());
    if !digits {
        return None;
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    Some((date - epoch).num_days())
}

// ---------------------------------------------------------------------------
// Aligned session
// ---------------------------------------------------------------------------

/// Result of aligning an arbitrary date to the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedSession {
    /// The resolved trading-session date (`YYYY-MM-DD`).
    pub date: String,
    /// Position of the resolved session within the calendar.
    pub index: usize,
    /// `true` when the input fell on a non-trading day and rolled forward.
    pub shifted: bool,
}

// ---------------------------------------------------------------------------
// TradingCalendar
// ---------------------------------------------------------------------------

/// An ordered, strictly increasing, duplicate-free sequence of trading
/// sessions for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: Vec<String>,
    days: Vec<i64>,
}

impl TradingCalendar {
    /// Build a calendar from price-series dates.
    ///
    /// Every date must be strict `YYYY-MM-DD`. The sequence as given must be
    /// strictly increasing — duplicate or out-of-order input fails, since
    /// calendars are built from already-deduplicated, sorted price dates.
    /// Empty input fails.
    pub fn from_dates<S: AsRef<str>>(dates: &[S]) -> Result<Self, CalendarError> {
        if dates.is_empty() {
            return Err(CalendarError::EmptyCalendar);
        }

        let mut out_dates = Vec::with_capacity(dates.len());
        let mut out_days = Vec::with_capacity(dates.len());
        for d in dates {
            let s = d.as_ref();
            let day = parse_session_day(s).ok_or_else(|| CalendarError::InvalidSessionDate {
                raw: s.to_string(),
            })?;
            if let Some(&prev) = out_days.last() {
                if day <= prev {
                    return Err(CalendarError::NonIncreasingSessions {
                        prev: out_dates.last().cloned().unwrap_or_default(),
                        next: s.to_string(),
                    });
                }
            }
            out_dates.push(s.to_string());
            out_days.push(day);
        }

        Ok(Self {
            dates: out_dates,
            days: out_days,
        })
    }

    /// Number of sessions in the calendar.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Calendars are never empty by construction, but the accessor keeps the
    /// conventional pair with `len`.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First session date.
    pub fn first_date(&self) -> &str {
        &self.dates[0]
    }

    /// Last session date.
    pub fn last_date(&self) -> &str {
        &self.dates[self.dates.len() - 1]
    }

    /// Session date at `index`, if in range.
    pub fn date_at(&self, index: usize) -> Option<&str> {
        self.dates.get(index).map(|s| s.as_str())
    }

    /// Align an arbitrary input date to the first session on or after it.
    ///
    /// Non-trading days roll forward to the next session. Aligning an
    /// already-aligned date is idempotent and reports `shifted = false`.
    ///
    /// Fails when the input predates the first session (no lookback data
    /// exists for it) or lands after the last session.
    pub fn align_to_next_session(&self, date: &str) -> Result<AlignedSession, CalendarError> {
        let day = parse_session_day(date).ok_or_else(|| {
            CalendarError::UnparseableAlignmentDate {
                raw: date.to_string(),
            }
        })?;

        if day < self.days[0] {
            return Err(CalendarError::BeforeFirstSession {
                input: date.to_string(),
                first: self.first_date().to_string(),
            });
        }

        let index = self.days.partition_point(|&d| d < day);
        if index == self.days.len() {
            return Err(CalendarError::AfterLastSession {
                input: date.to_string(),
                last: self.last_date().to_string(),
            });
        }

        Ok(AlignedSession {
            date: self.dates[index].clone(),
            index,
            shifted: self.days[index] != day,
        })
    }

    /// Session at `start_index + offset`.
    ///
    /// Offsets are never negative — this is a strictly forward-looking
    /// instrument. Fails on an out-of-range start index or an offset pushing
    /// past the calendar's end.
    pub fn session_by_offset(
        &self,
        start_index: usize,
        offset: usize,
    ) -> Result<&str, CalendarError> {
        let len = self.days.len();
        if start_index >= len {
            return Err(CalendarError::StartIndexOutOfRange {
                index: start_index,
                len,
            });
        }
        let target = start_index
            .checked_add(offset)
            .filter(|&t| t < len)
            .ok_or(CalendarError::OffsetPastEnd {
                index: start_index,
                offset,
                len,
            })?;
        Ok(&self.dates[target])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
