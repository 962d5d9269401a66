//! Anchor resolution: dated anchor points per event.
//!
//! An anchor is the calendar date from which a forward return window is
//! measured. Depending on the configured mode an event yields an anchor for
//! its transaction date, its report date, or both.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalizer::PoliticalEvent;
use crate::EventError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which event date an anchor was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorKind {
    Transaction,
    Report,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorKind::Transaction => "transaction",
            AnchorKind::Report => "report",
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor policy: which date kinds to derive per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    Transaction,
    Report,
    Both,
}

impl AnchorMode {
    /// Date kinds implied by this mode, in fixed order.
    pub fn kinds(&self) -> &'static [AnchorKind] {
        match self {
            AnchorMode::Transaction => &[AnchorKind::Transaction],
            AnchorMode::Report => &[AnchorKind::Report],
            AnchorMode::Both => &[AnchorKind::Transaction, AnchorKind::Report],
        }
    }
}

/// One dated anchor point, derived from an event. Not persisted
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAnchor {
    pub event_id: String,
    pub ticker: String,
    pub anchor_kind: AnchorKind,
    /// `YYYY-MM-DD`.
    pub anchor_date: String,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Derive anchors for every event under the given mode.
///
/// Fails `EmptyEventSet` on empty input; `MissingRequiredAnchorDate` when a
/// mode-implied date is absent; `InvalidEventDate` when a present date does
/// not parse. Output is globally sorted ascending by anchor date, with
/// event id and kind as deterministic tie-breaks.
pub fn resolve_anchors(
    events: &[PoliticalEvent],
    mode: AnchorMode,
) -> Result<Vec<EventAnchor>, EventError> {
    if events.is_empty() {
        return Err(EventError::EmptyEventSet);
    }

    let mut anchors = Vec::with_capacity(events.len() * mode.kinds().len());
    for event in events {
        for &kind in mode.kinds() {
            let date = match kind {
                AnchorKind::Transaction => event.transaction_date.as_deref(),
                AnchorKind::Report => event.report_date.as_deref(),
            };
            let raw = date.ok_or_else(|| EventError::MissingRequiredAnchorDate {
                event_id: event.event_id.clone(),
                kind,
            })?;
            let normalized = crate::normalizer::parse_flexible_date(raw).ok_or_else(|| {
                EventError::InvalidEventDate {
                    event_id: event.event_id.clone(),
                    raw: raw.to_string(),
                }
            })?;
            anchors.push(EventAnchor {
                event_id: event.event_id.clone(),
                ticker: event.ticker.clone(),
                anchor_kind: kind,
                anchor_date: normalized,
            });
        }
    }

    anchors.sort_by(|a, b| {
        a.anchor_date
            .cmp(&b.anchor_date)
            .then_with(|| a.event_id.cmp(&b.event_id))
            .then_with(|| a.anchor_kind.cmp(&b.anchor_kind))
    });
    Ok(anchors)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Side;

    fn event(
        id: &str,
        transaction_date: Option<&str>,
        report_date: Option<&str>,
    ) -> PoliticalEvent {
        PoliticalEvent {
            event_id: id.to_string(),
            ticker: "TEST".to_string(),
            source_dataset_id: "d".to_string(),
            actor: None,
            side: Side::Buy,
            transaction_date: transaction_date.map(str::to_string),
            report_date: report_date.map(str::to_string),
            shares: None,
        }
    }

    #[test]
    fn empty_input_fails() {
        let err = resolve_anchors(&[], AnchorMode::Transaction).unwrap_err();
        assert_eq!(err, EventError::EmptyEventSet);
        assert_eq!(err.code(), "EmptyEventSet");
    }

    #[test]
    fn transaction_mode_yields_one_anchor_per_event() {
        let events = vec![event("a", Some("2025-01-03"), Some("2025-01-06"))];
        let anchors = resolve_anchors(&events, AnchorMode::Transaction).unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].anchor_kind, AnchorKind::Transaction);
        assert_eq!(anchors[0].anchor_date, "2025-01-03");
    }

    #[test]
    fn both_mode_yields_two_anchors() {
        let events = vec![event("a", Some("2025-01-03"), Some("2025-01-06"))];
        let anchors = resolve_anchors(&events, AnchorMode::Both).unwrap();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].anchor_date, "2025-01-03");
        assert_eq!(anchors[1].anchor_date, "2025-01-06");
    }

    #[test]
    fn missing_required_date_fails() {
        let events = vec![event("a", None, Some("2025-01-06"))];
        let err = resolve_anchors(&events, AnchorMode::Transaction).unwrap_err();
        assert!(matches!(
            err,
            EventError::MissingRequiredAnchorDate {
                kind: AnchorKind::Transaction,
                ..
            }
        ));
        assert_eq!(err.code(), "MissingRequiredAnchorDate");
    }

    #[test]
    fn unparseable_date_fails() {
        let events = vec![event("a", Some("not a date"), None)];
        let err = resolve_anchors(&events, AnchorMode::Transaction).unwrap_err();
        assert!(matches!(err, EventError::InvalidEventDate { .. }));
        assert_eq!(err.code(), "InvalidEventDate");
    }

    #[test]
    fn output_globally_sorted_by_anchor_date() {
        let events = vec![
            event("b", Some("2025-02-01"), None),
            event("a", Some("2025-01-02"), None),
            event("c", Some("2025-01-02"), None),
        ];
        let anchors = resolve_anchors(&events, AnchorMode::Transaction).unwrap();
        let order: Vec<(&str, &str)> = anchors
            .iter()
            .map(|a| (a.anchor_date.as_str(), a.event_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2025-01-02", "a"),
                ("2025-01-02", "c"),
                ("2025-02-01", "b"),
            ]
        );
    }
}
