//! Canonical event normalization for raw disclosure rows.
//!
//! This module converts one raw string-keyed row into a [`PoliticalEvent`]
//! with validated symbol, normalized dates, classified side and a
//! content-derived identity.
//!
//! It does **not**:
//! - fetch rows (retrieval is an excluded collaborator)
//! - resolve anchors (that is `anchor.rs`)
//! - hash structures directly (that is `identity.rs`)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetSource;
use crate::identity::{event_id, row_fingerprint, IdentityProjection};
use crate::row::{
    FoldedRow, RawRow, ACTOR_ALIASES, REPORT_DATE_ALIASES, SHARES_ALIASES, SYMBOL_ALIASES,
    TRANSACTION_DATE_ALIASES, TRANSACTION_TYPE_ALIASES,
};
use crate::EventError;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Direction of the disclosed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
    Other,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
            Side::Other => "other",
        }
    }

    /// Keyword classification of a raw transaction-type string.
    pub fn classify(raw: &str) -> Self {
        let folded = raw.to_lowercase();
        if folded.contains("buy") || folded.contains("acquired") || folded.contains("purchase") {
            Side::Buy
        } else if folded.contains("sell") || folded.contains("dispose") {
            Side::Sell
        } else {
            Side::Other
        }
    }
}

/// A fully normalized disclosure event.
///
/// Immutable once created; owned by the run that produced it. At least one of
/// `transaction_date` / `report_date` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliticalEvent {
    /// Content-derived id, stable across equivalent inputs:
    /// `{dataset_id}:{SYMBOL}:{hash}`.
    pub event_id: String,
    pub ticker: String,
    pub source_dataset_id: String,
    pub actor: Option<String>,
    pub side: Side,
    /// Normalized `YYYY-MM-DD`, when disclosed.
    pub transaction_date: Option<String>,
    /// Normalized `YYYY-MM-DD`, when disclosed.
    pub report_date: Option<String>,
    pub shares: Option<f64>,
}

impl PoliticalEvent {
    /// The date used for chronological ordering: transaction date, falling
    /// back to report date.
    pub fn sort_date(&self) -> &str {
        self.transaction_date
            .as_deref()
            .or(self.report_date.as_deref())
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Symbol handling
// ---------------------------------------------------------------------------

/// Validate the target symbol: leading letter, then up to 9 letters, digits
/// or dots. Returns the uppercased form.
pub fn validate_symbol(raw: &str) -> Result<String, EventError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            trimmed.len() <= 10
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '.')
        }
        _ => false,
    };
    if !valid {
        return Err(EventError::InvalidQuiverRow {
            detail: format!("symbol '{raw}' does not match the ticker pattern"),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Sanitize a symbol-like value for comparison: keep alphanumerics and dots,
/// uppercase the rest.
fn sanitize_symbol(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Non-ISO formats accepted for source dates, probed in order.
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parse a source date string, normalizing to `YYYY-MM-DD`.
///
/// Accepts strict ISO, ISO datetime prefixes and the fixed fallback formats.
pub fn parse_flexible_date(raw: &str) -> Option<String> {
    let t = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    // ISO datetime ("2025-01-03T00:00:00" or with a space): date prefix.
    if t.len() > 10 {
        let (head, rest) = t.split_at(10);
        if rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Some(d.format("%Y-%m-%d").to_string());
            }
        }
    }
    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d.format("%Y-%m-%d").to_string());
        }
    }
    None
}

/// Probe one date field: `Ok(None)` when absent, `InvalidDate` when a found
/// value does not parse.
fn resolve_date(
    folded: &FoldedRow<'_>,
    aliases: &[&str],
    field: &'static str,
) -> Result<Option<String>, EventError> {
    match folded.probe_string(aliases) {
        None => Ok(None),
        Some(raw) => match parse_flexible_date(&raw) {
            Some(normalized) => Ok(Some(normalized)),
            None => Err(EventError::InvalidDate { field, raw }),
        },
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a single raw row into a [`PoliticalEvent`].
pub fn normalize_event(
    source: &DatasetSource,
    ticker: &str,
    row: &RawRow,
) -> Result<PoliticalEvent, EventError> {
    let symbol = validate_symbol(ticker)?;
    let folded = FoldedRow::from_row(row);

    // If the row carries its own symbol-like field it must agree with the
    // explicit target symbol.
    if let Some(row_symbol) = folded.probe_string(SYMBOL_ALIASES) {
        if sanitize_symbol(&row_symbol) != symbol {
            return Err(EventError::InvalidQuiverRow {
                detail: format!(
                    "row symbol '{row_symbol}' does not match target '{symbol}'"
                ),
            });
        }
    }

    let transaction_date = resolve_date(&folded, TRANSACTION_DATE_ALIASES, "transaction_date")?;
    let report_date = resolve_date(&folded, REPORT_DATE_ALIASES, "report_date")?;
    if transaction_date.is_none() && report_date.is_none() {
        return Err(EventError::MissingRequiredField {
            field: "transaction_date/report_date",
        });
    }

    let actor = folded.probe_string(ACTOR_ALIASES);
    let side = Side::classify(
        folded
            .probe_string(TRANSACTION_TYPE_ALIASES)
            .as_deref()
            .unwrap_or(""),
    );
    let shares = folded.probe_number(SHARES_ALIASES);

    let fingerprint = row_fingerprint(row);
    let event_id = event_id(&IdentityProjection {
        dataset_id: &source.dataset_id,
        symbol: &symbol,
        transaction_date: transaction_date.as_deref(),
        report_date: report_date.as_deref(),
        actor: actor.as_deref(),
        transaction_type: side.as_str(),
        row_fingerprint: &fingerprint,
    });

    Ok(PoliticalEvent {
        event_id,
        ticker: symbol,
        source_dataset_id: source.dataset_id.clone(),
        actor,
        side,
        transaction_date,
        report_date,
        shares,
    })
}

/// Normalize a batch of raw rows.
///
/// Fails with `DuplicateEventId` if two rows produce the same id. Output is
/// sorted ascending by transaction date, falling back to report date, with
/// the event id as a deterministic tie-break.
pub fn normalize_batch(
    source: &DatasetSource,
    ticker: &str,
    rows: &[RawRow],
) -> Result<Vec<PoliticalEvent>, EventError> {
    let mut seen = std::collections::BTreeSet::new();
    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        let event = normalize_event(source, ticker, row)?;
        if !seen.insert(event.event_id.clone()) {
            return Err(EventError::DuplicateEventId {
                event_id: event.event_id,
            });
        }
        events.push(event);
    }
    events.sort_by(|a, b| {
        a.sort_date()
            .cmp(b.sort_date())
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    Ok(events)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
