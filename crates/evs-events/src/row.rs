//! Alias-based field lookup over raw disclosure rows.
//!
//! Source rows arrive with arbitrary casing and field naming
//! (`TransactionDate`, `transaction_date`, `Traded`, ...). Each logical field
//! has an explicit ordered list of candidate names, probed against a
//! case-folded lookup built once per row. Keeping the tables here keeps the
//! probing in one table-driven function instead of scattered conditionals.

use serde_json::Value;
use std::collections::BTreeMap;

/// A raw disclosure row exactly as handed over by the retrieval layer.
pub type RawRow = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Alias tables
// ---------------------------------------------------------------------------
//
// Candidate names are stored pre-folded (lowercase, alphanumerics only) and
// probed in order; the first present alias wins.

pub const TRANSACTION_DATE_ALIASES: &[&str] =
    &["transactiondate", "tradedate", "traded", "date"];

pub const REPORT_DATE_ALIASES: &[&str] = &[
    "reportdate",
    "disclosuredate",
    "disclosed",
    "filingdate",
    "filed",
    "reported",
];

pub const ACTOR_ALIASES: &[&str] = &[
    "representative",
    "senator",
    "politician",
    "member",
    "name",
    "actor",
];

pub const TRANSACTION_TYPE_ALIASES: &[&str] =
    &["transaction", "transactiontype", "type", "side"];

pub const SYMBOL_ALIASES: &[&str] = &["ticker", "symbol", "stock"];

pub const SHARES_ALIASES: &[&str] = &["shares", "amount", "quantity", "size"];

// ---------------------------------------------------------------------------
// Key folding
// ---------------------------------------------------------------------------

/// Fold a field name for alias matching: lowercase, ASCII alphanumerics only.
///
/// `TransactionDate`, `transaction_date` and `transaction date` all fold to
/// `transactiondate`.
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ---------------------------------------------------------------------------
// FoldedRow
// ---------------------------------------------------------------------------

/// Case-folded view over one raw row, built once and probed many times.
///
/// On fold collisions (two raw keys folding to the same name) the first key in
/// the row's iteration order wins; later duplicates are ignored.
#[derive(Debug, Clone)]
pub struct FoldedRow<'a> {
    entries: BTreeMap<String, &'a Value>,
}

impl<'a> FoldedRow<'a> {
    pub fn from_row(row: &'a RawRow) -> Self {
        let mut entries = BTreeMap::new();
        for (key, value) in row {
            entries.entry(fold_key(key)).or_insert(value);
        }
        Self { entries }
    }

    /// Probe an ordered alias list; first present candidate wins.
    pub fn probe(&self, aliases: &[&str]) -> Option<&'a Value> {
        aliases
            .iter()
            .find_map(|alias| self.entries.get(*alias).copied())
    }

    /// Probe for a non-empty string rendering of the field.
    ///
    /// Strings are trimmed; numbers are rendered with their JSON formatting;
    /// null, booleans, arrays and objects yield `None`.
    pub fn probe_string(&self, aliases: &[&str]) -> Option<String> {
        match self.probe(aliases)? {
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Probe for a numeric field, accepting JSON numbers and numeric strings
    /// (thousands separators stripped).
    pub fn probe_number(&self, aliases: &[&str]) -> Option<f64> {
        match self.probe(aliases)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok()
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> RawRow {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn fold_key_strips_separators_and_case() {
        assert_eq!(fold_key("TransactionDate"), "transactiondate");
        assert_eq!(fold_key("transaction_date"), "transactiondate");
        assert_eq!(fold_key("Transaction Date"), "transactiondate");
        assert_eq!(fold_key("REPORT-DATE"), "reportdate");
    }

    #[test]
    fn probe_respects_alias_order() {
        let r = row(json!({"Date": "2025-01-02", "TransactionDate": "2025-01-03"}));
        let folded = FoldedRow::from_row(&r);
        let v = folded.probe(TRANSACTION_DATE_ALIASES).unwrap();
        assert_eq!(v, &json!("2025-01-03"));
    }

    #[test]
    fn probe_string_trims_and_rejects_empty() {
        let r = row(json!({"Representative": "  Jane Doe  ", "Senator": "   "}));
        let folded = FoldedRow::from_row(&r);
        assert_eq!(
            folded.probe_string(ACTOR_ALIASES),
            Some("Jane Doe".to_string())
        );
        let only_blank = row(json!({"Senator": "   "}));
        let folded = FoldedRow::from_row(&only_blank);
        assert_eq!(folded.probe_string(ACTOR_ALIASES), None);
    }

    #[test]
    fn probe_number_accepts_numeric_strings() {
        let r = row(json!({"Shares": "1,500"}));
        let folded = FoldedRow::from_row(&r);
        assert_eq!(folded.probe_number(SHARES_ALIASES), Some(1500.0));

        let r = row(json!({"Amount": 250}));
        let folded = FoldedRow::from_row(&r);
        assert_eq!(folded.probe_number(SHARES_ALIASES), Some(250.0));
    }

    #[test]
    fn missing_aliases_probe_to_none() {
        let r = row(json!({"unrelated": 1}));
        let folded = FoldedRow::from_row(&r);
        assert!(folded.probe(SYMBOL_ALIASES).is_none());
        assert!(folded.probe_number(SHARES_ALIASES).is_none());
    }

    #[test]
    fn first_key_wins_on_fold_collision() {
        // serde_json::Map iterates keys in sorted order by default, so
        // "TICKER" is seen before "Ticker" and wins the folded slot.
        let r = row(json!({"Ticker": "AAPL", "TICKER": "MSFT"}));
        let folded = FoldedRow::from_row(&r);
        assert_eq!(
            folded.probe_string(SYMBOL_ALIASES),
            Some("MSFT".to_string())
        );
    }
}
