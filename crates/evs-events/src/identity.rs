//! Content-addressed event identity.
//!
//! Event ids are derived by hashing a canonical encoding of the identity
//! fields plus a fingerprint of the whole raw row. The canonical encoding is
//! a pure function producing a deterministic byte sequence: key-sorted,
//! case-normalized, whitespace-trimmed, independent of map iteration order.
//! Two structurally different rows describing the same economic fact collide
//! only when their content truly matches.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::row::fold_key;

/// Number of hex characters of the SHA-256 digest kept in the event id.
const ID_HASH_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Canonical encoding
// ---------------------------------------------------------------------------

/// Render a JSON value into a canonical string form.
///
/// Rules:
/// - Object keys are folded like alias probing folds them ([`fold_key`]:
///   lowercase, ASCII alphanumerics only), then sorted bytewise, so
///   `TransactionDate` and `transaction_date` encode identically.
/// - String values are lowercased and trimmed.
/// - Numbers use serde_json's fixed formatting (shortest round-trip).
/// - Nested arrays and objects recurse with the same rules.
pub fn canonical_encoding(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            out.push('"');
            out.push_str(&s.trim().to_lowercase());
            out.push('"');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let sorted: BTreeMap<String, &Value> =
                map.iter().map(|(k, v)| (fold_key(k), v)).collect();
            out.push('{');
            for (i, (key, v)) in sorted.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('"');
                out.push_str(key);
                out.push_str("\":");
                write_canonical(v, out);
            }
            out.push('}');
        }
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// SHA-256 of a string, hex-encoded.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of a whole raw row: SHA-256 over its canonical encoding.
///
/// Absorbs row-level variation beyond the identity fields, so duplicate
/// disclosures with genuinely different content (e.g. differing amounts)
/// still receive differing ids.
pub fn row_fingerprint(row: &serde_json::Map<String, Value>) -> String {
    sha256_hex(&canonical_encoding(&Value::Object(row.clone())))
}

/// Identity projection of one event, prior to hashing.
///
/// Optional fields render as empty strings so the projection shape is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProjection<'a> {
    pub dataset_id: &'a str,
    pub symbol: &'a str,
    pub transaction_date: Option<&'a str>,
    pub report_date: Option<&'a str>,
    pub actor: Option<&'a str>,
    pub transaction_type: &'a str,
    pub row_fingerprint: &'a str,
}

/// Compute the event id `{dataset_id}:{symbol}:{hash}` for a projection.
pub fn event_id(projection: &IdentityProjection<'_>) -> String {
    let mut fields = serde_json::Map::new();
    let mut put = |key: &str, value: &str| {
        fields.insert(key.to_string(), Value::String(value.to_string()));
    };
    put("dataset_id", projection.dataset_id);
    put("symbol", projection.symbol);
    put("transaction_date", projection.transaction_date.unwrap_or(""));
    put("report_date", projection.report_date.unwrap_or(""));
    put("actor", projection.actor.unwrap_or(""));
    put("transaction_type", projection.transaction_type);
    put("row_fingerprint", projection.row_fingerprint);

    let digest = sha256_hex(&canonical_encoding(&Value::Object(fields)));
    format!(
        "{}:{}:{}",
        projection.dataset_id,
        projection.symbol,
        &digest[..ID_HASH_LEN]
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
