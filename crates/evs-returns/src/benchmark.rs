//! Benchmark selection: which symbols an event study is measured against.
//!
//! SPY is always included. Depending on the mode, a sector ETF from the
//! default SPDR mapping (or a caller-supplied override table) is added,
//! with every decision recorded in a human-readable rationale trail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::EventStudyError;

/// The market benchmark included in every selection.
pub const MARKET_BENCHMARK: &str = "SPY";

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// How benchmark symbols are chosen for a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkMode {
    /// SPY only.
    SpyOnly,
    /// SPY plus the mapped sector ETF when the sector is known and mapped;
    /// falls back to SPY-only (with rationale) otherwise.
    SpyPlusSectorIfRelevant,
    /// SPY plus the mapped sector ETF; unknown or unmapped sector fails.
    SpyPlusSectorRequired,
}

// ---------------------------------------------------------------------------
// Sector mapping
// ---------------------------------------------------------------------------

/// Default sector → SPDR ETF table. Keys are normalized (trimmed, lowercase).
const DEFAULT_SECTOR_ETFS: &[(&str, &str)] = &[
    ("technology", "XLK"),
    ("information technology", "XLK"),
    ("financial", "XLF"),
    ("financials", "XLF"),
    ("energy", "XLE"),
    ("health care", "XLV"),
    ("healthcare", "XLV"),
    ("industrials", "XLI"),
    ("consumer discretionary", "XLY"),
    ("consumer staples", "XLP"),
    ("utilities", "XLU"),
    ("materials", "XLB"),
    ("real estate", "XLRE"),
    ("communication services", "XLC"),
];

fn normalize_sector(sector: &str) -> String {
    sector.trim().to_lowercase()
}

fn lookup_sector_etf(
    normalized: &str,
    overrides: Option<&BTreeMap<String, String>>,
) -> Option<String> {
    if let Some(table) = overrides {
        return table.get(normalized).cloned();
    }
    DEFAULT_SECTOR_ETFS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, etf)| etf.to_string())
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Outcome of benchmark selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkSelection {
    /// Deduplicated benchmark symbols, SPY first.
    pub symbols: Vec<String>,
    /// Human-readable decision trail.
    pub rationale: Vec<String>,
    /// The normalized sector label, when one was supplied.
    pub normalized_sector: Option<String>,
    /// The sector ETF actually used, when one was added.
    pub sector_etf: Option<String>,
}

/// Choose benchmark symbols for a sector and mode.
///
/// `overrides` replaces the default sector table entirely when supplied
/// (keys must be normalized: trimmed, lowercase).
pub fn select_benchmarks(
    sector: Option<&str>,
    mode: BenchmarkMode,
    overrides: Option<&BTreeMap<String, String>>,
) -> Result<BenchmarkSelection, EventStudyError> {
    let normalized = sector.map(normalize_sector).filter(|s| !s.is_empty());
    let mut symbols = vec![MARKET_BENCHMARK.to_string()];
    let mut rationale = vec![format!("{MARKET_BENCHMARK} always included as market benchmark")];
    let mut sector_etf = None;

    match mode {
        BenchmarkMode::SpyOnly => {
            rationale.push("mode spy_only: no sector benchmark considered".to_string());
        }
        BenchmarkMode::SpyPlusSectorIfRelevant | BenchmarkMode::SpyPlusSectorRequired => {
            let required = mode == BenchmarkMode::SpyPlusSectorRequired;
            match &normalized {
                None => {
                    if required {
                        return Err(EventStudyError::MissingBenchmarkMapping { sector: None });
                    }
                    rationale.push(
                        "sector unknown: falling back to market benchmark only".to_string(),
                    );
                }
                Some(name) => match lookup_sector_etf(name, overrides) {
                    Some(etf) => {
                        rationale.push(format!("sector '{name}' mapped to {etf}"));
                        if etf != MARKET_BENCHMARK {
                            symbols.push(etf.clone());
                        }
                        sector_etf = Some(etf);
                    }
                    None => {
                        if required {
                            return Err(EventStudyError::MissingBenchmarkMapping {
                                sector: Some(name.clone()),
                            });
                        }
                        rationale.push(format!(
                            "sector '{name}' has no ETF mapping: falling back to market benchmark only"
                        ));
                    }
                },
            }
        }
    }

    Ok(BenchmarkSelection {
        symbols,
        rationale,
        normalized_sector: normalized,
        sector_etf,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
