//! Dataset descriptors for disclosure feeds.
//!
//! Supported feed intents are a fixed, enumerable set, so they are modeled as
//! a closed enum rather than a duck-typed provider interface.

use serde::{Deserialize, Serialize};

/// What kind of disclosure data a dataset carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetIntent {
    /// Congressional / government-actor trading disclosures.
    GovTrading,
    /// Corporate insider transactions.
    Insider,
    /// Regulatory filings.
    Filings,
}

impl DatasetIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetIntent::GovTrading => "gov_trading",
            DatasetIntent::Insider => "insider",
            DatasetIntent::Filings => "filings",
        }
    }
}

/// Identity of the dataset a batch of raw rows came from.
///
/// `dataset_id` participates in event identity; `label` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub dataset_id: String,
    pub label: String,
    pub intent: DatasetIntent,
}

impl DatasetSource {
    pub fn new(
        dataset_id: impl Into<String>,
        label: impl Into<String>,
        intent: DatasetIntent,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            label: label.into(),
            intent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_labels_are_stable() {
        assert_eq!(DatasetIntent::GovTrading.as_str(), "gov_trading");
        assert_eq!(DatasetIntent::Insider.as_str(), "insider");
        assert_eq!(DatasetIntent::Filings.as_str(), "filings");
    }
}
