use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::market::MarketId;

/// A record whose automatic mapping left one or more markets unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedMappingEntry {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "FullPath")]
    pub full_path: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "leafSegment")]
    pub leaf_segment: String,
    #[serde(rename = "failedCount")]
    pub failed_count: usize,
    #[serde(rename = "mappedCount")]
    pub mapped_count: usize,
    #[serde(rename = "failedMarkets")]
    pub failed_markets: Vec<MarketId>,
    /// Every market, `null` where unresolved.
    pub markets: BTreeMap<MarketId, Option<String>>,
    #[serde(rename = "screenshotPath")]
    pub screenshot_path: Option<String>,
}

/// A record whose interaction could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardErrorEntry {
    /// 1-based position within the run.
    pub index: usize,
    #[serde(rename = "FullPath")]
    pub full_path: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    pub error: String,
    #[serde(rename = "screenshotPath", default)]
    pub screenshot_path: Option<String>,
}

/// Failure record produced by the processor for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureEntry {
    Mapping(FailedMappingEntry),
    Error(HardErrorEntry),
}

impl FailureEntry {
    pub fn id(&self) -> &str {
        match self {
            FailureEntry::Mapping(entry) => &entry.id,
            FailureEntry::Error(entry) => &entry.id,
        }
    }
}

/// Just the id column of any ledger row; other fields are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct LedgerId {
    #[serde(rename = "ID")]
    pub id: String,
}
