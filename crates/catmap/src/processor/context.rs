use crate::catalog::{CategoryRecord, HierarchyPath};
use crate::surface::ObservedResponse;

use super::outcome::MarketResolution;
use super::poll::Polled;

/// Working state of one record as it moves through the processor.
pub struct ItemContext<'a> {
    // Input
    pub index: usize,
    pub record: &'a CategoryRecord,

    // Set once the full path has been split
    pub path: Option<HierarchyPath>,

    // Whether a settings surface is open and must be closed before the next record
    pub settings_open: bool,
    pub settings_attempts: u32,

    // None when the response wait timed out or the listener was dropped
    pub response: Option<ObservedResponse>,

    pub completion: Option<Polled>,

    // Read-out used for classification
    pub resolution: MarketResolution,
}

impl<'a> ItemContext<'a> {
    pub fn new(index: usize, record: &'a CategoryRecord) -> Self {
        Self {
            index,
            record,
            path: None,
            settings_open: false,
            settings_attempts: 0,
            response: None,
            completion: None,
            resolution: MarketResolution::new(),
        }
    }

    /// Leaf segment once parsed, else the record's own name.
    pub fn leaf_segment(&self) -> &str {
        self.path
            .as_ref()
            .map(|p| p.leaf.as_str())
            .unwrap_or(&self.record.name)
    }
}
