use std::collections::HashSet;
use std::str::FromStr;

use tracing::warn;

use crate::catalog::CategoryRecord;

/// A selectable subset of the leaf catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Leaves positioned after the last attempted record.
    Unprocessed,
    /// Leaves listed in either failure log.
    Failed,
    All,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Unprocessed => write!(f, "unprocessed"),
            Partition::Failed => write!(f, "failed"),
            Partition::All => write!(f, "all"),
        }
    }
}

impl FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unprocessed" => Ok(Partition::Unprocessed),
            "failed" => Ok(Partition::Failed),
            "all" => Ok(Partition::All),
            other => Err(format!("Unknown partition: {}", other)),
        }
    }
}

/// Leaves strictly after the marker's position.
///
/// No marker selects every leaf. A marker that no longer names a leaf (the
/// catalog changed since it was written) selects nothing.
pub fn unprocessed<'a>(leaves: &'a [CategoryRecord], marker: Option<&str>) -> &'a [CategoryRecord] {
    let Some(marker) = marker else {
        return leaves;
    };

    match leaves.iter().position(|r| r.id == marker) {
        Some(position) => &leaves[position + 1..],
        None => {
            warn!(
                "Last attempted id '{}' is not in the catalog; nothing is unprocessed",
                marker
            );
            &[]
        }
    }
}

pub fn failed<'a>(leaves: &'a [CategoryRecord], failed_ids: &HashSet<String>) -> Vec<&'a CategoryRecord> {
    leaves.iter().filter(|r| failed_ids.contains(&r.id)).collect()
}

/// Records of `partition`, in catalog order.
pub fn select<'a>(
    partition: Partition,
    leaves: &'a [CategoryRecord],
    marker: Option<&str>,
    failed_ids: &HashSet<String>,
) -> Vec<&'a CategoryRecord> {
    match partition {
        Partition::Unprocessed => unprocessed(leaves, marker).iter().collect(),
        Partition::Failed => failed(leaves, failed_ids),
        Partition::All => leaves.iter().collect(),
    }
}

/// Sizes of each partition plus ledger and diagnostics totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartitionCounts {
    pub unprocessed: usize,
    pub failed: usize,
    pub total: usize,
    pub processed: usize,
    pub snapshots: usize,
}

impl PartitionCounts {
    pub fn of(&self, partition: Partition) -> usize {
        match partition {
            Partition::Unprocessed => self.unprocessed,
            Partition::Failed => self.failed,
            Partition::All => self.total,
        }
    }
}
