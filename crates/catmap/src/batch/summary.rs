use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::ledger::{FailedMappingEntry, HardErrorEntry, Partition};

/// Counters and failure lists for one pass over a partition.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub partition: Partition,
    pub total: usize,
    pub success_count: usize,
    pub failed_mappings: Vec<FailedMappingEntry>,
    pub errors: Vec<HardErrorEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(run_id: Uuid, partition: Partition, total: usize) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            partition,
            total,
            success_count: 0,
            failed_mappings: Vec::new(),
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failed_mappings.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Records that reached any terminal outcome.
    pub fn completed(&self) -> usize {
        self.success_count + self.failed_count() + self.error_count()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            partition = %self.partition,
            "Run finished in {}s",
            self.duration().num_seconds()
        );
        info!("Saved: {}/{}", self.success_count, self.total);
        info!("Failed mapping: {}/{}", self.failed_count(), self.total);
        info!("Errors: {}/{}", self.error_count(), self.total);

        if !self.failed_mappings.is_empty() {
            let ids: Vec<&str> = self.failed_mappings.iter().map(|e| e.id.as_str()).collect();
            info!("Failed mapping ids: {}", ids.join(", "));
        }
        if !self.errors.is_empty() {
            let ids: Vec<&str> = self.errors.iter().map(|e| e.id.as_str()).collect();
            info!("Error ids: {}", ids.join(", "));
        }
    }
}
