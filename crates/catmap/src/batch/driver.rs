use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::{Catalog, CategoryRecord};
use crate::diagnostics::SnapshotKind;
use crate::error::{LedgerError, Result};
use crate::ledger::{
    partition, FailedMappingEntry, FailureEntry, HardErrorEntry, Partition, PartitionCounts,
};
use crate::processor::{CategoryProcessor, ProgressReporter};
use crate::surface::SurfaceTarget;

use super::context::BatchContext;
use super::summary::RunSummary;

/// Runs a partition of the leaf catalog through the processor, one record at a time.
pub struct BatchDriver {
    ctx: Arc<BatchContext>,
    catalog: Catalog,
    processor: CategoryProcessor,
}

impl BatchDriver {
    pub fn new(ctx: Arc<BatchContext>, catalog: Catalog) -> Self {
        let processor = CategoryProcessor::new(Arc::clone(&ctx));
        Self {
            ctx,
            catalog,
            processor,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn context(&self) -> &BatchContext {
        &self.ctx
    }

    /// Partition sizes from the current on-disk ledger.
    pub fn counts(&self) -> Result<PartitionCounts> {
        let leaves = self.catalog.leaves();
        let marker = self.ctx.ledger.read_marker()?;
        let failed_ids = self.ctx.ledger.load_failed_ids()?;

        Ok(PartitionCounts {
            unprocessed: partition::unprocessed(leaves, marker.as_deref()).len(),
            failed: partition::failed(leaves, &failed_ids).len(),
            total: leaves.len(),
            processed: self.ctx.ledger.load_processed_ids()?.len(),
            snapshots: self.ctx.diagnostics.count()?,
        })
    }

    /// Records of `target` in catalog order, freshly computed from the ledger.
    pub fn select(&self, target: Partition) -> Result<Vec<&CategoryRecord>> {
        let marker = self.ctx.ledger.read_marker()?;
        let failed_ids = match target {
            Partition::Failed => self.ctx.ledger.load_failed_ids()?,
            _ => Default::default(),
        };
        Ok(partition::select(
            target,
            self.catalog.leaves(),
            marker.as_deref(),
            &failed_ids,
        ))
    }

    pub fn purge_snapshots(&self) -> Result<usize> {
        let removed = self.ctx.diagnostics.purge()?;
        info!(
            "Removed {} snapshot(s) from {}",
            removed,
            self.ctx.diagnostics.directory().display()
        );
        Ok(removed)
    }

    /// Processes every record of `partition`, then merges this run's failures
    /// into both logs and exports the failed catalog rows.
    pub async fn run(
        &self,
        partition: Partition,
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("batch", run_id = %run_id, partition = %partition);
        self.run_partition(run_id, partition, progress)
            .instrument(span)
            .await
    }

    async fn run_partition(
        &self,
        run_id: Uuid,
        partition: Partition,
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary> {
        let records: Vec<CategoryRecord> =
            self.select(partition)?.into_iter().cloned().collect();
        let mut summary = RunSummary::new(run_id, partition, records.len());

        if records.is_empty() {
            info!("No categories to process");
            return Ok(summary);
        }

        self.ctx.diagnostics.ensure_directory()?;
        info!(
            "Processing {} categories from {}",
            records.len(),
            self.catalog.source().display()
        );

        for (offset, record) in records.iter().enumerate() {
            let index = offset + 1;
            let item = match self.processor.process(index, record, progress).await {
                Ok(item) => item,
                Err(e) => {
                    self.capture_fatal(&e).await;
                    return Err(e.into());
                }
            };

            match item.failure {
                None => summary.success_count += 1,
                Some(FailureEntry::Mapping(entry)) => summary.failed_mappings.push(entry),
                Some(FailureEntry::Error(entry)) => summary.errors.push(entry),
            }
            info!(
                "Progress: {}/{} (saved {}, failed {}, errors {})",
                index,
                summary.total,
                summary.success_count,
                summary.failed_count(),
                summary.error_count()
            );
        }

        let attempted: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        self.finish(&mut summary, &attempted)?;
        Ok(summary)
    }

    /// Merges this run's failures into the logs. Entries from earlier runs
    /// survive unless their record was attempted again in this run.
    fn finish(&self, summary: &mut RunSummary, attempted: &HashSet<&str>) -> Result<()> {
        let ledger = &self.ctx.ledger;

        let mut failed_mappings: Vec<FailedMappingEntry> = ledger
            .load_failed_mappings()?
            .into_iter()
            .filter(|e| !attempted.contains(e.id.as_str()))
            .collect();
        let carried_mappings = failed_mappings.len();
        failed_mappings.extend(summary.failed_mappings.iter().cloned());

        let mut errors: Vec<HardErrorEntry> = ledger
            .load_hard_errors()?
            .into_iter()
            .filter(|e| !attempted.contains(e.id.as_str()))
            .collect();
        let carried_errors = errors.len();
        errors.extend(summary.errors.iter().cloned());

        if carried_mappings + carried_errors > 0 {
            info!(
                "Keeping {} failed mapping(s) and {} error(s) from earlier runs",
                carried_mappings, carried_errors
            );
        }
        ledger.rewrite_failed_mapping_log(&failed_mappings)?;
        ledger.rewrite_hard_error_log(&errors)?;

        let failed_ids = ledger.load_failed_ids()?;
        ledger.export_failed_to_catalog_subset(&self.catalog, &failed_ids)?;

        summary.finished_at = Utc::now();
        summary.log();
        Ok(())
    }

    async fn capture_fatal(&self, cause: &LedgerError) {
        error!("Fatal ledger error, stopping run: {}", cause);
        let path = self
            .ctx
            .diagnostics
            .snapshot_path(SnapshotKind::Fatal, 0, "");

        match self.ctx.surface.capture_snapshot(SurfaceTarget::Main).await {
            Ok(bytes) => match self.ctx.diagnostics.write_snapshot(&path, &bytes) {
                Ok(()) => info!("Fatal snapshot saved: {}", path.display()),
                Err(e) => warn!("Failed to store fatal snapshot: {}", e),
            },
            Err(e) => warn!("Fatal snapshot capture failed: {}", e),
        }
    }
}
