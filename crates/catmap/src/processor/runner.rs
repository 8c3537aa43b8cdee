use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::batch::BatchContext;
use crate::catalog::{CategoryRecord, HierarchyPath, PathShapeError};
use crate::diagnostics::SnapshotKind;
use crate::error::LedgerError;
use crate::ledger::{FailedMappingEntry, FailureEntry, HardErrorEntry};
use crate::market::MarketId;
use crate::surface::{MappingSurface, SurfaceError, SurfaceTarget};

use super::context::ItemContext;
use super::outcome::{classify, is_resolved, MappingOutcome, MarketResolution};
use super::progress::{ProcessorState, ProgressEvent, ProgressReporter};

/// Result of processing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedItem {
    /// 1-based position within the run.
    pub index: usize,
    pub record_id: String,
    pub outcome: MappingOutcome,
    /// Failure-log entry for partial failures and hard errors.
    pub failure: Option<FailureEntry>,
    /// Settings triggers issued; 0 if the record never got that far.
    pub settings_attempts: u32,
    /// Status of the observed mapping response, if one arrived in time.
    pub response_status: Option<u16>,
    /// Completion checks made before the poll ended.
    pub completion_checks: u32,
}

#[derive(Error, Debug)]
enum StepError {
    #[error(transparent)]
    MalformedRecord(#[from] PathShapeError),

    #[error("Failed to open category settings popup after {attempts} attempts")]
    SurfaceOpenFailure { attempts: u32 },

    #[error(transparent)]
    InteractionFailure(#[from] SurfaceError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

type Committed = (MappingOutcome, Option<FailureEntry>);

/// Drives one category record at a time through the remote mapping interaction.
pub struct CategoryProcessor {
    ctx: Arc<BatchContext>,
}

impl CategoryProcessor {
    pub fn new(ctx: Arc<BatchContext>) -> Self {
        Self { ctx }
    }

    /// Processes `record` to exactly one terminal outcome.
    ///
    /// Every per-record failure is folded into [`MappingOutcome::HardError`].
    /// Only ledger I/O failures are returned as errors; they end the run.
    pub async fn process(
        &self,
        index: usize,
        record: &CategoryRecord,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessedItem, LedgerError> {
        let span = info_span!("mapping",
            index,
            category_id = %record.id,
        );
        self.process_record(index, record, progress)
            .instrument(span)
            .await
    }

    async fn process_record(
        &self,
        index: usize,
        record: &CategoryRecord,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessedItem, LedgerError> {
        // Marker goes down before any interaction so a crash never hides this record
        self.ctx.ledger.mark_attempted(&record.id)?;
        info!("Processing {}: {}", index, record.full_path);

        let mut item = ItemContext::new(index, record);
        let (outcome, failure) = match self.drive(&mut item, progress).await {
            Ok(committed) => committed,
            Err(StepError::Ledger(e)) => return Err(e),
            Err(e) => self.record_error(&item, e.to_string(), progress).await,
        };

        let response_status = item.response.as_ref().map(|r| r.status);
        let completion_checks = item.completion.map(|p| p.attempts).unwrap_or(0);
        info!(
            settings_attempts = item.settings_attempts,
            completion_checks,
            response = %response_status.map_or_else(|| "none".to_string(), |s| s.to_string()),
            outcome = %outcome.kind(),
            "Finished {}",
            record.id
        );

        match &outcome {
            MappingOutcome::Success => info!("All markets mapped and saved"),
            MappingOutcome::PartialFailure { failed_markets, .. } => {
                let codes: Vec<&str> = failed_markets.iter().map(|m| m.code()).collect();
                warn!("Some markets failed to map: {}", codes.join(", "));
            }
            MappingOutcome::HardError { message } => error!("Error processing: {}", message),
        }

        progress.report(ProgressEvent::Finished {
            record_id: record.id.clone(),
            outcome: outcome.kind(),
        });
        self.enter(progress, ProcessorState::Idle, "Ready for next record");

        Ok(ProcessedItem {
            index,
            record_id: record.id.clone(),
            outcome,
            failure,
            settings_attempts: item.settings_attempts,
            response_status,
            completion_checks,
        })
    }

    async fn drive(
        &self,
        item: &mut ItemContext<'_>,
        progress: &dyn ProgressReporter,
    ) -> Result<Committed, StepError> {
        let path = HierarchyPath::parse(&item.record.full_path, &self.ctx.settings.path_delimiter)?;
        item.path = Some(path.clone());

        self.step_select_hierarchy(&path, progress).await?;
        self.step_open_settings(item, progress).await?;
        self.step_trigger_mapping(item, &path, progress).await?;
        self.step_poll_completion(item, progress).await?;

        let outcome = self.step_classify(item, progress).await?;
        if outcome.is_success() {
            self.step_commit(item, progress).await?;
            Ok((outcome, None))
        } else {
            let entry = self.step_record_failure(item, &outcome, progress).await?;
            Ok((outcome, Some(FailureEntry::Mapping(entry))))
        }
    }

    async fn step_select_hierarchy(
        &self,
        path: &HierarchyPath,
        progress: &dyn ProgressReporter,
    ) -> Result<(), StepError> {
        self.enter(progress, ProcessorState::HierarchySelecting, "Selecting hierarchy...");
        for segment in path.segments() {
            debug!("Selecting segment: {}", segment);
            self.surface().select_segment(segment).await?;
            tokio::time::sleep(self.ctx.settings.settle_delay).await;
        }
        Ok(())
    }

    async fn step_open_settings(
        &self,
        item: &mut ItemContext<'_>,
        progress: &dyn ProgressReporter,
    ) -> Result<(), StepError> {
        self.enter(progress, ProcessorState::SettingsOpening, "Opening category settings...");
        let surface = self.surface();
        let max_attempts = self.ctx.settings.settings_open.max_attempts;

        let polled = self
            .ctx
            .settings
            .settings_open
            .run(
                move |_| async move { surface.trigger_settings().await },
                move |attempt| async move {
                    let opened = surface.settings_opened().await?;
                    if !opened {
                        warn!(
                            "Settings not opened, retrying... ({}/{})",
                            attempt, max_attempts
                        );
                    }
                    Ok::<_, SurfaceError>(opened)
                },
            )
            .await?;

        item.settings_attempts = polled.attempts;
        if !polled.satisfied {
            return Err(StepError::SurfaceOpenFailure {
                attempts: polled.attempts,
            });
        }

        item.settings_open = true;
        debug!("Settings opened after {} attempt(s)", polled.attempts);
        Ok(())
    }

    async fn step_trigger_mapping(
        &self,
        item: &mut ItemContext<'_>,
        path: &HierarchyPath,
        progress: &dyn ProgressReporter,
    ) -> Result<(), StepError> {
        self.enter(progress, ProcessorState::MappingTriggering, "Starting automatic mapping...");
        let surface = self.surface();
        let settings = &self.ctx.settings;

        surface.fill_search_text(&path.leaf).await?;
        tokio::time::sleep(settings.search_settle).await;

        // Listener is armed before the trigger so a fast response cannot be missed
        let watch = surface.arm_response_watch(&settings.response_filter).await?;
        surface.trigger_auto_mapping().await?;

        self.enter(progress, ProcessorState::ResponseWaiting, "Waiting for mapping response...");
        match tokio::time::timeout(settings.response_timeout, watch.recv()).await {
            Ok(Some(response)) => {
                debug!("Mapping response received: {} ({})", response.url, response.status);
                item.response = Some(response);
            }
            Ok(None) => warn!("Mapping response listener closed - proceeding anyway"),
            Err(_) => warn!(
                "Mapping response timeout after {:?} - proceeding anyway",
                settings.response_timeout
            ),
        }
        Ok(())
    }

    async fn step_poll_completion(
        &self,
        item: &mut ItemContext<'_>,
        progress: &dyn ProgressReporter,
    ) -> Result<(), StepError> {
        self.enter(progress, ProcessorState::CompletionPolling, "Checking mapping completion...");
        let surface = self.surface();
        let policy = self.ctx.settings.completion_poll;

        let polled = policy
            .until(move |_| async move {
                let resolution = read_markets(surface).await?;
                Ok::<_, SurfaceError>(
                    resolution.values().all(|v| is_resolved(v.as_deref())),
                )
            })
            .await?;

        if polled.satisfied {
            debug!(
                "All markets mapped (checked {} times, {:?})",
                polled.attempts,
                policy.interval * (polled.attempts - 1)
            );
        } else {
            warn!(
                "Mapping check timeout after {:?} - proceeding anyway",
                policy.budget()
            );
        }
        item.completion = Some(polled);
        Ok(())
    }

    async fn step_classify(
        &self,
        item: &mut ItemContext<'_>,
        progress: &dyn ProgressReporter,
    ) -> Result<MappingOutcome, StepError> {
        self.enter(progress, ProcessorState::Classifying, "Checking mapping results...");
        item.resolution = read_markets(self.surface()).await?;

        for (market, value) in &item.resolution {
            debug!(
                "{}: {}",
                market,
                value.as_deref().unwrap_or("<unmapped>")
            );
        }

        let outcome = classify(&item.resolution);
        info!(
            "Mapping results: {} mapped, {} failed",
            outcome.mapped_count(),
            outcome.failed_count()
        );
        Ok(outcome)
    }

    async fn step_commit(
        &self,
        item: &mut ItemContext<'_>,
        progress: &dyn ProgressReporter,
    ) -> Result<(), StepError> {
        self.enter(progress, ProcessorState::Committing, "Saving mapping...");
        let surface = self.surface();
        let settings = &self.ctx.settings;

        surface.save_settings().await?;
        tokio::time::sleep(settings.save_settle).await;
        surface.close_settings().await?;
        item.settings_open = false;
        tokio::time::sleep(settings.settle_delay).await;

        // Save is only known to have been triggered, not confirmed remotely
        self.ctx.ledger.record_success(item.record)?;
        Ok(())
    }

    async fn step_record_failure(
        &self,
        item: &mut ItemContext<'_>,
        outcome: &MappingOutcome,
        progress: &dyn ProgressReporter,
    ) -> Result<FailedMappingEntry, StepError> {
        self.enter(progress, ProcessorState::RecordingFailure, "Recording mapping failure...");

        let screenshot = self
            .capture(
                SurfaceTarget::Settings,
                SnapshotKind::FailedMapping,
                item.index,
                &item.record.id,
            )
            .await;

        debug!("Closing settings without saving");
        self.surface().close_settings().await?;
        item.settings_open = false;
        tokio::time::sleep(self.ctx.settings.settle_delay).await;

        let failed_markets = match outcome {
            MappingOutcome::PartialFailure { failed_markets, .. } => {
                failed_markets.iter().copied().collect()
            }
            _ => Vec::new(),
        };

        Ok(FailedMappingEntry {
            id: item.record.id.clone(),
            full_path: item.record.full_path.clone(),
            name: item.record.name.clone(),
            leaf_segment: item.leaf_segment().to_string(),
            failed_count: outcome.failed_count(),
            mapped_count: outcome.mapped_count(),
            failed_markets,
            markets: MarketId::ALL
                .into_iter()
                .map(|m| {
                    (m, item.resolution.get(&m).cloned().flatten())
                })
                .collect(),
            screenshot_path: screenshot,
        })
    }

    async fn record_error(
        &self,
        item: &ItemContext<'_>,
        message: String,
        progress: &dyn ProgressReporter,
    ) -> Committed {
        self.enter(progress, ProcessorState::RecordingError, "Recording error...");

        // The settings surface may not exist, so the main surface is captured
        let screenshot = self
            .capture(
                SurfaceTarget::Main,
                SnapshotKind::Error,
                item.index,
                &item.record.id,
            )
            .await;

        if item.settings_open {
            if let Err(e) = self.surface().close_settings().await {
                warn!("Failed to close settings after error: {}", e);
            }
        }

        let entry = HardErrorEntry {
            index: item.index,
            full_path: item.record.full_path.clone(),
            id: item.record.id.clone(),
            name: item.record.name.clone(),
            error: message.clone(),
            screenshot_path: screenshot,
        };

        (
            MappingOutcome::HardError { message },
            Some(FailureEntry::Error(entry)),
        )
    }

    /// Best-effort snapshot; failures are logged and yield no path.
    async fn capture(
        &self,
        target: SurfaceTarget,
        kind: SnapshotKind,
        index: usize,
        record_id: &str,
    ) -> Option<String> {
        let path = self.ctx.diagnostics.snapshot_path(kind, index, record_id);

        let bytes = match self.surface().capture_snapshot(target).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Snapshot capture failed: {}", e);
                return None;
            }
        };

        match self.ctx.diagnostics.write_snapshot(&path, &bytes) {
            Ok(()) => {
                info!("Screenshot saved: {}", path.display());
                Some(path.display().to_string())
            }
            Err(e) => {
                warn!("Failed to store snapshot: {}", e);
                None
            }
        }
    }

    fn surface(&self) -> &dyn MappingSurface {
        self.ctx.surface.as_ref()
    }

    fn enter(&self, progress: &dyn ProgressReporter, state: ProcessorState, message: &str) {
        progress.report(ProgressEvent::State {
            state,
            message: message.to_string(),
        });
    }
}

/// Reads every market once, in [`MarketId::ALL`] order.
async fn read_markets(surface: &dyn MappingSurface) -> Result<MarketResolution, SurfaceError> {
    let mut resolution = MarketResolution::new();
    for market in MarketId::ALL {
        resolution.insert(market, surface.read_market(market).await?);
    }
    Ok(resolution)
}
