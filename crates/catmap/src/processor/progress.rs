use std::sync::Mutex;

use tracing::debug;

use super::outcome::OutcomeKind;

/// Where the per-item state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Idle,
    HierarchySelecting,
    SettingsOpening,
    MappingTriggering,
    ResponseWaiting,
    CompletionPolling,
    Classifying,
    Committing,
    RecordingFailure,
    RecordingError,
}

impl std::fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorState::Idle => write!(f, "Idle"),
            ProcessorState::HierarchySelecting => write!(f, "Selecting hierarchy"),
            ProcessorState::SettingsOpening => write!(f, "Opening settings"),
            ProcessorState::MappingTriggering => write!(f, "Triggering automatic mapping"),
            ProcessorState::ResponseWaiting => write!(f, "Waiting for mapping response"),
            ProcessorState::CompletionPolling => write!(f, "Polling mapping completion"),
            ProcessorState::Classifying => write!(f, "Classifying"),
            ProcessorState::Committing => write!(f, "Committing"),
            ProcessorState::RecordingFailure => write!(f, "Recording mapping failure"),
            ProcessorState::RecordingError => write!(f, "Recording error"),
        }
    }
}

/// Events emitted by the processor while it works through one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    State {
        state: ProcessorState,
        message: String,
    },
    Finished {
        record_id: String,
        outcome: OutcomeKind,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Logs every transition at debug level.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::State { state, message } => {
                debug!(state = %state, "{}", message);
            }
            ProgressEvent::Finished { record_id, outcome } => {
                debug!(category_id = %record_id, outcome = %outcome, "Record finished");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// The sequence of states entered, consecutive repeats collapsed.
    pub fn states(&self) -> Vec<ProcessorState> {
        let mut states: Vec<ProcessorState> = Vec::new();
        for event in self.events() {
            if let ProgressEvent::State { state, .. } = event {
                if states.last() != Some(&state) {
                    states.push(state);
                }
            }
        }
        states
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
