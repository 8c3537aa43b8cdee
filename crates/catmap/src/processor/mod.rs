pub mod context;
pub mod outcome;
pub mod poll;
pub mod progress;
pub mod runner;
pub mod settings;

pub use context::ItemContext;
pub use outcome::{classify, is_resolved, MappingOutcome, MarketResolution, OutcomeKind};
pub use poll::{PollPolicy, Polled};
pub use progress::{
    NoopProgress, ProcessorState, ProgressEvent, ProgressReporter, RecordingProgress,
    TracingProgress,
};
pub use runner::{CategoryProcessor, ProcessedItem};
pub use settings::ProcessorSettings;
