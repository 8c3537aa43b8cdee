pub mod batch;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ledger;
pub mod market;
pub mod processor;
pub mod surface;
pub mod telemetry;

pub use batch::{BatchContext, BatchDriver, RunSummary};
pub use catalog::{Catalog, CategoryRecord, HierarchyPath};
pub use config::{load_config, Config};
pub use diagnostics::{DiagnosticStore, SnapshotKind};
pub use error::{CatalogError, CatmapError, ConfigError, DiagnosticsError, LedgerError, Result};
pub use ledger::{Ledger, LedgerPaths, Partition, PartitionCounts};
pub use market::MarketId;
pub use processor::{CategoryProcessor, MappingOutcome, OutcomeKind, ProcessedItem};
pub use surface::{MappingSurface, ScriptedSurface, SurfaceError};
pub use telemetry::init_tracing;
