use std::sync::Arc;

use crate::config::Config;
use crate::diagnostics::DiagnosticStore;
use crate::ledger::{Ledger, LedgerPaths};
use crate::processor::ProcessorSettings;
use crate::surface::MappingSurface;

/// Everything a run needs, passed explicitly to the processor and driver.
pub struct BatchContext {
    pub settings: ProcessorSettings,
    pub ledger: Ledger,
    pub diagnostics: DiagnosticStore,
    pub surface: Arc<dyn MappingSurface>,
}

impl BatchContext {
    pub fn new(
        settings: ProcessorSettings,
        ledger: Ledger,
        diagnostics: DiagnosticStore,
        surface: Arc<dyn MappingSurface>,
    ) -> Self {
        Self {
            settings,
            ledger,
            diagnostics,
            surface,
        }
    }

    pub fn from_config(config: &Config, surface: Arc<dyn MappingSurface>) -> Self {
        Self::new(
            ProcessorSettings::from_config(config),
            Ledger::new(LedgerPaths::from_config(config)),
            DiagnosticStore::new(config.diagnostics_directory()),
            surface,
        )
    }
}
