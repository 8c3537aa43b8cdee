use thiserror::Error;

/// Failure of a single interaction with the remote administration surface.
///
/// The `Display` text is recorded verbatim as a hard-error message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Settings surface is not open")]
    SettingsNotOpen,

    #[error("Snapshot capture failed: {0}")]
    Snapshot(String),

    #[error("Surface session closed")]
    SessionClosed,
}
