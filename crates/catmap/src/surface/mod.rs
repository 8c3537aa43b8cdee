//! Narrow capability interface over the remote category administration surface.
//!
//! The processor only ever talks to [`MappingSurface`]; the concrete
//! remote-page driver lives outside this crate.

pub mod error;
pub mod scripted;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::config::ResponseFilterConfig;
use crate::market::MarketId;

pub use error::SurfaceError;
pub use scripted::{LeafScript, ResponseBehavior, ScriptedSurface, SurfaceCall};

/// Which surface a diagnostic snapshot is taken of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTarget {
    /// The hierarchy page the session stays on between items.
    Main,
    /// The per-item settings context opened for one category.
    Settings,
}

/// A network response observed on the settings surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub url: String,
    pub status: u16,
}

/// Decides whether an observed response signals the automatic-mapping result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFilter {
    pub endpoint: String,
    pub fallback_fragment: String,
    pub fallback_status: u16,
}

impl ResponseFilter {
    pub fn from_config(config: &ResponseFilterConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            fallback_fragment: config.fallback_fragment.clone(),
            fallback_status: config.fallback_status,
        }
    }

    pub fn matches(&self, response: &ObservedResponse) -> bool {
        response.url.contains(&self.endpoint)
            || (response.url.contains(&self.fallback_fragment)
                && response.status == self.fallback_status)
    }
}

impl Default for ResponseFilter {
    fn default() -> Self {
        Self::from_config(&ResponseFilterConfig::default())
    }
}

/// A response listener armed before the action that produces the response.
///
/// Surface implementations keep the paired [`oneshot::Sender`] and fire it for
/// the first response accepted by the [`ResponseFilter`] they were armed with.
pub struct ResponseWatch {
    rx: oneshot::Receiver<ObservedResponse>,
}

impl ResponseWatch {
    pub fn channel() -> (oneshot::Sender<ObservedResponse>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Resolves with the matched response, or `None` if the surface dropped the
    /// listener without ever seeing one.
    pub async fn recv(self) -> Option<ObservedResponse> {
        self.rx.await.ok()
    }
}

/// Operations the category mapping processor needs from the remote surface.
///
/// One instance represents one interactive session; callers never use it for
/// two records at once.
#[async_trait]
pub trait MappingSurface: Send + Sync {
    /// Select a hierarchy entry by its visible text.
    async fn select_segment(&self, segment: &str) -> Result<(), SurfaceError>;

    /// Ask for the settings surface of the selected leaf. It may silently not open.
    async fn trigger_settings(&self) -> Result<(), SurfaceError>;

    /// Whether a settings surface is currently open as a new context.
    async fn settings_opened(&self) -> Result<bool, SurfaceError>;

    async fn fill_search_text(&self, text: &str) -> Result<(), SurfaceError>;

    /// Register a listener for the next response accepted by `filter`.
    async fn arm_response_watch(
        &self,
        filter: &ResponseFilter,
    ) -> Result<ResponseWatch, SurfaceError>;

    async fn trigger_auto_mapping(&self) -> Result<(), SurfaceError>;

    /// Resolved display text for `market`, `None` when nothing is selected.
    async fn read_market(&self, market: MarketId) -> Result<Option<String>, SurfaceError>;

    async fn save_settings(&self) -> Result<(), SurfaceError>;

    async fn close_settings(&self) -> Result<(), SurfaceError>;

    /// Encoded image of `target`.
    async fn capture_snapshot(&self, target: SurfaceTarget) -> Result<Vec<u8>, SurfaceError>;
}
