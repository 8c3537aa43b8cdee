//! Deterministic in-memory [`MappingSurface`] for tests and dry runs.
//!
//! Behaviour is scripted per leaf segment (the last segment selected before
//! the settings surface is opened). Every call is journaled so callers can
//! assert on the exact interaction sequence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::market::MarketId;

use super::{
    MappingSurface, ObservedResponse, ResponseFilter, ResponseWatch, SurfaceError, SurfaceTarget,
};

/// Minimal PNG signature returned as snapshot content.
const SNAPSHOT_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// One journaled interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Select(String),
    TriggerSettings,
    FillSearch(String),
    ArmResponse,
    TriggerAutoMapping,
    ReadMarket(MarketId),
    Save,
    CloseSettings,
    Snapshot(SurfaceTarget),
}

/// How the surface answers an armed response watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBehavior {
    /// Emit this response when automatic mapping is triggered.
    Respond(ObservedResponse),
    /// Keep the listener alive but never fire it.
    Silent,
    /// Drop the listener when automatic mapping is triggered.
    Drop,
}

impl Default for ResponseBehavior {
    fn default() -> Self {
        ResponseBehavior::Respond(ObservedResponse {
            url: "https://admin.test/api/recommend_category".to_string(),
            status: 200,
        })
    }
}

/// Scripted behaviour for one leaf category.
#[derive(Debug, Clone)]
pub struct LeafScript {
    pub markets: BTreeMap<MarketId, Option<String>>,
    /// Completion rounds that still read as unresolved before `markets` shows.
    pub rounds_before_resolved: u32,
    /// Settings triggers that silently do nothing before one opens the surface.
    pub failed_settings_attempts: u32,
    pub response: ResponseBehavior,
    pub fail_save: bool,
}

impl LeafScript {
    pub fn resolved() -> Self {
        let markets = MarketId::ALL
            .into_iter()
            .map(|m| (m, Some(format!("{} mapped category", m.display_name()))))
            .collect();
        Self {
            markets,
            rounds_before_resolved: 0,
            failed_settings_attempts: 0,
            response: ResponseBehavior::default(),
            fail_save: false,
        }
    }

    pub fn with_market(mut self, market: MarketId, value: Option<&str>) -> Self {
        self.markets.insert(market, value.map(str::to_string));
        self
    }

    pub fn unresolved(mut self, markets: &[MarketId]) -> Self {
        for market in markets {
            self.markets.insert(*market, None);
        }
        self
    }

    pub fn settings_never_open(mut self) -> Self {
        self.failed_settings_attempts = u32::MAX;
        self
    }

    pub fn settings_open_after(mut self, failed_attempts: u32) -> Self {
        self.failed_settings_attempts = failed_attempts;
        self
    }

    pub fn resolve_after(mut self, rounds: u32) -> Self {
        self.rounds_before_resolved = rounds;
        self
    }

    pub fn response(mut self, behavior: ResponseBehavior) -> Self {
        self.response = behavior;
        self
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }
}

impl Default for LeafScript {
    fn default() -> Self {
        Self::resolved()
    }
}

#[derive(Default)]
struct SessionState {
    calls: Vec<SurfaceCall>,
    selected: Option<String>,
    settings_open: bool,
    settings_triggers: u32,
    read_rounds: u32,
    pending: Option<(ResponseFilter, oneshot::Sender<ObservedResponse>)>,
    saved: Vec<String>,
}

pub struct ScriptedSurface {
    default_script: LeafScript,
    scripts: HashMap<String, LeafScript>,
    failing_segments: HashSet<String>,
    state: Mutex<SessionState>,
}

impl ScriptedSurface {
    /// Every leaf resolves all markets on the first check.
    pub fn new() -> Self {
        Self::with_default(LeafScript::resolved())
    }

    pub fn with_default(default_script: LeafScript) -> Self {
        Self {
            default_script,
            scripts: HashMap::new(),
            failing_segments: HashSet::new(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn script(mut self, leaf: &str, script: LeafScript) -> Self {
        self.scripts.insert(leaf.to_string(), script);
        self
    }

    /// Selecting `segment` fails with an interaction error.
    pub fn failing_segment(mut self, segment: &str) -> Self {
        self.failing_segments.insert(segment.to_string());
        self
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.session().calls.clone()
    }

    pub fn select_count(&self) -> usize {
        self.session()
            .calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Select(_)))
            .count()
    }

    pub fn snapshot_targets(&self) -> Vec<SurfaceTarget> {
        self.session()
            .calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Snapshot(target) => Some(*target),
                _ => None,
            })
            .collect()
    }

    /// Leaves whose settings were saved, in order.
    pub fn saved_leaves(&self) -> Vec<String> {
        self.session().saved.clone()
    }

    pub fn settings_open(&self) -> bool {
        self.session().settings_open
    }

    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn script_for(&self, leaf: Option<&str>) -> &LeafScript {
        leaf.and_then(|l| self.scripts.get(l))
            .unwrap_or(&self.default_script)
    }
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MappingSurface for ScriptedSurface {
    async fn select_segment(&self, segment: &str) -> Result<(), SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::Select(segment.to_string()));
        if self.failing_segments.contains(segment) {
            return Err(SurfaceError::ElementNotFound(format!(
                "link with text '{}'",
                segment
            )));
        }
        state.selected = Some(segment.to_string());
        state.settings_triggers = 0;
        state.read_rounds = 0;
        Ok(())
    }

    async fn trigger_settings(&self) -> Result<(), SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::TriggerSettings);
        if state.settings_open {
            return Ok(());
        }
        state.settings_triggers = state.settings_triggers.saturating_add(1);
        let script = self.script_for(state.selected.as_deref());
        if state.settings_triggers > script.failed_settings_attempts {
            state.settings_open = true;
        }
        Ok(())
    }

    async fn settings_opened(&self) -> Result<bool, SurfaceError> {
        Ok(self.session().settings_open)
    }

    async fn fill_search_text(&self, text: &str) -> Result<(), SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::FillSearch(text.to_string()));
        if !state.settings_open {
            return Err(SurfaceError::SettingsNotOpen);
        }
        Ok(())
    }

    async fn arm_response_watch(
        &self,
        filter: &ResponseFilter,
    ) -> Result<ResponseWatch, SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::ArmResponse);
        let (tx, watch) = ResponseWatch::channel();
        state.pending = Some((filter.clone(), tx));
        Ok(watch)
    }

    async fn trigger_auto_mapping(&self) -> Result<(), SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::TriggerAutoMapping);
        if !state.settings_open {
            return Err(SurfaceError::SettingsNotOpen);
        }
        let behavior = self.script_for(state.selected.as_deref()).response.clone();
        match behavior {
            ResponseBehavior::Respond(response) => {
                if let Some((filter, tx)) = state.pending.take() {
                    if filter.matches(&response) {
                        let _ = tx.send(response);
                    } else {
                        state.pending = Some((filter, tx));
                    }
                }
            }
            ResponseBehavior::Silent => {}
            ResponseBehavior::Drop => {
                state.pending = None;
            }
        }
        Ok(())
    }

    async fn read_market(&self, market: MarketId) -> Result<Option<String>, SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::ReadMarket(market));
        if !state.settings_open {
            return Err(SurfaceError::SettingsNotOpen);
        }
        if market == MarketId::ALL[0] {
            state.read_rounds = state.read_rounds.saturating_add(1);
        }
        let script = self.script_for(state.selected.as_deref());
        if state.read_rounds <= script.rounds_before_resolved {
            return Ok(None);
        }
        Ok(script.markets.get(&market).cloned().flatten())
    }

    async fn save_settings(&self) -> Result<(), SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::Save);
        if !state.settings_open {
            return Err(SurfaceError::SettingsNotOpen);
        }
        if self.script_for(state.selected.as_deref()).fail_save {
            return Err(SurfaceError::ElementNotFound(
                "settings save button".to_string(),
            ));
        }
        let leaf = state.selected.clone().unwrap_or_default();
        state.saved.push(leaf);
        Ok(())
    }

    async fn close_settings(&self) -> Result<(), SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::CloseSettings);
        state.settings_open = false;
        state.pending = None;
        Ok(())
    }

    async fn capture_snapshot(&self, target: SurfaceTarget) -> Result<Vec<u8>, SurfaceError> {
        let mut state = self.session();
        state.calls.push(SurfaceCall::Snapshot(target));
        if target == SurfaceTarget::Settings && !state.settings_open {
            return Err(SurfaceError::SettingsNotOpen);
        }
        Ok(SNAPSHOT_BYTES.to_vec())
    }
}
