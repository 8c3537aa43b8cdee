use std::collections::{BTreeMap, BTreeSet};

use crate::market::MarketId;

/// Resolved display text per market as read from the settings surface.
pub type MarketResolution = BTreeMap<MarketId, Option<String>>;

/// Terminal result of processing one category record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOutcome {
    /// Every market resolved; the mapping was saved.
    Success,
    /// At least one market stayed unresolved; nothing was saved.
    PartialFailure {
        failed_markets: BTreeSet<MarketId>,
        resolved_markets: BTreeMap<MarketId, String>,
    },
    /// The interaction itself could not be completed.
    HardError { message: String },
}

/// Discriminant of [`MappingOutcome`] for counters and progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    PartialFailure,
    HardError,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "success"),
            OutcomeKind::PartialFailure => write!(f, "partial mapping failure"),
            OutcomeKind::HardError => write!(f, "hard error"),
        }
    }
}

impl MappingOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            MappingOutcome::Success => OutcomeKind::Success,
            MappingOutcome::PartialFailure { .. } => OutcomeKind::PartialFailure,
            MappingOutcome::HardError { .. } => OutcomeKind::HardError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MappingOutcome::Success)
    }

    pub fn failed_count(&self) -> usize {
        match self {
            MappingOutcome::Success => 0,
            MappingOutcome::PartialFailure { failed_markets, .. } => failed_markets.len(),
            MappingOutcome::HardError { .. } => MarketId::ALL.len(),
        }
    }

    pub fn mapped_count(&self) -> usize {
        match self {
            MappingOutcome::Success => MarketId::ALL.len(),
            MappingOutcome::PartialFailure {
                resolved_markets, ..
            } => resolved_markets.len(),
            MappingOutcome::HardError { .. } => 0,
        }
    }
}

/// Whether a read value counts as a resolved mapping.
pub fn is_resolved(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Classifies a market read-out. Markets missing from `resolution` count as failed.
pub fn classify(resolution: &MarketResolution) -> MappingOutcome {
    let mut failed_markets = BTreeSet::new();
    let mut resolved_markets = BTreeMap::new();

    for market in MarketId::ALL {
        match resolution.get(&market).and_then(|v| v.as_deref()) {
            Some(text) if is_resolved(Some(text)) => {
                resolved_markets.insert(market, text.to_string());
            }
            _ => {
                failed_markets.insert(market);
            }
        }
    }

    if failed_markets.is_empty() {
        MappingOutcome::Success
    } else {
        MappingOutcome::PartialFailure {
            failed_markets,
            resolved_markets,
        }
    }
}
