//! The fixed set of external marketplaces targeted by automatic mapping.

use serde::{Deserialize, Serialize};

/// One of the five marketplaces the settings surface maps a leaf category to.
///
/// Every classification is defined over exactly [`MarketId::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarketId {
    #[serde(rename = "11ST")]
    Elevenst,
    #[serde(rename = "AUC20")]
    Auction,
    #[serde(rename = "GMK20")]
    Gmarket,
    #[serde(rename = "SMART")]
    SmartStore,
    #[serde(rename = "COUP")]
    Coupang,
}

impl MarketId {
    pub const ALL: [MarketId; 5] = [
        MarketId::Elevenst,
        MarketId::Auction,
        MarketId::Gmarket,
        MarketId::SmartStore,
        MarketId::Coupang,
    ];

    /// Stable identifier the settings surface uses for this market's selector.
    pub fn code(&self) -> &'static str {
        match self {
            MarketId::Elevenst => "11ST",
            MarketId::Auction => "AUC20",
            MarketId::Gmarket => "GMK20",
            MarketId::SmartStore => "SMART",
            MarketId::Coupang => "COUP",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MarketId::Elevenst => "11st",
            MarketId::Auction => "Auction 2.0",
            MarketId::Gmarket => "Gmarket 2.0",
            MarketId::SmartStore => "SmartStore",
            MarketId::Coupang => "Coupang",
        }
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
