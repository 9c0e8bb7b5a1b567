//! Exchange descriptor and symbol classification (spec §3).

use serde::{Deserialize, Serialize};

use crate::timeframe::Timeframe;

/// `{id, name, displayName, wsUrl, restUrl, supportedTimeframes,
/// apiLimits, feeSchedule, isActive}`. Read-mostly, cached in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "wsUrl")]
    pub ws_url: String,
    #[serde(rename = "restUrl")]
    pub rest_url: String,
    #[serde(rename = "supportedTimeframes")]
    pub supported_timeframes: Vec<Timeframe>,
    #[serde(rename = "apiLimits")]
    pub api_limits: ApiLimits,
    #[serde(rename = "feeSchedule")]
    pub fee_schedule: FeeSchedule,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApiLimits {
    pub requests_per_second: u32,
    pub max_subscriptions: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_bps: f64,
    pub taker_bps: f64,
}

/// `tier ∈ {1 shared, 2 user overflow, excluded}` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolTier {
    /// Shared, exchange-scoped key namespace.
    Shared,
    /// Per-user overflow key namespace, TTL-bounded.
    UserOverflow,
    /// Not tracked.
    Excluded,
}

/// `{symbol, tier, exchangeId, userId?}` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedSymbol {
    pub symbol: String,
    pub tier: SymbolTier,
    #[serde(rename = "exchangeId")]
    pub exchange_id: String,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ClassifiedSymbol {
    pub fn is_tracked(&self) -> bool {
        !matches!(self.tier, SymbolTier::Excluded)
    }
}
