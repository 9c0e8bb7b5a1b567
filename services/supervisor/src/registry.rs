//! Adapter factory and the runtime registry the control channel's commands
//! act on (spec §4.8 command table; glue/lifecycle component).
//!
//! One supervisor process owns exactly one adapter instance for one
//! exchange — matching the single-exchange-per-process shape already used
//! by `aggregation_service`/`alert_engine`/the adapter binaries themselves.
//! Pausing and resuming are adapter-level operations: halting inbound
//! subscription naturally starves the rest of the pipeline for that
//! exchange, so the registry does not separately track
//! `aggregation_service`/`alert_engine`, which run as independent
//! processes and keep consuming whatever the cache already holds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use parking_lot::{Mutex, RwLock};

use livermore_adapter_core::Adapter;
use livermore_binance_adapter::BinanceAdapter;
use livermore_cache::{keys, Store};
use livermore_coinbase_adapter::CoinbaseAdapter;
use livermore_types::Timeframe;

use crate::config::{AdapterKindConfig, SupervisorConfig};

/// Keeps the concrete adapter's reconnect-loop task alive and restartable.
/// `Adapter::disconnect` makes the currently running loop exit on its own
/// (it checks an intentional-close flag); the corresponding
/// `Adapter::connect` call only resets that flag, since starting the loop
/// is an inherent `spawn(self: Arc<Self>)` method on the concrete adapter,
/// not part of the `Adapter` trait object. This closure is produced in
/// `build_adapter`, where the concrete type is still in scope, so `resume`
/// can spawn a fresh loop without needing it back.
pub struct AdapterRunner {
    respawn: Box<dyn Fn() -> tokio::task::JoinHandle<()> + Send + Sync>,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl AdapterRunner {
    fn new(spawn_once: impl Fn() -> tokio::task::JoinHandle<()> + Send + Sync + 'static) -> Self {
        let handle = spawn_once();
        Self {
            respawn: Box::new(spawn_once),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Aborts any still-running loop and starts a fresh one. Safe to call
    /// even if the previous loop already exited on its own after a
    /// `disconnect`.
    pub fn restart(&self) {
        self.abort();
        *self.handle.lock() = Some((self.respawn)());
    }

    pub fn abort(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

/// Builds the concrete adapter named by configuration and spawns its
/// background connect/reconnect loop, returning it already erased to the
/// trait object the rest of the supervisor works with, plus the
/// `AdapterRunner` that can restart that loop on `resume`. Kept as its own
/// function so a future third exchange only needs a new match arm here.
pub fn build_adapter(config: &SupervisorConfig, store: Store) -> (Arc<dyn Adapter>, AdapterRunner) {
    match &config.adapter {
        AdapterKindConfig::Coinbase(adapter_config) => {
            let concrete = Arc::new(CoinbaseAdapter::new(adapter_config.clone(), store));
            let spawn_target = concrete.clone();
            let runner = AdapterRunner::new(move || spawn_target.clone().spawn());
            (concrete as Arc<dyn Adapter>, runner)
        }
        AdapterKindConfig::Binance(adapter_config) => {
            let concrete = Arc::new(BinanceAdapter::new(adapter_config.clone(), store));
            let spawn_target = concrete.clone();
            let runner = AdapterRunner::new(move || spawn_target.clone().spawn());
            (concrete as Arc<dyn Adapter>, runner)
        }
    }
}

/// Runtime mode toggled by `switch-mode` (spec §4.8 table: "Toggle
/// operating mode, e.g. normal vs. degraded"). Carried as an opaque label
/// rather than a closed enum since the set of modes is a deployment
/// concern, not a pipeline invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeMode(pub String);

impl Default for RuntimeMode {
    fn default() -> Self {
        RuntimeMode("normal".to_string())
    }
}

/// Holds the one adapter this supervisor process owns, plus the mutable
/// state `switch-mode`/`pause`/`resume` reach through the `CommandHandler`
/// seam (`livermore_control_channel::CommandHandler`).
pub struct ServiceRegistry {
    pub exchange_id: String,
    pub default_timeframe: Timeframe,
    pub adapter: Arc<dyn Adapter>,
    pub store: Store,
    runner: AdapterRunner,
    paused: AtomicBool,
    mode: RwLock<RuntimeMode>,
    /// Symbols explicitly subscribed via `add-symbol`/`remove-symbol`, kept
    /// separately from the adapter's own `SubscriptionRegistry` so
    /// `resume` can replay exactly this process's intent rather than
    /// whatever the adapter happened to still be holding.
    active_symbols: DashSet<String>,
}

impl ServiceRegistry {
    pub fn new(config: &SupervisorConfig, adapter: Arc<dyn Adapter>, runner: AdapterRunner, store: Store) -> Self {
        let active_symbols = DashSet::new();
        for symbol in &config.adapter_symbols() {
            active_symbols.insert(symbol.clone());
        }
        Self {
            exchange_id: config.exchange_id.clone(),
            default_timeframe: config.default_timeframe,
            adapter,
            store,
            runner,
            paused: AtomicBool::new(false),
            mode: RwLock::new(RuntimeMode::default()),
            active_symbols,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Stop adapters, aggregation, alert engine (spec §4.8 table). Only the
    /// adapter is directly owned here; `disconnect` makes the adapter's
    /// reconnect loop exit on its own, which starves `aggregation_service`
    /// and `alert_engine` of fresh candle-close/indicator events without
    /// this process needing to reach into their independent binaries.
    pub async fn pause(&self) -> anyhow::Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        self.adapter.disconnect().await?;
        self.runner.abort();
        Ok(())
    }

    /// Restart the pipeline via the stored service registry (spec §4.8
    /// table). Spawns a fresh reconnect loop — the one `pause` stopped
    /// already exited — then replays every symbol this process is
    /// responsible for.
    pub async fn resume(&self) -> anyhow::Result<()> {
        self.paused.store(false, Ordering::SeqCst);
        self.adapter.connect().await?;
        self.runner.restart();
        let symbols: Vec<String> = self.active_symbols.iter().map(|s| s.clone()).collect();
        if !symbols.is_empty() {
            self.adapter.subscribe(&symbols, self.default_timeframe).await?;
        }
        Ok(())
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode.read().clone()
    }

    pub fn switch_mode(&self, mode: impl Into<String>) -> RuntimeMode {
        let new_mode = RuntimeMode(mode.into());
        *self.mode.write() = new_mode.clone();
        new_mode
    }

    pub async fn add_symbol(&self, symbol: &str) -> anyhow::Result<()> {
        self.active_symbols.insert(symbol.to_string());
        if !self.is_paused() {
            self.adapter
                .subscribe(&[symbol.to_string()], self.default_timeframe)
                .await?;
        }
        self.request_backfill(symbol, self.default_timeframe).await
    }

    pub async fn remove_symbol(&self, symbol: &str) -> anyhow::Result<()> {
        self.active_symbols.remove(symbol);
        self.adapter.unsubscribe(&[symbol.to_string()]).await?;
        Ok(())
    }

    /// `force-backfill` (spec §4.8 table: "Invoke startup-backfill for a
    /// (symbol, tf)"). The backfill bootstrap itself is an external
    /// collaborator specified only by contract (spec's own open question);
    /// this publishes the request half of that contract rather than
    /// reimplementing REST history fetching here.
    pub async fn request_backfill(&self, symbol: &str, tf: Timeframe) -> anyhow::Result<()> {
        let channel = keys::channel_backfill_request(&self.exchange_id);
        let payload = serde_json::json!({
            "exchangeId": self.exchange_id,
            "symbol": symbol,
            "timeframe": tf.as_str(),
        })
        .to_string();
        self.store.publish(&channel, &payload).await?;
        Ok(())
    }

    /// `clear-cache` (spec §4.8 table). Cluster-safe SCAN+DEL, optionally
    /// scoped to one symbol.
    pub async fn clear_cache(&self, symbol: Option<&str>) -> anyhow::Result<u64> {
        let pattern = keys::scan_pattern_candles(&self.exchange_id, symbol, None);
        self.store.scan_delete(&pattern).await.map_err(anyhow::Error::from)
    }

    pub fn health(&self) -> livermore_adapter_core::AdapterHealth {
        self.adapter.health()
    }

    /// Process shutdown: disconnect the adapter and stop its reconnect
    /// loop for good (unlike `pause`, the caller is exiting, not pausing).
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.adapter.disconnect().await?;
        self.runner.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn restart_spawns_a_fresh_task_each_time() {
        let spawn_count = Arc::new(AtomicUsize::new(0));
        let counter = spawn_count.clone();
        let runner = AdapterRunner::new(move || {
            let counter = counter.clone();
            tokio::spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<()>().await;
            })
        });
        tokio::task::yield_now().await;
        assert_eq!(spawn_count.load(Ordering::SeqCst), 1);

        runner.restart();
        tokio::task::yield_now().await;
        assert_eq!(spawn_count.load(Ordering::SeqCst), 2);

        runner.abort();
    }

    #[test]
    fn default_mode_is_normal() {
        assert_eq!(RuntimeMode::default().0, "normal");
    }
}
