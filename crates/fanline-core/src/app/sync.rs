//! SyncCoordinator - plugin の drain を一時停止して優先処理（sync）を走らせる
//!
//! # フロー
//! 1. waiting_for_sync = true
//! 2. runtime が Idle になるまで待つ（idle_timeout まで）
//! 3. sync 処理を実行
//! 4. waiting_for_sync = false にして kick（sync の成否に関係なく）

use std::future::Future;
use std::sync::Arc;

use tokio::time::timeout;

use super::config::SyncConfig;
use super::plugin_runtime::PluginRuntime;
use crate::domain::{BoxError, DispatchError, DispatchEvent, Payload};
use crate::ports::EventSink;

pub struct SyncCoordinator {
    config: SyncConfig,
    events: Arc<dyn EventSink>,
}

impl SyncCoordinator {
    pub fn new(config: SyncConfig, events: Arc<dyn EventSink>) -> Self {
        Self { config, events }
    }

    /// Pause `runtime`, run `op` while it is idle, then resume draining.
    ///
    /// If the runtime does not reach idle within `idle_timeout` the flag is
    /// cleared again and the runtime kicked, `op` is not run, and
    /// `SyncTimeout` is returned. An in-flight drain carries on normally.
    pub async fn run<P, F, Fut, T>(
        &self,
        runtime: &Arc<PluginRuntime<P>>,
        op: F,
    ) -> Result<T, DispatchError>
    where
        P: Payload,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let plugin = runtime.name().clone();
        runtime.set_waiting_for_sync(true);
        self.events.emit(&DispatchEvent::SyncRequested {
            plugin: plugin.clone(),
        });

        let waited = self.config.idle_timeout();
        if timeout(waited, runtime.wait_idle()).await.is_err() {
            // the drain may have paused right at the deadline
            runtime.set_waiting_for_sync(false);
            runtime.kick();
            self.events.emit(&DispatchEvent::SyncFinished {
                plugin: plugin.clone(),
                ok: false,
            });
            return Err(DispatchError::SyncTimeout { plugin, waited });
        }

        let result = op().await;

        runtime.set_waiting_for_sync(false);
        runtime.kick();
        self.events.emit(&DispatchEvent::SyncFinished {
            plugin: plugin.clone(),
            ok: result.is_ok(),
        });

        result.map_err(|source| DispatchError::Sync { plugin, source })
    }
}
