//! PluginRuntime - plugin ごとの drain ループ
//!
//! # 状態
//! - `Idle` / `Processing`（drain 中）
//! - `waiting_for_sync`: true の間は drain に入らない。drain 中に立った場合は
//!   次のステップ境界（in-flight の task が終わった後）で Idle に戻る
//!
//! # フロー（1ステップ）
//! 1. waiting_for_sync なら Idle にして終了
//! 2. TaskStore::next_task_for() で次の task を取得
//! 3. なければ Idle にして終了
//! 4. Plugin::process() を実行（エラー / panic は報告するだけ）
//! 5. TaskStore::update_status() → in-memory ledger の順で完了を記録
//! 6. 1 に戻る（再帰ではなくループ）

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tokio::sync::watch;

use super::config::CompletionPolicy;
use crate::domain::{
    DispatchError, DispatchEvent, Payload, PluginName, ProcessError, RuntimeStatus, StopReason,
    StoreError, Task, TaskStatus,
};
use crate::ports::{EventSink, Plugin, TaskStore};

/// Result of one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks processed and completed during this drain.
    pub processed: usize,
    pub stop: StopReason,
}

/// The state machine owned by one registered plugin.
///
/// Holds the store, not the dispatcher: the runtime only ever needs
/// `next_task_for` and `update_status`.
pub struct PluginRuntime<P: Payload> {
    name: PluginName,
    plugin: Arc<dyn Plugin<P>>,
    store: Arc<dyn TaskStore<P>>,
    events: Arc<dyn EventSink>,
    completion: CompletionPolicy,
    status: watch::Sender<RuntimeStatus>,
    waiting_for_sync: AtomicBool,
    /// A kick arrived while a drain was active; the drain re-checks the store
    /// once more before going idle.
    rekick: AtomicBool,
}

impl<P: Payload> PluginRuntime<P> {
    pub(crate) fn new(
        plugin: Arc<dyn Plugin<P>>,
        store: Arc<dyn TaskStore<P>>,
        events: Arc<dyn EventSink>,
        completion: CompletionPolicy,
    ) -> Self {
        let (status, _) = watch::channel(RuntimeStatus::Idle);
        Self {
            name: PluginName::from(plugin.name()),
            plugin,
            store,
            events,
            completion,
            status,
            waiting_for_sync: AtomicBool::new(false),
            rekick: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &PluginName {
        &self.name
    }

    pub fn plugin(&self) -> &dyn Plugin<P> {
        self.plugin.as_ref()
    }

    pub fn status(&self) -> RuntimeStatus {
        *self.status.borrow()
    }

    /// Watch the runtime status.
    pub fn subscribe(&self) -> watch::Receiver<RuntimeStatus> {
        self.status.subscribe()
    }

    pub fn is_waiting_for_sync(&self) -> bool {
        self.waiting_for_sync.load(Ordering::Acquire)
    }

    /// Set or clear the sync-preemption flag.
    ///
    /// Setting it stops an active drain at its next step boundary. Clearing
    /// it does not resume anything; call `kick()` afterwards.
    pub fn set_waiting_for_sync(&self, waiting: bool) {
        self.waiting_for_sync.store(waiting, Ordering::Release);
    }

    /// Resolves once the runtime is idle (immediately if it already is).
    pub async fn wait_idle(&self) {
        let mut rx = self.status.subscribe();
        // sender は self が持っているので closed にはならない
        let _ = rx.wait_for(|status| *status == RuntimeStatus::Idle).await;
    }

    /// Start draining if idle and no sync is pending. Returns whether a drain
    /// was started. The drain runs as a spawned tokio task; this never waits.
    ///
    /// Must be called from within a tokio runtime.
    pub fn kick(self: &Arc<Self>) -> bool {
        if self.is_waiting_for_sync() {
            return false;
        }
        if !self.begin_drain() {
            return false;
        }

        let runtime = Arc::clone(self);
        tokio::spawn(async move {
            // 失敗は run_drain 内で DrainAborted として報告済み
            let _ = runtime.run_drain().await;
        });
        true
    }

    /// Run a drain inline and wait for it to stop.
    ///
    /// Unlike `kick()` this does not look at `waiting_for_sync` up front; the
    /// flag is honoured by the first drain step, so a paused runtime returns
    /// immediately with `StopReason::SyncRequested`.
    pub async fn drain(&self) -> Result<DrainReport, DispatchError> {
        if !self.begin_drain() {
            return Ok(DrainReport {
                processed: 0,
                stop: StopReason::AlreadyDraining,
            });
        }
        self.run_drain().await
    }

    /// Idle -> Processing. If a drain is already active, remember the kick
    /// instead.
    fn begin_drain(&self) -> bool {
        self.status.send_if_modified(|status| match status {
            RuntimeStatus::Idle => {
                self.rekick.store(false, Ordering::Release);
                *status = RuntimeStatus::Processing;
                true
            }
            RuntimeStatus::Processing => {
                self.rekick.store(true, Ordering::Release);
                false
            }
        })
    }

    /// Processing -> Idle, unless a kick arrived during the drain. Runs under
    /// the status lock so a concurrent `begin_drain` cannot slip in between.
    fn settle_idle(&self) -> bool {
        self.status.send_if_modified(|status| {
            if self.rekick.swap(false, Ordering::AcqRel) {
                return false;
            }
            *status = RuntimeStatus::Idle;
            true
        })
    }

    /// Processing -> Idle if a sync is pending. The flag is read under the
    /// status lock: a `kick()` issued after the flag is cleared either lands
    /// before this (and the drain carries on) or after it (and finds `Idle`).
    /// Kicks remembered from before the sync are dropped; the sync's own
    /// `kick()` resumes the runtime.
    fn pause_for_sync(&self) -> bool {
        self.status.send_if_modified(|status| {
            if !self.is_waiting_for_sync() {
                return false;
            }
            self.rekick.store(false, Ordering::Release);
            *status = RuntimeStatus::Idle;
            true
        })
    }

    async fn run_drain(&self) -> Result<DrainReport, DispatchError> {
        let mut guard = IdleOnDrop::arm(&self.status);
        self.events.emit(&DispatchEvent::DrainStarted {
            plugin: self.name.clone(),
        });

        let mut processed = 0;
        let stop = loop {
            if self.pause_for_sync() {
                guard.disarm();
                break StopReason::SyncRequested;
            }

            let next = self
                .store
                .next_task_for(&self.name)
                .await
                .map_err(|err| self.abort(err))?;

            let Some(mut task) = next else {
                if self.settle_idle() {
                    guard.disarm();
                    break StopReason::Exhausted;
                }
                continue;
            };

            let outcome = self.invoke(&task).await;
            self.complete(&mut task, outcome)
                .await
                .map_err(|err| self.abort(err))?;
            processed += 1;
        };

        self.events.emit(&DispatchEvent::DrainStopped {
            plugin: self.name.clone(),
            processed,
            reason: stop,
        });
        Ok(DrainReport { processed, stop })
    }

    async fn invoke(&self, task: &Task<P>) -> Result<(), ProcessError> {
        match AssertUnwindSafe(self.plugin.process(task))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(ProcessError::Panicked(panic_message(panic.as_ref()))),
        }
    }

    /// Persist, then mirror in memory.
    async fn complete(
        &self,
        task: &mut Task<P>,
        outcome: Result<(), ProcessError>,
    ) -> Result<TaskStatus, StoreError> {
        let status = match outcome {
            Ok(()) => TaskStatus::Done,
            Err(err) => {
                self.events.emit(&DispatchEvent::ProcessFailed {
                    plugin: self.name.clone(),
                    task_id: task.id(),
                    error: err.to_string(),
                });
                match self.completion {
                    CompletionPolicy::AlwaysDone => TaskStatus::Done,
                    CompletionPolicy::RecordFailure => TaskStatus::Failed,
                }
            }
        };

        self.store.update_status(task, &self.name, status).await?;
        task.set_status(&self.name, status);

        self.events.emit(&DispatchEvent::TaskCompleted {
            plugin: self.name.clone(),
            task_id: task.id(),
            status,
            statuses: task.statuses().clone(),
        });
        Ok(status)
    }

    fn abort(&self, err: StoreError) -> DispatchError {
        self.events.emit(&DispatchEvent::DrainAborted {
            plugin: self.name.clone(),
            error: err.to_string(),
        });
        DispatchError::Store(err)
    }
}

impl<P: Payload> fmt::Debug for PluginRuntime<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRuntime")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("waiting_for_sync", &self.is_waiting_for_sync())
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}

/// Puts the runtime back to idle if a drain exits early (store error, panic
/// in a store call, cancelled future).
struct IdleOnDrop<'a> {
    status: &'a watch::Sender<RuntimeStatus>,
    armed: bool,
}

impl<'a> IdleOnDrop<'a> {
    fn arm(status: &'a watch::Sender<RuntimeStatus>) -> Self {
        Self {
            status,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.status.send_replace(RuntimeStatus::Idle);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
