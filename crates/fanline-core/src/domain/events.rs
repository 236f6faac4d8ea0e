//! Events - dispatcher / plugin runtime で発生したイベント
//!
//! `EventSink` に渡される。既定の sink は tracing に流すだけ。

use serde::Serialize;

use super::ids::{PluginName, TaskId};
use super::ledger::StatusLedger;
use super::status::TaskStatus;

/// Why a drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The store had nothing more for this plugin.
    Exhausted,
    /// `waiting_for_sync` was set; stopped at a step boundary.
    SyncRequested,
    /// Another drain was already active; nothing was done.
    AlreadyDraining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    TaskEnqueued {
        task_id: TaskId,
        pending: usize,
        skipped: usize,
    },
    DrainStarted {
        plugin: PluginName,
    },
    /// `statuses` is the drain's copy of the ledger after this plugin's
    /// entry was written.
    TaskCompleted {
        plugin: PluginName,
        task_id: TaskId,
        status: TaskStatus,
        statuses: StatusLedger,
    },
    /// The plugin's `process` hook failed or panicked. The task is still
    /// completed afterwards.
    ProcessFailed {
        plugin: PluginName,
        task_id: TaskId,
        error: String,
    },
    DrainStopped {
        plugin: PluginName,
        processed: usize,
        reason: StopReason,
    },
    /// A store call failed mid-drain; the runtime went back to idle.
    DrainAborted {
        plugin: PluginName,
        error: String,
    },
    SyncRequested {
        plugin: PluginName,
    },
    SyncFinished {
        plugin: PluginName,
        ok: bool,
    },
}

impl DispatchEvent {
    /// Plugin the event belongs to, if any.
    pub fn plugin(&self) -> Option<&PluginName> {
        match self {
            DispatchEvent::TaskEnqueued { .. } => None,
            DispatchEvent::DrainStarted { plugin }
            | DispatchEvent::TaskCompleted { plugin, .. }
            | DispatchEvent::ProcessFailed { plugin, .. }
            | DispatchEvent::DrainStopped { plugin, .. }
            | DispatchEvent::DrainAborted { plugin, .. }
            | DispatchEvent::SyncRequested { plugin }
            | DispatchEvent::SyncFinished { plugin, .. } => Some(plugin),
        }
    }
}
