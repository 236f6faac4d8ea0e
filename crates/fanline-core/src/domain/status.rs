//! Status values: one plugin's relationship to one task, and a plugin
//! runtime's own idle/processing state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A plugin's status for a single task (one ledger entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Relevant to the plugin, not yet handed out.
    Pending,
    /// Handed out to the plugin's drain.
    Processing,
    Done,
    Failed,
    /// The plugin's classifier said the task is not relevant.
    Skipped,
    /// Marked for removal by a host store.
    Prune,
}

impl TaskStatus {
    /// Still owed work: a store must not prune a task with an active entry.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Processing)
    }

    pub fn is_settled(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Prune => "prune",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a plugin runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeStatus {
    #[default]
    Idle,
    /// A drain is active.
    Processing,
}
