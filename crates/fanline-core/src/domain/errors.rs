//! Errors - エラー型
//!
//! - `StoreError`: store collaborator の失敗。core は catch しない（呼び出し元に伝播）
//! - `ProcessError`: plugin の `process` hook の失敗。core が catch して記録するだけ
//! - `DispatchError`: dispatcher / runtime / sync の操作エラー

use std::time::Duration;

use thiserror::Error;

use super::ids::{PluginName, TaskId};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Other(#[from] BoxError),
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{0}")]
    Failed(String),

    #[error("process hook panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] BoxError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("duplicate plugin name={0}")]
    DuplicatePlugin(PluginName),

    #[error("plugin not found name={0}")]
    PluginNotFound(PluginName),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("plugin={plugin} did not become idle within {waited:?}")]
    SyncTimeout { plugin: PluginName, waited: Duration },

    #[error("sync failed for plugin={plugin}: {source}")]
    Sync {
        plugin: PluginName,
        #[source]
        source: BoxError,
    },
}
