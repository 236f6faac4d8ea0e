//! TaskStore port - host が実装する durable store
//!
//! core は選択・永続化・prune のポリシーを一切持たない。すべてここに委譲する。

use async_trait::async_trait;

use crate::domain::{Payload, PluginName, StoreError, Task, TaskStatus};

/// Durable task store supplied by the host.
///
/// # Contract
/// - `next_task_for` hands each unit of work to at most one caller per plugin.
/// - `save_task` / `update_status` are durable before they return.
/// - `prune` never removes a task whose ledger still has a `pending` or
///   `processing` entry.
///
/// Errors are not caught by the core; they end the `enqueue` or drain step
/// that triggered them.
#[async_trait]
pub trait TaskStore<P: Payload>: Send + Sync {
    /// Next task this plugin should process, or `None` if its backlog is empty.
    async fn next_task_for(&self, plugin: &PluginName) -> Result<Option<Task<P>>, StoreError>;

    /// Persist a newly created task together with its seeded ledger.
    async fn save_task(&self, task: &Task<P>) -> Result<(), StoreError>;

    /// Persist one ledger update.
    async fn update_status(
        &self,
        task: &Task<P>,
        plugin: &PluginName,
        status: TaskStatus,
    ) -> Result<(), StoreError>;

    /// Remove settled tasks. Returns how many were removed.
    async fn prune(&self) -> Result<usize, StoreError>;
}
