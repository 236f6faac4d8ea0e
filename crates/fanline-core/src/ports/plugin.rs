//! Plugin port - 各 plugin が実装する capability
//!
//! `classify` で関連するかを判定し、`process` で実際の仕事をする。

use async_trait::async_trait;

use crate::domain::{Payload, ProcessError, Task, TaskStatus};

/// An independently paced consumer of tasks.
#[async_trait]
pub trait Plugin<P: Payload>: Send + Sync {
    /// Unique name; the key of this plugin's ledger entry.
    fn name(&self) -> &str;

    /// Initial ledger status for a fresh payload, typically `Pending` if the
    /// task is relevant and `Skipped` otherwise. Called synchronously during
    /// `enqueue`, so keep it cheap.
    fn classify(&self, payload: &P) -> TaskStatus;

    /// Perform the plugin's work. A returned error (or a panic) is reported
    /// and the task is completed anyway.
    async fn process(&self, task: &Task<P>) -> Result<(), ProcessError>;
}
