//! InMemoryTaskStore - 開発用・テスト用の TaskStore
//!
//! # 実装詳細
//! - BTreeMap<TaskId, Task> で保持（ULID 順 = 作成順）
//! - next_task_for は最古の pending を processing にしてから返す
//!   （同じ plugin に同じ task を二度渡さない）
//! - prune は settled な task だけを消す

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Payload, PluginName, StoreError, Task, TaskId, TaskStatus};
use crate::ports::TaskStore;

pub struct InMemoryTaskStore<P> {
    tasks: Mutex<BTreeMap<TaskId, Task<P>>>,
}

impl<P: Payload> InMemoryTaskStore<P> {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Snapshot of a stored task.
    pub async fn get(&self, task_id: TaskId) -> Option<Task<P>> {
        self.tasks.lock().await.get(&task_id).cloned()
    }

    /// Snapshot of every stored task, oldest first.
    pub async fn all(&self) -> Vec<Task<P>> {
        self.tasks.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

impl<P: Payload> Default for InMemoryTaskStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Payload> TaskStore<P> for InMemoryTaskStore<P> {
    async fn next_task_for(&self, plugin: &PluginName) -> Result<Option<Task<P>>, StoreError> {
        let mut tasks = self.tasks.lock().await;
        let next = tasks
            .values_mut()
            .find(|task| task.status_for(plugin.as_str()) == Some(TaskStatus::Pending));

        Ok(next.map(|task| {
            task.set_status(plugin, TaskStatus::Processing);
            task.clone()
        }))
    }

    async fn save_task(&self, task: &Task<P>) -> Result<(), StoreError> {
        self.tasks.lock().await.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        task: &Task<P>,
        plugin: &PluginName,
        status: TaskStatus,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().await;
        let stored = tasks
            .get_mut(&task.id())
            .ok_or(StoreError::TaskNotFound(task.id()))?;
        stored.set_status(plugin, status);
        Ok(())
    }

    async fn prune(&self) -> Result<usize, StoreError> {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|_, task| !task.statuses().is_settled());
        Ok(before - tasks.len())
    }
}
