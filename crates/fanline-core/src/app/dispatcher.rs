//! Dispatcher - event を Task に変換して全 plugin に fan-out する
//!
//! # フロー（enqueue）
//! 1. registry のスナップショットを取る（lock は await をまたがない）
//! 2. Task を作り、登録順に各 plugin の classify() で ledger を初期化
//! 3. TaskStore::save_task() で永続化（失敗したら kick しない）
//! 4. 全 plugin を kick（fire-and-forget、drain の完了は待たない）

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::DispatcherConfig;
use super::plugin_runtime::PluginRuntime;
use super::sync::SyncCoordinator;
use crate::domain::{
    BoxError, DispatchError, DispatchEvent, Payload, PluginName, Task, TaskId, TaskStatus,
};
use crate::ports::{Clock, EventSink, IdGenerator, Plugin, TaskStore};

pub struct Dispatcher<P: Payload> {
    store: Arc<dyn TaskStore<P>>,
    plugins: RwLock<Vec<Arc<PluginRuntime<P>>>>,
    events: Arc<dyn EventSink>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
    sync: SyncCoordinator,
}

impl<P: Payload> Dispatcher<P> {
    /// Usually built through `DispatcherBuilder`.
    pub fn new(
        store: Arc<dyn TaskStore<P>>,
        events: Arc<dyn EventSink>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        let sync = SyncCoordinator::new(config.sync.clone(), Arc::clone(&events));
        Self {
            store,
            plugins: RwLock::new(Vec::new()),
            events,
            ids,
            clock,
            config,
            sync,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub async fn register_plugin(
        &self,
        plugin: impl Plugin<P> + 'static,
    ) -> Result<Arc<PluginRuntime<P>>, DispatchError> {
        self.register_shared(Arc::new(plugin)).await
    }

    /// Append a plugin to the registry. Registration order is the order in
    /// which classifiers seed new tasks; it is not a priority.
    pub async fn register_shared(
        &self,
        plugin: Arc<dyn Plugin<P>>,
    ) -> Result<Arc<PluginRuntime<P>>, DispatchError> {
        let mut plugins = self.plugins.write().await;
        if plugins.iter().any(|rt| rt.name().as_str() == plugin.name()) {
            return Err(DispatchError::DuplicatePlugin(PluginName::from(
                plugin.name(),
            )));
        }

        let runtime = Arc::new(PluginRuntime::new(
            plugin,
            Arc::clone(&self.store),
            Arc::clone(&self.events),
            self.config.completion,
        ));
        plugins.push(Arc::clone(&runtime));
        Ok(runtime)
    }

    /// Turn `payload` into a task, persist it and wake every plugin.
    ///
    /// Plugins registered after this call get no entry on the task. If the
    /// store rejects the task nothing is kicked.
    pub async fn enqueue(&self, payload: P) -> Result<TaskId, DispatchError> {
        let plugins = self.snapshot().await;

        let mut task = Task::new(self.ids.generate_task_id(), payload, self.clock.now());
        task.initialize_statuses(plugins.iter().map(|rt| rt.plugin()));

        self.store.save_task(&task).await?;

        let statuses = task.statuses();
        self.events.emit(&DispatchEvent::TaskEnqueued {
            task_id: task.id(),
            pending: statuses.count(TaskStatus::Pending),
            skipped: statuses.count(TaskStatus::Skipped),
        });

        for runtime in &plugins {
            runtime.kick();
        }
        Ok(task.id())
    }

    /// Kick every registered plugin. Returns how many drains were started.
    ///
    /// Used after a restart when the store already holds a backlog.
    pub async fn resume(&self) -> usize {
        self.snapshot()
            .await
            .iter()
            .filter(|rt| rt.kick())
            .count()
    }

    /// Remove settled tasks from the store.
    pub async fn prune(&self) -> Result<usize, DispatchError> {
        Ok(self.store.prune().await?)
    }

    pub async fn plugin(&self, name: &str) -> Option<Arc<PluginRuntime<P>>> {
        self.plugins
            .read()
            .await
            .iter()
            .find(|rt| rt.name().as_str() == name)
            .cloned()
    }

    /// Registered plugin names, in registration order.
    pub async fn plugin_names(&self) -> Vec<PluginName> {
        self.plugins
            .read()
            .await
            .iter()
            .map(|rt| rt.name().clone())
            .collect()
    }

    /// Wait until every registered runtime is idle.
    pub async fn wait_idle(&self) {
        for runtime in self.snapshot().await {
            runtime.wait_idle().await;
        }
    }

    /// Run `op` while the named plugin is paused. See `SyncCoordinator::run`.
    pub async fn sync<F, Fut, T>(&self, name: &str, op: F) -> Result<T, DispatchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let runtime = self
            .plugin(name)
            .await
            .ok_or_else(|| DispatchError::PluginNotFound(PluginName::from(name)))?;
        self.sync.run(&runtime, op).await
    }

    async fn snapshot(&self) -> Vec<Arc<PluginRuntime<P>>> {
        self.plugins.read().await.clone()
    }
}
