//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};
use ulid::Ulid;

use crate::app::config::CompletionPolicy;
use crate::app::plugin_runtime::PluginRuntime;
use crate::domain::{
    DispatchEvent, PluginName, ProcessError, StoreError, Task, TaskId, TaskStatus,
};
use crate::ports::{EventSink, Plugin, TaskStore};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonic ids so tests get a stable creation order.
pub(crate) fn next_task_id() -> TaskId {
    TaskId::from_ulid(Ulid::from_parts(NEXT_ID.fetch_add(1, Ordering::Relaxed), 0))
}

pub(crate) fn task(payload: &str) -> Task<String> {
    Task::new(next_task_id(), payload.to_string(), Utc::now())
}

pub(crate) fn task_with(payload: &str, entries: &[(&str, TaskStatus)]) -> Task<String> {
    let mut t = task(payload);
    for (name, status) in entries {
        t.set_status(&PluginName::from(*name), *status);
    }
    t
}

pub(crate) fn runtime_for(
    plugin: Arc<dyn Plugin<String>>,
    store: Arc<dyn TaskStore<String>>,
    events: Arc<dyn EventSink>,
    completion: CompletionPolicy,
) -> Arc<PluginRuntime<String>> {
    Arc::new(PluginRuntime::new(plugin, store, events, completion))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Classifies every payload the same way and records what it processed.
pub(crate) struct RecordingPlugin {
    name: String,
    classification: TaskStatus,
    behavior: Behavior,
    call_log: Option<Arc<Mutex<Vec<String>>>>,
    processed: Mutex<Vec<TaskId>>,
}

impl RecordingPlugin {
    pub(crate) fn new(name: &str, classification: TaskStatus) -> Self {
        Self {
            name: name.to_string(),
            classification,
            behavior: Behavior::Succeed,
            call_log: None,
            processed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn behaving(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Append this plugin's name to `log` on every `classify` call.
    pub(crate) fn with_call_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.call_log = Some(log);
        self
    }

    pub(crate) fn processed(&self) -> Vec<TaskId> {
        self.processed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Plugin<String> for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, _payload: &String) -> TaskStatus {
        if let Some(log) = &self.call_log {
            log.lock().unwrap().push(self.name.clone());
        }
        self.classification
    }

    async fn process(&self, task: &Task<String>) -> Result<(), ProcessError> {
        self.processed.lock().unwrap().push(task.id());
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(ProcessError::Failed(format!("boom on {}", task.payload()))),
            Behavior::Panic => panic!("hook panicked on {}", task.payload()),
        }
    }
}

/// Announces each task as it starts and then blocks until released.
pub(crate) struct GatedPlugin {
    name: String,
    started: mpsc::UnboundedSender<TaskId>,
    gate: Semaphore,
    processed: Mutex<Vec<TaskId>>,
}

impl GatedPlugin {
    pub(crate) fn new(name: &str) -> (Self, mpsc::UnboundedReceiver<TaskId>) {
        let (started, rx) = mpsc::unbounded_channel();
        let plugin = Self {
            name: name.to_string(),
            started,
            gate: Semaphore::new(0),
            processed: Mutex::new(Vec::new()),
        };
        (plugin, rx)
    }

    /// Let `n` more tasks finish.
    pub(crate) fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub(crate) fn processed(&self) -> Vec<TaskId> {
        self.processed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Plugin<String> for GatedPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, _payload: &String) -> TaskStatus {
        TaskStatus::Pending
    }

    async fn process(&self, task: &Task<String>) -> Result<(), ProcessError> {
        let _ = self.started.send(task.id());
        self.gate.acquire().await.unwrap().forget();
        self.processed.lock().unwrap().push(task.id());
        Ok(())
    }
}

/// Store stub: hands out a fixed queue of tasks regardless of plugin and
/// records every write.
#[derive(Default)]
pub(crate) struct ScriptedStore {
    queue: Mutex<VecDeque<Task<String>>>,
    saved: Mutex<Vec<Task<String>>>,
    updates: Mutex<Vec<(TaskId, PluginName, TaskStatus)>>,
    fetches: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_saves: AtomicBool,
}

impl ScriptedStore {
    pub(crate) fn with_tasks(tasks: impl IntoIterator<Item = Task<String>>) -> Self {
        Self {
            queue: Mutex::new(tasks.into_iter().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn saved(&self) -> Vec<Task<String>> {
        self.saved.lock().unwrap().clone()
    }

    pub(crate) fn updates(&self) -> Vec<(TaskId, PluginName, TaskStatus)> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskStore<String> for ScriptedStore {
    async fn next_task_for(&self, _plugin: &PluginName) -> Result<Option<Task<String>>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("fetch failed".to_string()));
        }
        Ok(self.queue.lock().unwrap().pop_front())
    }

    async fn save_task(&self, task: &Task<String>) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("save failed".to_string()));
        }
        self.saved.lock().unwrap().push(task.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        task: &Task<String>,
        plugin: &PluginName,
        status: TaskStatus,
    ) -> Result<(), StoreError> {
        self.updates
            .lock()
            .unwrap()
            .push((task.id(), plugin.clone(), status));
        Ok(())
    }

    async fn prune(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&DispatchEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &DispatchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
