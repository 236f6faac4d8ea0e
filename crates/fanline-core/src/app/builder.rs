//! DispatcherBuilder - Dispatcher の構築とワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - expect_plugins() で期待される plugin 名を登録
//! - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError::MissingPlugins を返す

use std::sync::Arc;

use super::config::DispatcherConfig;
use super::dispatcher::Dispatcher;
use crate::domain::{DispatchError, Payload};
use crate::impls::TracingEventSink;
use crate::ports::{Clock, EventSink, IdGenerator, Plugin, SystemClock, TaskStore, UlidGenerator};

/// Builds a `Dispatcher`.
///
/// # 使用例
/// ```ignore
/// let dispatcher = DispatcherBuilder::new(Arc::new(InMemoryTaskStore::new()))
///     .config(DispatcherConfig::from_json_file("fanline.json")?)
///     .register(AuditPlugin)
///     .register(SearchIndexPlugin::new())
///     .expect_plugins(&["audit", "search-index"])
///     .build()
///     .await?;
/// ```
pub struct DispatcherBuilder<P: Payload> {
    store: Arc<dyn TaskStore<P>>,
    config: DispatcherConfig,
    events: Option<Arc<dyn EventSink>>,
    ids: Option<Arc<dyn IdGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    plugins: Vec<Arc<dyn Plugin<P>>>,
    expected_plugins: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing plugins: {0:?}. These plugins were expected but not registered.")]
    MissingPlugins(Vec<String>),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl<P: Payload> DispatcherBuilder<P> {
    pub fn new(store: Arc<dyn TaskStore<P>>) -> Self {
        Self {
            store,
            config: DispatcherConfig::default_v1(),
            events: None,
            ids: None,
            clock: None,
            plugins: Vec::new(),
            expected_plugins: None,
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// 既定は TracingEventSink
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Plugin を登録（登録順 = seeding 順）
    pub fn register(self, plugin: impl Plugin<P> + 'static) -> Self {
        self.register_shared(Arc::new(plugin))
    }

    pub fn register_shared(mut self, plugin: Arc<dyn Plugin<P>>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn expect_plugins(mut self, names: &[&str]) -> Self {
        self.expected_plugins = Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    /// # 検証
    /// - expect_plugins() の名前が全て登録されているか
    /// - plugin 名の重複（DispatchError::DuplicatePlugin）
    pub async fn build(self) -> Result<Dispatcher<P>, BuildError> {
        if let Some(expected) = &self.expected_plugins {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !self.plugins.iter().any(|p| p.name() == name.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingPlugins(missing));
            }
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        let events = self
            .events
            .unwrap_or_else(|| Arc::new(TracingEventSink));

        let dispatcher = Dispatcher::new(self.store, events, ids, clock, self.config);
        for plugin in self.plugins {
            dispatcher.register_shared(plugin).await?;
        }
        Ok(dispatcher)
    }
}
