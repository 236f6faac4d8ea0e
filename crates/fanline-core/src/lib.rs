//! fanline-core
//!
//! Fan-out task dispatcher: one event becomes one task, every registered
//! plugin gets its own status entry on it and drains its own backlog
//! independently.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, ledger, task, events, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Plugin, EventSink, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, dispatcher, plugin_runtime, sync, config）
//! - **impls**: 実装（InMemoryTaskStore, TracingEventSink など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
mod testing;

pub use app::{
    BuildError, CompletionPolicy, Dispatcher, DispatcherBuilder, DispatcherConfig, DrainReport,
    PluginRuntime, SyncCoordinator,
};
pub use domain::{
    DispatchError, DispatchEvent, Payload, PluginName, ProcessError, RuntimeStatus, StoreError,
    Task, TaskId, TaskStatus,
};
pub use ports::{Plugin, TaskStore};
