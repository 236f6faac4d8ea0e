//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: 開発用の TaskStore
//! - **TracingEventSink**: 既定の EventSink（tracing へ出力）
//! - **NoopEventSink**: 何もしない EventSink
//!
//! 本番用の durable store は host 側で実装する。

pub mod event_sink;
pub mod inmem_store;

pub use self::event_sink::{NoopEventSink, TracingEventSink};
pub use self::inmem_store::InMemoryTaskStore;
