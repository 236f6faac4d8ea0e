//! Ports - 抽象化レイヤー
//!
//! host が差し込む外部協調者のインターフェース。
//! - TaskStore: durable store（正本）
//! - Plugin: 分類と処理
//! - EventSink: ログ / 観測
//! - Clock, IdGenerator: 時刻と ID

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod plugin;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::plugin::Plugin;
pub use self::task_store::TaskStore;
