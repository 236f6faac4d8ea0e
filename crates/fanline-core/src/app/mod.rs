//! App - アプリケーション層
//!
//! ports を組み合わせて dispatch のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **DispatcherBuilder**: Dispatcher の構築とワイヤリング
//! - **Dispatcher**: plugin registry と enqueue（fan-out）
//! - **PluginRuntime**: plugin ごとの drain ループ（Idle / Processing）
//! - **SyncCoordinator**: drain を止めて sync 処理を走らせる

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod plugin_runtime;
pub mod sync;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::config::{CompletionPolicy, ConfigError, DispatcherConfig, SyncConfig};
pub use self::dispatcher::Dispatcher;
pub use self::plugin_runtime::{DrainReport, PluginRuntime};
pub use self::sync::SyncCoordinator;
