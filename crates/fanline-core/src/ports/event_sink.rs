//! EventSink port - イベント記録の抽象化
//!
//! 既定は `TracingEventSink`（tracing に構造化ログとして出す）。
//! テストでは記録用の sink に差し替えて検証する。

use crate::domain::DispatchEvent;

/// Receives dispatcher and plugin runtime events.
///
/// Called inline from drain loops; implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DispatchEvent);
}
