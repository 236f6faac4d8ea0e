//! EventSink implementations.

use tracing::{debug, error, info, warn};

use crate::domain::{DispatchEvent, StopReason};
use crate::ports::EventSink;

/// Writes every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::TaskEnqueued {
                task_id,
                pending,
                skipped,
            } => {
                debug!(%task_id, pending, skipped, "task enqueued");
            }
            DispatchEvent::DrainStarted { plugin } => {
                debug!(%plugin, "drain started");
            }
            DispatchEvent::TaskCompleted {
                plugin,
                task_id,
                status,
                ..
            } => {
                info!(%plugin, %task_id, %status, "task complete");
            }
            DispatchEvent::ProcessFailed {
                plugin,
                task_id,
                error,
            } => {
                error!(%plugin, %task_id, %error, "process hook failed");
            }
            DispatchEvent::DrainStopped {
                plugin,
                processed,
                reason,
            } => match reason {
                StopReason::SyncRequested => {
                    info!(%plugin, processed, "drain paused for sync");
                }
                _ => debug!(%plugin, processed, ?reason, "drain stopped"),
            },
            DispatchEvent::DrainAborted { plugin, error } => {
                error!(%plugin, %error, "drain aborted by store error");
            }
            DispatchEvent::SyncRequested { plugin } => {
                info!(%plugin, "sync requested");
            }
            DispatchEvent::SyncFinished { plugin, ok } => {
                if *ok {
                    info!(%plugin, "sync finished");
                } else {
                    warn!(%plugin, "sync finished with error");
                }
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &DispatchEvent) {}
}
