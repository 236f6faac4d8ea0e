//! Task: an immutable payload plus its per-plugin status ledger.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PluginName, TaskId};
use super::ledger::StatusLedger;
use super::status::TaskStatus;
use crate::ports::Plugin;

/// Bounds every host payload must satisfy.
///
/// Payloads cross task boundaries (drains are spawned) and are cloned when a
/// store hands a task out, hence `Clone + Send + Sync + 'static`.
pub trait Payload: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// One unit of work derived from an external event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task<P> {
    id: TaskId,
    created_at: DateTime<Utc>,
    payload: P,
    statuses: StatusLedger,
}

impl<P> Task<P> {
    /// A fresh task with an empty ledger. Call `initialize_statuses` before
    /// handing it to a store.
    pub fn new(id: TaskId, payload: P, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            payload,
            statuses: StatusLedger::new(),
        }
    }

    /// Rehydrate a task from durable storage; classification is skipped.
    pub fn with_statuses(
        id: TaskId,
        payload: P,
        created_at: DateTime<Utc>,
        statuses: StatusLedger,
    ) -> Self {
        Self {
            id,
            created_at,
            payload,
            statuses,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn statuses(&self) -> &StatusLedger {
        &self.statuses
    }

    pub fn status_for(&self, plugin: &str) -> Option<TaskStatus> {
        self.statuses.get(plugin)
    }

    /// Seed the ledger: one entry per plugin, in the order given, valued by
    /// that plugin's classifier.
    pub fn initialize_statuses<'a, I>(&mut self, plugins: I)
    where
        I: IntoIterator<Item = &'a dyn Plugin<P>>,
        P: Payload,
    {
        for plugin in plugins {
            let status = plugin.classify(&self.payload);
            self.statuses.set(&PluginName::from(plugin.name()), status);
        }
    }

    pub fn set_status(&mut self, plugin: &PluginName, status: TaskStatus) {
        self.statuses.set(plugin, status);
    }
}
