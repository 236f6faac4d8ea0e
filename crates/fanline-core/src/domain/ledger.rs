//! Status ledger: plugin name -> that plugin's status for one task.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::PluginName;
use super::status::TaskStatus;

/// Per-task ledger.
///
/// Each key is written only by the plugin it names (after seeding), so a
/// ledger never needs to be shared between plugin drains: every drain works
/// on its own copy of the task and the store keeps the durable one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusLedger {
    entries: BTreeMap<PluginName, TaskStatus>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, plugin: &str) -> Option<TaskStatus> {
        self.entries.get(plugin).copied()
    }

    /// Overwrite one entry.
    pub fn set(&mut self, plugin: &PluginName, status: TaskStatus) {
        self.entries.insert(plugin.clone(), status);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PluginName, TaskStatus)> {
        self.entries.iter().map(|(name, status)| (name, *status))
    }

    /// Number of entries currently in `status`.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.entries.values().filter(|s| **s == status).count()
    }

    /// No plugin still owes work on the task (the prune precondition).
    pub fn is_settled(&self) -> bool {
        self.entries.values().all(TaskStatus::is_settled)
    }
}

impl FromIterator<(PluginName, TaskStatus)> for StatusLedger {
    fn from_iter<I: IntoIterator<Item = (PluginName, TaskStatus)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(entries: &[(&str, TaskStatus)]) -> StatusLedger {
        entries
            .iter()
            .map(|(name, status)| (PluginName::from(*name), *status))
            .collect()
    }

    #[test]
    fn set_overwrites_only_the_named_entry() {
        let mut l = ledger(&[("audit", TaskStatus::Pending), ("search", TaskStatus::Pending)]);

        l.set(&PluginName::from("audit"), TaskStatus::Done);

        assert_eq!(l.get("audit"), Some(TaskStatus::Done));
        assert_eq!(l.get("search"), Some(TaskStatus::Pending));
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn settled_requires_every_entry_settled() {
        let mut l = ledger(&[("audit", TaskStatus::Done), ("search", TaskStatus::Processing)]);
        assert!(!l.is_settled());

        l.set(&PluginName::from("search"), TaskStatus::Skipped);
        assert!(l.is_settled());
        assert_eq!(l.count(TaskStatus::Done), 1);
    }

    #[test]
    fn empty_ledger_is_settled() {
        assert!(StatusLedger::new().is_settled());
    }
}
