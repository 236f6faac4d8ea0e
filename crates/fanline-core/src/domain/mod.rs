//! Domain model (ids, statuses, ledger, task, events, errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod ledger;
pub mod status;
pub mod task;

pub use errors::{BoxError, DispatchError, ProcessError, StoreError};
pub use events::{DispatchEvent, StopReason};
pub use ids::{PluginName, TaskId};
pub use ledger::StatusLedger;
pub use status::{RuntimeStatus, TaskStatus};
pub use task::{Payload, Task};
