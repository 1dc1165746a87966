//! Order Lifecycle Module
//!
//! Types shared by the edge server and dashboards:
//! - Commands: requests from dashboards to mutate orders
//! - Events: accepted mutations, fanned out in real time
//! - Snapshots: full role-filtered state sent on (re)connect
//! - Replica: dashboard-side state rebuilt from snapshot + events

pub mod command;
pub mod event;
pub mod replica;
pub mod snapshot;
pub mod types;

// Re-exports
pub use command::{
    CommandError, CommandErrorCode, CommandRequest, CommandResponse, CommandResult, OrderCommand,
    OrderCommandPayload,
};
pub use event::{EventPayload, SyncEvent};
pub use replica::{ApplyOutcome, DashboardReplica};
pub use snapshot::{DashboardSnapshot, TableView};
pub use types::*;
