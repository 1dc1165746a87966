//! Shared types for the table-ordering edge server
//!
//! Domain models, order commands, sync events and snapshots used by both the
//! edge server and the role dashboards.

pub mod message;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use message::{ClientMessage, SyncMessage};
