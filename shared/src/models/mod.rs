//! Data models
//!
//! Shared between edge-server and dashboards (via API).

pub mod dining_table;
pub mod employee;
pub mod menu;
pub mod role;

// Re-exports
pub use dining_table::*;
pub use employee::*;
pub use menu::*;
pub use role::*;
