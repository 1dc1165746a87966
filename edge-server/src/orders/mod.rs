//! Order lifecycle core for the edge server
//!
//! - **manager**: OrdersManager, validates and applies every mutation
//! - **registry**: per-table slots holding the live orders
//! - **lifecycle**: item state machine and table status derivation
//! - **guard**: optimistic version check on items
//! - **role_filter**: who may do what, and who sees what
//! - **storage**: redb-backed durable store
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager → slot lock → Storage (redb)
//!                                ↓
//!                         commit to memory
//!                                ↓
//!                        SyncBus (per role)
//!                                ↓
//!                        Dashboard replicas
//! ```

pub mod guard;
pub mod lifecycle;
pub mod manager;
pub mod registry;
pub mod role_filter;
pub mod storage;

// Re-exports
pub use manager::{ManagerConfig, ManagerError, ManagerResult, OrdersManager};
pub use role_filter::RolePolicy;
pub use storage::{OrderStore, RedbStore, StorageError};

// Re-export shared types for convenience
pub use shared::order::{
    CommandError, CommandErrorCode, CommandResponse, EventPayload, OrderCommand,
    OrderCommandPayload, SyncEvent,
};
