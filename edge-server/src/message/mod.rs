//! 实时同步层
//!
//! - [`SyncBus`] - 事件扇出（按角色过滤，有界队列）
//! - [`Subscription`] - 单个看板连接的事件流（快照 → 增量）

pub mod bus;
pub mod subscription;

pub use bus::{DEFAULT_QUEUE_CAPACITY, SyncBus};
pub use subscription::Subscription;
pub use shared::message::{ClientMessage, SyncMessage};
