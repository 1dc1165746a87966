//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Table number, 1..=N
pub type TableId = u32;

/// Table status (桌台状态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    /// No active order
    #[default]
    Empty,
    /// Active order with at least one item still being prepared or delivered
    Pending,
    /// Every item served or cancelled, waiting for payment
    Served,
    /// Held for a guest, no active order
    Reserved,
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: TableId,
    pub status: TableStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_order_id: Option<String>,
}

impl DiningTable {
    pub fn new(id: TableId) -> Self {
        Self {
            id,
            status: TableStatus::Empty,
            active_order_id: None,
        }
    }

    /// Free for a new order
    pub fn is_empty(&self) -> bool {
        self.status == TableStatus::Empty && self.active_order_id.is_none()
    }
}
