//! State-change events fanned out to dashboards

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{ItemStatus, Order, OrderItem};
use crate::models::{ItemCategory, StaffIdentity, TableId, TableStatus};

/// One accepted mutation, as delivered to a subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Bus-wide publish order; diagnostic only, items are ordered by version
    pub sequence: u64,
    pub timestamp: i64,
    pub operator: StaffIdentity,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderCreated {
        order: Order,
    },
    ItemsAdded {
        order_id: String,
        table_id: TableId,
        items: Vec<OrderItem>,
        total: Decimal,
    },
    ItemStatusChanged {
        order_id: String,
        table_id: TableId,
        item_id: String,
        category: ItemCategory,
        status: ItemStatus,
        version: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cancel_reason: Option<String>,
        updated_at: i64,
        total: Decimal,
    },
    TableStatusChanged {
        table_id: TableId,
        status: TableStatus,
    },
    OrderCompleted {
        order_id: String,
        table_id: TableId,
        final_amount: Decimal,
    },
    OrderTransferred {
        order_id: String,
        from_table_id: TableId,
        to_table_id: TableId,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::OrderCreated { .. } => "ORDER_CREATED",
            EventPayload::ItemsAdded { .. } => "ITEMS_ADDED",
            EventPayload::ItemStatusChanged { .. } => "ITEM_STATUS_CHANGED",
            EventPayload::TableStatusChanged { .. } => "TABLE_STATUS_CHANGED",
            EventPayload::OrderCompleted { .. } => "ORDER_COMPLETED",
            EventPayload::OrderTransferred { .. } => "ORDER_TRANSFERRED",
        }
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            EventPayload::OrderCreated { order } => Some(&order.id),
            EventPayload::ItemsAdded { order_id, .. }
            | EventPayload::ItemStatusChanged { order_id, .. }
            | EventPayload::OrderCompleted { order_id, .. }
            | EventPayload::OrderTransferred { order_id, .. } => Some(order_id),
            EventPayload::TableStatusChanged { .. } => None,
        }
    }
}
