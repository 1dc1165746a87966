//! Full dashboard state, sent first on every (re)connect

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{Order, OrderItem};
use crate::models::{DiningTable, Role, TableId};

/// One table with its active order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub table: DiningTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

/// Role-filtered state of every table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Changes when the server restarts
    pub server_epoch: String,
    pub role: Role,
    pub generated_at: i64,
    /// Last bus sequence reflected here; later events apply on top
    pub sequence: u64,
    pub tables: BTreeMap<TableId, TableView>,
}

impl DashboardSnapshot {
    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.tables
            .values()
            .filter_map(|view| view.order.as_ref())
            .find(|order| order.id == order_id)
    }

    pub fn item(&self, order_id: &str, item_id: &str) -> Option<&OrderItem> {
        self.order(order_id).and_then(|order| order.item(item_id))
    }

    pub fn active_orders(&self) -> impl Iterator<Item = &Order> {
        self.tables.values().filter_map(|view| view.order.as_ref())
    }
}
