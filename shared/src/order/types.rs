//! Shared types for the order lifecycle

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{ItemCategory, StaffIdentity, TableId, TableStatus};

// ============================================================================
// Item Status
// ============================================================================

/// Order item status (菜品状态)
///
/// ```text
/// PENDING --start--> IN_PROGRESS --finish--> READY --serve--> SERVED
///    |                    |
///    +------cancel--------+----------------> CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Ready,
    Served,
    Cancelled,
}

impl ItemStatus {
    /// SERVED and CANCELLED have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Served | ItemStatus::Cancelled)
    }
}

/// Action a staff member performs on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemAction {
    Start,
    Finish,
    Serve,
    Cancel,
}

impl ItemAction {
    pub const ALL: [ItemAction; 4] = [
        ItemAction::Start,
        ItemAction::Finish,
        ItemAction::Serve,
        ItemAction::Cancel,
    ];

    /// Status the item lands in after this action
    pub fn target(&self) -> ItemStatus {
        match self {
            ItemAction::Start => ItemStatus::InProgress,
            ItemAction::Finish => ItemStatus::Ready,
            ItemAction::Serve => ItemStatus::Served,
            ItemAction::Cancel => ItemStatus::Cancelled,
        }
    }

    /// Action that leads into `status`; nothing leads back to PENDING
    pub fn for_target(status: ItemStatus) -> Option<Self> {
        match status {
            ItemStatus::Pending => None,
            ItemStatus::InProgress => Some(ItemAction::Start),
            ItemStatus::Ready => Some(ItemAction::Finish),
            ItemStatus::Served => Some(ItemAction::Serve),
            ItemStatus::Cancelled => Some(ItemAction::Cancel),
        }
    }
}

// ============================================================================
// Order Item
// ============================================================================

/// Requested line when placing or extending an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub menu_item_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl ItemRequest {
    pub fn new(menu_item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            quantity,
        }
    }
}

/// Order item (订单明细)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub menu_item_id: String,
    /// Display name at order time
    pub name: String,
    pub category: ItemCategory,
    pub quantity: u32,
    /// Unit price captured at order time; never changes afterwards
    pub unit_price: Decimal,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Starts at 1, +1 per accepted transition
    pub version: u64,
    pub updated_by: StaffIdentity,
    pub updated_at: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

// ============================================================================
// Order
// ============================================================================

/// Aggregate status derived from the item statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Ready,
    /// Every item SERVED or CANCELLED
    Settleable,
}

/// Active order (订单)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub table_id: TableId,
    pub created_by: StaffIdentity,
    pub items: Vec<OrderItem>,
    pub created_at: i64,
    /// Sum of line totals over non-cancelled items
    pub total: Decimal,
}

impl Order {
    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    pub fn compute_total(&self) -> Decimal {
        self.items
            .iter()
            .filter(|i| i.status != ItemStatus::Cancelled)
            .map(OrderItem::line_total)
            .sum()
    }

    pub fn recompute_total(&mut self) {
        self.total = self.compute_total();
    }

    /// Number of ordered units, cancelled lines excluded
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .filter(|i| i.status != ItemStatus::Cancelled)
            .map(|i| i.quantity)
            .sum()
    }

    pub fn status(&self) -> OrderStatus {
        let any = |s: ItemStatus| self.items.iter().any(|i| i.status == s);
        if any(ItemStatus::Pending) {
            OrderStatus::Pending
        } else if any(ItemStatus::InProgress) {
            OrderStatus::InProgress
        } else if any(ItemStatus::Ready) {
            OrderStatus::Ready
        } else {
            OrderStatus::Settleable
        }
    }

    pub fn is_settleable(&self) -> bool {
        self.items.iter().all(|i| i.status.is_terminal())
    }

    /// Status of the table holding this order
    pub fn table_status(&self) -> TableStatus {
        if self.is_settleable() {
            TableStatus::Served
        } else {
            TableStatus::Pending
        }
    }
}

// ============================================================================
// Payment / Completed Order
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
}

/// Settlement request from the cashier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentInput {
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub discount: Decimal,
}

/// Recorded sale (no charging happens here)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub discount: Decimal,
    /// max(0, amount - discount)
    pub final_amount: Decimal,
    pub paid_at: i64,
}

/// Closed order, handed to reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub order: Order,
    pub closed_by: StaffIdentity,
    pub closed_at: i64,
    pub payment: PaymentRecord,
}

/// Cashier view of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table_id: TableId,
    pub status: TableStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    pub total: Decimal,
    pub item_count: u32,
}
