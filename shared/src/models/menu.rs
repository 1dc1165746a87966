//! Menu Model
//!
//! Read-only catalog data. Prices are captured into order items when they are
//! ordered, so later menu edits never touch open orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Serving category: which preparation station handles the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    Kitchen,
    Bar,
}

/// Menu item (菜品)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub category: ItemCategory,
    /// Campaign (套餐) components; a non-empty list makes this a campaign item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<CampaignComponent>,
}

impl MenuItem {
    pub fn is_campaign(&self) -> bool {
        !self.components.is_empty()
    }
}

/// One entry of a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignComponent {
    pub menu_item_id: String,
    /// Station override; falls back to the component's own category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ItemCategory>,
}
