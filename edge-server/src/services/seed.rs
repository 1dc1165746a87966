//! Seed data for a fresh store
//!
//! JSON file with the menu and staff list, applied only when the store has
//! no menu yet.

use serde::Deserialize;
use shared::models::{MenuItem, Staff};
use std::path::Path;

use super::{CatalogService, StaffService};
use crate::orders::OrderStore;

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    #[serde(default)]
    pub staff: Vec<Staff>,
}

impl SeedData {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read seed file {}: {}", path.display(), e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load into an empty store; a store that already has a menu is left alone
    pub fn apply_if_empty(
        self,
        store: &dyn OrderStore,
        catalog: &CatalogService,
        staff: &StaffService,
    ) -> anyhow::Result<bool> {
        if !catalog.is_empty() {
            return Ok(false);
        }
        let (menu_count, staff_count) = (self.menu.len(), self.staff.len());
        catalog.insert_all(store, self.menu)?;
        staff.insert_all(store, self.staff)?;
        tracing::info!(menu = menu_count, staff = staff_count, "Store seeded");
        Ok(true)
    }
}
