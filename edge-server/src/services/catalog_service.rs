//! Catalog Service - read-only menu lookup with in-memory caching
//!
//! The order core only asks for one menu item at a time, when items are
//! placed. Menu maintenance is outside this server; the cache is filled from
//! the store at startup (and by seeding).

use parking_lot::RwLock;
use shared::models::MenuItem;
use std::collections::HashMap;

use crate::orders::storage::{OrderStore, StorageResult, StoreWrite};

/// Menu lookup used when pricing new order items
pub trait Catalog: Send + Sync {
    fn get_menu_item(&self, id: &str) -> Option<MenuItem>;
}

#[derive(Debug, Default)]
pub struct CatalogService {
    items: RwLock<HashMap<String, MenuItem>>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = MenuItem>) -> Self {
        let service = Self::new();
        {
            let mut cache = service.items.write();
            for item in items {
                cache.insert(item.id.clone(), item);
            }
        }
        service
    }

    /// Warm the cache from the store
    pub fn load(store: &dyn OrderStore) -> StorageResult<Self> {
        let items = store.load_menu()?;
        tracing::info!(count = items.len(), "Menu catalog loaded");
        Ok(Self::from_items(items))
    }

    /// Persist and cache menu items (seeding)
    pub fn insert_all(&self, store: &dyn OrderStore, items: Vec<MenuItem>) -> StorageResult<()> {
        store.apply(items.iter().cloned().map(StoreWrite::PutMenuItem).collect())?;
        let mut cache = self.items.write();
        for item in items {
            cache.insert(item.id.clone(), item);
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self.items.read().values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Catalog for CatalogService {
    fn get_menu_item(&self, id: &str) -> Option<MenuItem> {
        self.items.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::storage::RedbStore;
    use rust_decimal::Decimal;
    use shared::models::ItemCategory;

    fn menu_item(id: &str, name: &str) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            price: Decimal::new(350, 2),
            category: ItemCategory::Bar,
            components: Vec::new(),
        }
    }

    #[test]
    fn test_insert_persists_and_caches() {
        let store = RedbStore::open_in_memory().unwrap();
        let catalog = CatalogService::new();
        catalog
            .insert_all(&store, vec![menu_item("tea", "Tea"), menu_item("ale", "Ale")])
            .unwrap();

        assert_eq!(catalog.get_menu_item("tea").unwrap().name, "Tea");
        assert!(catalog.get_menu_item("coffee").is_none());

        let reloaded = CatalogService::load(&store).unwrap();
        let names: Vec<String> = reloaded.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Ale", "Tea"]);
    }
}
