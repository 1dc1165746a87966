//! Staff Service - PIN login lookup
//!
//! Staff records are maintained outside this server. They are read from the
//! store at startup and kept in memory; login is a PIN lookup.

use parking_lot::RwLock;
use shared::models::{Staff, StaffIdentity};
use std::collections::HashMap;

use crate::orders::storage::{OrderStore, StorageResult, StoreWrite};

#[derive(Debug, Default)]
pub struct StaffService {
    /// pin -> staff
    by_pin: RwLock<HashMap<String, Staff>>,
}

impl StaffService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(store: &dyn OrderStore) -> StorageResult<Self> {
        let staff = store.load_staff()?;
        tracing::info!(count = staff.len(), "Staff directory loaded");
        let service = Self::new();
        service.cache(staff);
        Ok(service)
    }

    /// Persist and cache staff records (seeding)
    pub fn insert_all(&self, store: &dyn OrderStore, staff: Vec<Staff>) -> StorageResult<()> {
        store.apply(staff.iter().cloned().map(StoreWrite::PutStaff).collect())?;
        self.cache(staff);
        Ok(())
    }

    fn cache(&self, staff: Vec<Staff>) {
        let mut by_pin = self.by_pin.write();
        for member in staff {
            if let Some(previous) = by_pin.get(&member.pin)
                && previous.id != member.id
            {
                tracing::warn!(
                    staff_id = %member.id,
                    shadowed = %previous.id,
                    "Duplicate PIN, later staff record wins"
                );
            }
            by_pin.insert(member.pin.clone(), member);
        }
    }

    /// Identity for a PIN, if any staff member uses it
    pub fn authenticate(&self, pin: &str) -> Option<StaffIdentity> {
        self.by_pin.read().get(pin).map(Staff::identity)
    }

    pub fn len(&self) -> usize {
        self.by_pin.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pin.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::storage::RedbStore;
    use shared::models::Role;

    #[test]
    fn test_pin_login() {
        let store = RedbStore::open_in_memory().unwrap();
        let service = StaffService::new();
        service
            .insert_all(
                &store,
                vec![Staff {
                    id: "k1".to_string(),
                    name: "Chef".to_string(),
                    role: Role::Kitchen,
                    pin: "4321".to_string(),
                }],
            )
            .unwrap();

        let identity = service.authenticate("4321").unwrap();
        assert_eq!(identity.role, Role::Kitchen);
        assert!(service.authenticate("0000").is_none());

        let reloaded = StaffService::load(&store).unwrap();
        assert_eq!(reloaded.authenticate("4321"), Some(identity));
    }
}
