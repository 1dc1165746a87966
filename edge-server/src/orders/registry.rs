//! Table registry: the live, in-memory order store
//!
//! One slot per table, each behind its own mutex. An active order lives in
//! exactly one slot, so every item mutation takes exactly one lock and
//! independent orders never contend. The `order_id -> table_id` index is only
//! written while holding the slot lock(s) of the tables involved.
//!
//! Lock order: slots in ascending table id. Nothing else is held while a slot
//! lock is being acquired.

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use shared::models::{DiningTable, TableId, TableStatus};
use shared::order::Order;
use std::collections::HashMap;

use super::lifecycle;
use super::manager::{ManagerError, ManagerResult};

#[derive(Debug)]
pub struct TableSlot {
    pub table: DiningTable,
    pub order: Option<Order>,
}

impl TableSlot {
    /// Table record as it should be given the current order
    pub fn derived_table(&self) -> DiningTable {
        let reserved = self.order.is_none() && self.table.status == TableStatus::Reserved;
        DiningTable {
            id: self.table.id,
            status: lifecycle::table_status(self.order.as_ref(), reserved),
            active_order_id: self.order.as_ref().map(|o| o.id.clone()),
        }
    }
}

pub type SlotGuard<'a> = MutexGuard<'a, TableSlot>;

#[derive(Debug)]
pub struct TableRegistry {
    slots: Vec<Mutex<TableSlot>>,
    index: DashMap<String, TableId>,
}

impl TableRegistry {
    /// Tables `1..=count`, all empty
    pub fn new(count: u32) -> Self {
        Self::hydrate(count, Vec::new(), Vec::new())
    }

    /// Rebuild from persisted records
    ///
    /// Table status is recomputed from the orders rather than trusted, so a
    /// crash between writes can never leave a table drifting from its order.
    pub fn hydrate(count: u32, tables: Vec<DiningTable>, orders: Vec<Order>) -> Self {
        let mut tables: HashMap<TableId, DiningTable> =
            tables.into_iter().map(|t| (t.id, t)).collect();
        let mut orders_by_table: HashMap<TableId, Order> = HashMap::new();
        for order in orders {
            if order.table_id == 0 || order.table_id > count {
                tracing::warn!(
                    order_id = %order.id,
                    table_id = order.table_id,
                    "Active order references an unknown table, ignoring"
                );
                continue;
            }
            if let Some(existing) = orders_by_table.get(&order.table_id) {
                tracing::warn!(
                    order_id = %order.id,
                    kept = %existing.id,
                    table_id = order.table_id,
                    "Two active orders on one table, ignoring the later one"
                );
                continue;
            }
            orders_by_table.insert(order.table_id, order);
        }

        let index = DashMap::new();
        let slots = (1..=count)
            .map(|id| {
                let table = tables.remove(&id).unwrap_or_else(|| DiningTable::new(id));
                let order = orders_by_table.remove(&id);
                if let Some(order) = &order {
                    index.insert(order.id.clone(), id);
                }
                let slot = TableSlot { table, order };
                let table = slot.derived_table();
                Mutex::new(TableSlot { table, ..slot })
            })
            .collect();

        Self { slots, index }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn table_ids(&self) -> std::ops::RangeInclusive<TableId> {
        1..=self.slots.len() as TableId
    }

    pub fn contains(&self, table_id: TableId) -> bool {
        table_id >= 1 && (table_id as usize) <= self.slots.len()
    }

    fn slot(&self, table_id: TableId) -> ManagerResult<&Mutex<TableSlot>> {
        table_id
            .checked_sub(1)
            .and_then(|i| self.slots.get(i as usize))
            .ok_or_else(|| ManagerError::InvalidTable(format!("table {} does not exist", table_id)))
    }

    pub fn lock(&self, table_id: TableId) -> ManagerResult<SlotGuard<'_>> {
        Ok(self.slot(table_id)?.lock())
    }

    /// Lock two distinct tables in ascending id order
    ///
    /// Guards are returned in argument order.
    pub fn lock_pair(
        &self,
        first: TableId,
        second: TableId,
    ) -> ManagerResult<(SlotGuard<'_>, SlotGuard<'_>)> {
        if first == second {
            return Err(ManagerError::InvalidOperation(format!(
                "table {} locked twice",
                first
            )));
        }
        let a = self.slot(first)?;
        let b = self.slot(second)?;
        if first < second {
            let ga = a.lock();
            let gb = b.lock();
            Ok((ga, gb))
        } else {
            let gb = b.lock();
            let ga = a.lock();
            Ok((ga, gb))
        }
    }

    /// Lock every slot, ascending
    ///
    /// Blocks all mutations until the guards are dropped.
    pub fn lock_all(&self) -> Vec<SlotGuard<'_>> {
        self.slots.iter().map(|slot| slot.lock()).collect()
    }

    /// Lock the slot currently holding `order_id`
    ///
    /// Retries once per concurrent move; gives up with `OrderNotFound` when the
    /// order was closed or the index is inconsistent.
    pub fn lock_order(&self, order_id: &str) -> ManagerResult<SlotGuard<'_>> {
        let mut table_id = self.locate(order_id)?;
        loop {
            let guard = self.lock(table_id)?;
            if guard.order.as_ref().is_some_and(|o| o.id == order_id) {
                return Ok(guard);
            }
            drop(guard);

            let now = self.locate(order_id)?;
            if now == table_id {
                return Err(ManagerError::OrderNotFound(order_id.to_string()));
            }
            table_id = now;
        }
    }

    fn locate(&self, order_id: &str) -> ManagerResult<TableId> {
        self.index
            .get(order_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Must be called while holding the slot lock of `table_id`
    pub fn index_order(&self, order_id: &str, table_id: TableId) {
        self.index.insert(order_id.to_string(), table_id);
    }

    /// Must be called while holding the slot lock the order was in
    pub fn unindex_order(&self, order_id: &str) {
        self.index.remove(order_id);
    }

    pub fn active_order_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{Role, StaffIdentity};

    fn order(id: &str, table_id: TableId) -> Order {
        Order {
            id: id.to_string(),
            table_id,
            created_by: StaffIdentity::new("w1", "Ana", Role::Waiter),
            items: Vec::new(),
            created_at: 0,
            total: Decimal::ZERO,
        }
    }

    #[test]
    fn test_unknown_table_is_invalid() {
        let registry = TableRegistry::new(3);
        assert!(registry.lock(1).is_ok());
        assert!(registry.lock(3).is_ok());
        assert!(matches!(registry.lock(0), Err(ManagerError::InvalidTable(_))));
        assert!(matches!(registry.lock(4), Err(ManagerError::InvalidTable(_))));
    }

    #[test]
    fn test_hydrate_recomputes_table_status() {
        let stale = DiningTable {
            id: 2,
            status: TableStatus::Empty,
            active_order_id: None,
        };
        let orphan = DiningTable {
            id: 3,
            status: TableStatus::Served,
            active_order_id: Some("gone".to_string()),
        };
        let registry = TableRegistry::hydrate(4, vec![stale, orphan], vec![order("o1", 2)]);

        let slot = registry.lock(2).unwrap();
        // no items: every item terminal
        assert_eq!(slot.table.status, TableStatus::Served);
        assert_eq!(slot.table.active_order_id.as_deref(), Some("o1"));
        drop(slot);

        let slot = registry.lock(3).unwrap();
        assert_eq!(slot.table.status, TableStatus::Empty);
        assert!(slot.table.active_order_id.is_none());
        drop(slot);

        assert_eq!(registry.lock_order("o1").unwrap().table.id, 2);
    }

    #[test]
    fn test_lock_order_follows_a_move() {
        let registry = TableRegistry::hydrate(4, Vec::new(), vec![order("o1", 1)]);
        {
            let (mut from, mut to) = registry.lock_pair(1, 4).unwrap();
            let mut moved = from.order.take().unwrap();
            moved.table_id = 4;
            to.order = Some(moved);
            registry.index_order("o1", 4);
        }
        assert_eq!(registry.lock_order("o1").unwrap().table.id, 4);
    }

    #[test]
    fn test_lock_all_is_ascending() {
        let registry = TableRegistry::new(3);
        let ids: Vec<TableId> = registry.lock_all().iter().map(|s| s.table.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(registry.contains(3));
        assert!(!registry.contains(0));
        assert!(!registry.contains(4));
    }

    #[test]
    fn test_lock_pair_rejects_same_table() {
        let registry = TableRegistry::new(2);
        assert!(registry.lock_pair(2, 2).is_err());
        let (a, b) = registry.lock_pair(2, 1).unwrap();
        assert_eq!(a.table.id, 2);
        assert_eq!(b.table.id, 1);
    }
}
