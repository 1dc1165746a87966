//! redb-based persistence for the order core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `active_orders` | `order_id` | `Order` | Open orders |
//! | `completed_orders` | `order_id` | `CompletedOrder` | Closed orders (reporting) |
//! | `dining_tables` | `table_id` | `DiningTable` | Table status + active order pointer |
//! | `menu_items` | `menu_item_id` | `MenuItem` | Catalog |
//! | `staff` | `staff_id` | `Staff` | PIN login directory |
//!
//! Values are JSON-serialized. Every mutation of the order core is written
//! through [`OrderStore::apply`] as one write transaction, so multi-record
//! changes (transfer, close) are all-or-nothing.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use shared::models::{DiningTable, MenuItem, Staff};
use shared::order::{CompletedOrder, Order};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("active_orders");

const COMPLETED_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("completed_orders");

const TABLES_TABLE: TableDefinition<u32, &[u8]> = TableDefinition::new("dining_tables");

const MENU_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menu_items");

const STAFF_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("staff");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One record change inside an atomic [`OrderStore::apply`]
#[derive(Debug, Clone)]
pub enum StoreWrite {
    PutOrder(Order),
    RemoveOrder(String),
    PutCompleted(CompletedOrder),
    PutTable(DiningTable),
    PutMenuItem(MenuItem),
    PutStaff(Staff),
}

/// Durable store consumed by the order core
///
/// A failed call is fatal for the mutation that issued it; callers must not
/// touch in-memory state when it returns an error.
pub trait OrderStore: Send + Sync {
    fn load_active_orders(&self) -> StorageResult<Vec<Order>>;

    fn load_tables(&self) -> StorageResult<Vec<DiningTable>>;

    fn load_completed_orders(&self) -> StorageResult<Vec<CompletedOrder>>;

    fn load_menu(&self) -> StorageResult<Vec<MenuItem>>;

    fn load_staff(&self) -> StorageResult<Vec<Staff>>;

    /// Write all records in one transaction
    fn apply(&self, writes: Vec<StoreWrite>) -> StorageResult<()>;

    fn save_order(&self, order: &Order) -> StorageResult<()> {
        self.apply(vec![StoreWrite::PutOrder(order.clone())])
    }

    fn save_completed_order(&self, completed: &CompletedOrder) -> StorageResult<()> {
        self.apply(vec![StoreWrite::PutCompleted(completed.clone())])
    }

    fn save_table(&self, table: &DiningTable) -> StorageResult<()> {
        self.apply(vec![StoreWrite::PutTable(table.clone())])
    }
}

/// Order store backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate`: once `commit()` returns the
    /// data survives power loss.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::init(Database::create(path)?)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?,
        )
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(COMPLETED_TABLE)?;
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(MENU_TABLE)?;
            let _ = write_txn.open_table(STAFF_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn load_all<K, T>(
        &self,
        definition: TableDefinition<'static, K, &'static [u8]>,
    ) -> StorageResult<Vec<T>>
    where
        K: redb::Key + 'static,
        T: DeserializeOwned,
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(definition)?;
        let mut values = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            values.push(serde_json::from_slice(value.value())?);
        }
        Ok(values)
    }
}

impl OrderStore for RedbStore {
    fn load_active_orders(&self) -> StorageResult<Vec<Order>> {
        self.load_all(ORDERS_TABLE)
    }

    fn load_tables(&self) -> StorageResult<Vec<DiningTable>> {
        self.load_all(TABLES_TABLE)
    }

    fn load_completed_orders(&self) -> StorageResult<Vec<CompletedOrder>> {
        let mut completed: Vec<CompletedOrder> = self.load_all(COMPLETED_TABLE)?;
        completed.sort_by_key(|c| c.closed_at);
        Ok(completed)
    }

    fn load_menu(&self) -> StorageResult<Vec<MenuItem>> {
        self.load_all(MENU_TABLE)
    }

    fn load_staff(&self) -> StorageResult<Vec<Staff>> {
        self.load_all(STAFF_TABLE)
    }

    fn apply(&self, writes: Vec<StoreWrite>) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            let mut completed = txn.open_table(COMPLETED_TABLE)?;
            let mut tables = txn.open_table(TABLES_TABLE)?;
            let mut menu = txn.open_table(MENU_TABLE)?;
            let mut staff = txn.open_table(STAFF_TABLE)?;

            for write in &writes {
                match write {
                    StoreWrite::PutOrder(order) => {
                        let value = serde_json::to_vec(order)?;
                        orders.insert(order.id.as_str(), value.as_slice())?;
                    }
                    StoreWrite::RemoveOrder(order_id) => {
                        orders.remove(order_id.as_str())?;
                    }
                    StoreWrite::PutCompleted(record) => {
                        let value = serde_json::to_vec(record)?;
                        completed.insert(record.order.id.as_str(), value.as_slice())?;
                    }
                    StoreWrite::PutTable(table) => {
                        let value = serde_json::to_vec(table)?;
                        tables.insert(table.id, value.as_slice())?;
                    }
                    StoreWrite::PutMenuItem(item) => {
                        let value = serde_json::to_vec(item)?;
                        menu.insert(item.id.as_str(), value.as_slice())?;
                    }
                    StoreWrite::PutStaff(member) => {
                        let value = serde_json::to_vec(member)?;
                        staff.insert(member.id.as_str(), value.as_slice())?;
                    }
                }
            }
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{ItemCategory, Role, StaffIdentity, TableStatus};
    use shared::order::{OrderItem, PaymentMethod, PaymentRecord, ItemStatus};

    fn sample_order(id: &str, table_id: u32) -> Order {
        let staff = StaffIdentity::new("w1", "Ana", Role::Waiter);
        Order {
            id: id.to_string(),
            table_id,
            created_by: staff.clone(),
            items: vec![OrderItem {
                id: format!("{id}-i1"),
                menu_item_id: "soup".to_string(),
                name: "Soup".to_string(),
                category: ItemCategory::Kitchen,
                quantity: 2,
                unit_price: Decimal::new(450, 2),
                status: ItemStatus::Pending,
                cancel_reason: None,
                version: 1,
                updated_by: staff,
                updated_at: 0,
            }],
            created_at: 0,
            total: Decimal::new(900, 2),
        }
    }

    #[test]
    fn test_order_and_table_written_together() {
        let store = RedbStore::open_in_memory().unwrap();
        let order = sample_order("o1", 3);
        let table = DiningTable {
            id: 3,
            status: TableStatus::Pending,
            active_order_id: Some("o1".to_string()),
        };
        store
            .apply(vec![
                StoreWrite::PutOrder(order.clone()),
                StoreWrite::PutTable(table.clone()),
            ])
            .unwrap();

        assert_eq!(store.load_active_orders().unwrap(), vec![order]);
        assert_eq!(store.load_tables().unwrap(), vec![table]);
    }

    #[test]
    fn test_close_moves_order_to_completed() {
        let store = RedbStore::open_in_memory().unwrap();
        let order = sample_order("o1", 1);
        store.save_order(&order).unwrap();

        let completed = CompletedOrder {
            order: order.clone(),
            closed_by: StaffIdentity::new("c1", "Cash", Role::Cashier),
            closed_at: 5,
            payment: PaymentRecord {
                method: PaymentMethod::Card,
                amount: order.total,
                discount: Decimal::ZERO,
                final_amount: order.total,
                paid_at: 5,
            },
        };
        store
            .apply(vec![
                StoreWrite::PutCompleted(completed.clone()),
                StoreWrite::RemoveOrder("o1".to_string()),
                StoreWrite::PutTable(DiningTable::new(1)),
            ])
            .unwrap();

        assert!(store.load_active_orders().unwrap().is_empty());
        assert_eq!(store.load_completed_orders().unwrap(), vec![completed]);
    }

    #[test]
    fn test_completed_orders_keep_close_order() {
        let store = RedbStore::open_in_memory().unwrap();
        let cashier = StaffIdentity::new("c1", "Cash", Role::Cashier);
        for (id, closed_at) in [("o-b", 20), ("o-a", 10)] {
            let order = sample_order(id, 1);
            store
                .save_completed_order(&CompletedOrder {
                    payment: PaymentRecord {
                        method: PaymentMethod::Cash,
                        amount: order.total,
                        discount: Decimal::ZERO,
                        final_amount: order.total,
                        paid_at: closed_at,
                    },
                    order,
                    closed_by: cashier.clone(),
                    closed_at,
                })
                .unwrap();
        }

        let ids: Vec<_> = store
            .load_completed_orders()
            .unwrap()
            .into_iter()
            .map(|c| c.order.id)
            .collect();
        assert_eq!(ids, vec!["o-a".to_string(), "o-b".to_string()]);
    }

    #[test]
    fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.save_order(&sample_order("o1", 2)).unwrap();
            store.save_table(&DiningTable::new(2)).unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.load_active_orders().unwrap().len(), 1);
        assert_eq!(store.load_tables().unwrap().len(), 1);
    }
}
