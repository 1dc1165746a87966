use super::*;
use crate::orders::storage::{RedbStore, StorageError, StorageResult};
use crate::services::catalog_service::CatalogService;
use rust_decimal::Decimal;
use shared::models::{CampaignComponent, Staff};
use shared::order::ItemStatus;
use std::sync::atomic::{AtomicBool, Ordering};

/// Store that can be switched into failing every write
struct FailingStore {
    inner: RedbStore,
    fail: AtomicBool,
}

impl FailingStore {
    fn new() -> Self {
        Self {
            inner: RedbStore::open_in_memory().unwrap(),
            fail: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl OrderStore for FailingStore {
    fn load_active_orders(&self) -> StorageResult<Vec<Order>> {
        self.inner.load_active_orders()
    }

    fn load_tables(&self) -> StorageResult<Vec<DiningTable>> {
        self.inner.load_tables()
    }

    fn load_completed_orders(&self) -> StorageResult<Vec<CompletedOrder>> {
        self.inner.load_completed_orders()
    }

    fn load_menu(&self) -> StorageResult<Vec<MenuItem>> {
        self.inner.load_menu()
    }

    fn load_staff(&self) -> StorageResult<Vec<Staff>> {
        self.inner.load_staff()
    }

    fn apply(&self, writes: Vec<StoreWrite>) -> StorageResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.inner.apply(writes)
    }
}

fn menu_item(id: &str, name: &str, price: &str, category: ItemCategory) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        price: price.parse().unwrap(),
        category,
        components: Vec::new(),
    }
}

fn test_menu() -> Vec<MenuItem> {
    vec![
        menu_item("soup", "Soup", "5.50", ItemCategory::Kitchen),
        menu_item("steak", "Steak", "18.00", ItemCategory::Kitchen),
        menu_item("beer", "Beer", "4.00", ItemCategory::Bar),
        menu_item("wine", "Wine", "6.00", ItemCategory::Bar),
        MenuItem {
            id: "lunch".to_string(),
            name: "Lunch".to_string(),
            price: Decimal::from(8),
            category: ItemCategory::Kitchen,
            components: vec![
                CampaignComponent {
                    menu_item_id: "soup".to_string(),
                    category: None,
                },
                CampaignComponent {
                    menu_item_id: "beer".to_string(),
                    category: None,
                },
            ],
        },
    ]
}

fn test_catalog() -> Arc<CatalogService> {
    Arc::new(CatalogService::from_items(test_menu()))
}

fn waiter() -> StaffIdentity {
    StaffIdentity::new("w1", "Ana", Role::Waiter)
}

fn kitchen() -> StaffIdentity {
    StaffIdentity::new("k1", "Chef", Role::Kitchen)
}

fn bar() -> StaffIdentity {
    StaffIdentity::new("b1", "Barkeep", Role::Bar)
}

fn cashier() -> StaffIdentity {
    StaffIdentity::new("c1", "Till", Role::Cashier)
}

fn admin() -> StaffIdentity {
    StaffIdentity::new("a1", "Boss", Role::Admin)
}

fn small_config() -> ManagerConfig {
    ManagerConfig {
        table_count: 6,
        ..ManagerConfig::default()
    }
}

fn create_test_manager() -> OrdersManager {
    let store = Arc::new(RedbStore::open_in_memory().unwrap());
    OrdersManager::open(store, test_catalog(), small_config()).unwrap()
}

fn create_manager_with_store(store: Arc<dyn OrderStore>, config: ManagerConfig) -> OrdersManager {
    OrdersManager::open(store, test_catalog(), config).unwrap()
}

fn items(ids: &[&str]) -> Vec<ItemRequest> {
    ids.iter().map(|id| ItemRequest::new(*id, 1)).collect()
}

/// Open an order on `table_id` and return it
fn open_order(manager: &OrdersManager, table_id: TableId, ids: &[&str]) -> Order {
    manager
        .create_order(table_id, &items(ids), &waiter())
        .unwrap()
}

fn item_id(order: &Order, menu_item_id: &str) -> String {
    order
        .items
        .iter()
        .find(|i| i.menu_item_id == menu_item_id)
        .map(|i| i.id.clone())
        .unwrap()
}

/// Move an item forward with the staff member allowed to do it
fn advance(
    manager: &OrdersManager,
    order_id: &str,
    item_id: &str,
    target: ItemStatus,
    staff: &StaffIdentity,
) -> OrderItem {
    let version = manager
        .get_order(order_id, Role::Admin)
        .unwrap()
        .item(item_id)
        .unwrap()
        .version;
    manager
        .transition_item(order_id, item_id, target, staff, version, None)
        .unwrap()
}

/// Drive a kitchen item all the way to SERVED
fn serve_kitchen_item(manager: &OrdersManager, order_id: &str, item_id: &str) {
    advance(manager, order_id, item_id, ItemStatus::InProgress, &kitchen());
    advance(manager, order_id, item_id, ItemStatus::Ready, &kitchen());
    advance(manager, order_id, item_id, ItemStatus::Served, &waiter());
}
