//! OrdersManager - order lifecycle engine
//!
//! Owns the live tables and orders, validates every mutation, writes it
//! through to the store and fans the result out on the sync bus.
//!
//! # Mutation Flow
//!
//! ```text
//! operation(args, staff)
//!     ├─ 1. Role pre-check (role_filter)
//!     ├─ 2. Resolve menu items (Catalog)          [create / add only]
//!     ├─ 3. Lock the owning table slot(s)
//!     ├─ 4. Validate (version guard, state machine, policy)
//!     ├─ 5. Persist (one redb transaction)         ── failure: nothing changes
//!     ├─ 6. Commit to memory + order index
//!     ├─ 7. Publish event(s), slot lock still held
//!     └─ 8. Return result
//! ```

mod error;
pub use error::*;

use rust_decimal::Decimal;
use shared::models::{
    DiningTable, ItemCategory, MenuItem, Role, StaffIdentity, TableId, TableStatus,
};
use shared::order::{
    CommandResponse, CommandResult, CompletedOrder, DashboardSnapshot, EventPayload, ItemAction,
    ItemRequest, ItemStatus, Order, OrderCommand, OrderCommandPayload, OrderItem, PaymentInput,
    PaymentRecord, TableSummary, TableView,
};
use shared::util::now_millis;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::registry::{TableRegistry, TableSlot};
use super::role_filter::{self, OrderAction, RolePolicy};
use super::storage::{OrderStore, StoreWrite};
use super::{guard, lifecycle};
use crate::message::{Subscription, SyncBus};
use crate::services::catalog_service::Catalog;

/// Upper bound for one order line
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Default number of tables
pub const DEFAULT_TABLE_COUNT: u32 = 20;

/// Snapshot attempts before a new subscriber is left to resync on its own
const MAX_SYNC_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub table_count: u32,
    pub queue_capacity: usize,
    pub policy: RolePolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            table_count: DEFAULT_TABLE_COUNT,
            queue_capacity: crate::message::DEFAULT_QUEUE_CAPACITY,
            policy: RolePolicy::default(),
        }
    }
}

/// OrdersManager
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Dashboards use it to detect server restarts.
pub struct OrdersManager {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn Catalog>,
    registry: TableRegistry,
    bus: SyncBus,
    policy: RolePolicy,
    /// Server instance epoch - unique ID generated on startup
    epoch: String,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("store", &"<OrderStore>")
            .field("tables", &self.registry.len())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl OrdersManager {
    /// Load tables and active orders from `store` and start serving
    pub fn open(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn Catalog>,
        config: ManagerConfig,
    ) -> ManagerResult<Self> {
        let tables = store.load_tables()?;
        let orders = store.load_active_orders()?;
        let registry = TableRegistry::hydrate(config.table_count, tables, orders);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            epoch = %epoch,
            tables = registry.len(),
            active_orders = registry.active_order_count(),
            "OrdersManager started with new epoch"
        );
        Ok(Self {
            store,
            catalog,
            registry,
            bus: SyncBus::new(config.queue_capacity),
            policy: config.policy,
            epoch,
        })
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    pub fn bus(&self) -> &SyncBus {
        &self.bus
    }

    pub fn table_count(&self) -> usize {
        self.registry.len()
    }

    // ========== Commands ==========

    /// Execute a command and report the outcome
    pub fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        tracing::debug!(
            command_id = %cmd.command_id,
            operator_id = %cmd.operator.id,
            role = %cmd.operator.role,
            "Executing command"
        );
        match self.process_command(cmd.payload, &cmd.operator) {
            Ok(result) => CommandResponse::success(cmd.command_id, result),
            Err(err) => {
                if err.is_recoverable() {
                    tracing::debug!(command_id = %cmd.command_id, error = %err, "Command rejected");
                } else {
                    tracing::warn!(command_id = %cmd.command_id, error = %err, "Command failed");
                }
                CommandResponse::error(cmd.command_id, err.into())
            }
        }
    }

    fn process_command(
        &self,
        payload: OrderCommandPayload,
        staff: &StaffIdentity,
    ) -> ManagerResult<CommandResult> {
        match payload {
            OrderCommandPayload::CreateOrder { table_id, items } => self
                .create_order(table_id, &items, staff)
                .map(CommandResult::Order),
            OrderCommandPayload::AddItems { order_id, items } => self
                .add_items(&order_id, &items, staff)
                .map(CommandResult::Order),
            OrderCommandPayload::TransitionItem {
                order_id,
                item_id,
                target,
                expected_version,
                reason,
            } => self
                .transition_item(
                    &order_id,
                    &item_id,
                    target,
                    staff,
                    expected_version,
                    reason.as_deref(),
                )
                .map(CommandResult::Item),
            OrderCommandPayload::CloseOrder { order_id, payment } => self
                .settle_order(&order_id, staff, payment.unwrap_or_default())
                .map(CommandResult::Completed),
            OrderCommandPayload::TransferOrder {
                from_table_id,
                to_table_id,
            } => self
                .transfer_order(from_table_id, to_table_id, staff)
                .map(|(from, to)| CommandResult::Transferred { from, to }),
            OrderCommandPayload::SetTableReserved { table_id, reserved } => self
                .set_table_reserved(table_id, reserved, staff)
                .map(CommandResult::Table),
        }
    }

    // ========== Operations ==========

    /// Open an order on an empty table
    pub fn create_order(
        &self,
        table_id: TableId,
        items: &[ItemRequest],
        staff: &StaffIdentity,
    ) -> ManagerResult<Order> {
        role_filter::authorize(staff.role, OrderAction::PlaceOrder)?;
        if !self.registry.contains(table_id) {
            return Err(ManagerError::InvalidTable(format!(
                "table {} does not exist",
                table_id
            )));
        }
        if items.is_empty() {
            return Err(ManagerError::EmptyOrder);
        }
        let now = now_millis();
        let order_items = self.resolve_items(items, staff, now)?;

        let mut slot = self.registry.lock(table_id)?;
        if !slot.table.is_empty() || slot.order.is_some() {
            return Err(ManagerError::InvalidTable(format!(
                "table {} is {:?}",
                table_id, slot.table.status
            )));
        }

        let mut order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            table_id,
            created_by: staff.clone(),
            items: order_items,
            created_at: now,
            total: Decimal::ZERO,
        };
        order.recompute_total();
        let table = DiningTable {
            id: table_id,
            status: order.table_status(),
            active_order_id: Some(order.id.clone()),
        };

        self.store.apply(vec![
            StoreWrite::PutOrder(order.clone()),
            StoreWrite::PutTable(table.clone()),
        ])?;
        slot.order = Some(order.clone());
        slot.table = table.clone();
        self.registry.index_order(&order.id, table_id);

        self.bus.publish(
            staff,
            EventPayload::OrderCreated {
                order: order.clone(),
            },
        );
        self.bus.publish(
            staff,
            EventPayload::TableStatusChanged {
                table_id,
                status: table.status,
            },
        );
        drop(slot);

        tracing::info!(
            order_id = %order.id,
            table_id,
            items = order.items.len(),
            total = %order.total,
            staff_id = %staff.id,
            "Order created"
        );
        Ok(order)
    }

    /// Append items to an open order
    pub fn add_items(
        &self,
        order_id: &str,
        items: &[ItemRequest],
        staff: &StaffIdentity,
    ) -> ManagerResult<Order> {
        role_filter::authorize(staff.role, OrderAction::PlaceOrder)?;
        if items.is_empty() {
            return Err(ManagerError::EmptyOrder);
        }
        let now = now_millis();
        let new_items = self.resolve_items(items, staff, now)?;

        let mut slot = self.registry.lock_order(order_id)?;
        let mut order = match slot.order.as_ref() {
            Some(order) => order.clone(),
            None => return Err(ManagerError::OrderNotFound(order_id.to_string())),
        };
        if order.is_settleable() {
            return Err(ManagerError::OrderNotOpen(order_id.to_string()));
        }
        order.items.extend(new_items.iter().cloned());
        order.recompute_total();
        let total = order.total;
        let table_id = order.table_id;

        let table_changed = self.write_through(&mut slot, order.clone())?;
        self.bus.publish_for_order(
            staff,
            EventPayload::ItemsAdded {
                order_id: order_id.to_string(),
                table_id,
                items: new_items,
                total,
            },
            &order,
        );
        if table_changed {
            self.publish_table(&slot, staff);
        }
        drop(slot);

        tracing::info!(order_id = %order_id, table_id, total = %total, "Items added");
        Ok(order)
    }

    /// Move one item along its state machine
    ///
    /// Checked in order: role and category, version, state machine, cancel
    /// reason, status-dependent role policy.
    pub fn transition_item(
        &self,
        order_id: &str,
        item_id: &str,
        target: ItemStatus,
        staff: &StaffIdentity,
        expected_version: u64,
        reason: Option<&str>,
    ) -> ManagerResult<OrderItem> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        let policy = self.policy;
        let now = now_millis();

        let mut slot = self.registry.lock_order(order_id)?;
        let (previous, updated, mut order) = {
            let order = slot
                .order
                .as_ref()
                .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
            let current = order
                .item(item_id)
                .ok_or_else(|| ManagerError::ItemNotFound(item_id.to_string()))?;
            let action = lifecycle::action_for(current.status, target)?;
            role_filter::check_grant(current, staff.role, action)?;

            let updated = guard::compare_and_apply(current, expected_version, |item| {
                let next = lifecycle::next_status(item.status, action)?;
                if action == ItemAction::Cancel {
                    item.cancel_reason = Some(reason.ok_or(ManagerError::CancelReasonRequired)?);
                }
                role_filter::check_policy(item, staff.role, action, policy)?;
                item.status = next;
                item.updated_by = staff.clone();
                item.updated_at = now;
                Ok(())
            })?;
            (current.status, updated, order.clone())
        };

        if let Some(item) = order.item_mut(item_id) {
            *item = updated.clone();
        }
        order.recompute_total();
        let total = order.total;
        let table_id = order.table_id;

        let table_changed = self.write_through(&mut slot, order.clone())?;
        self.bus.publish_for_order(
            staff,
            EventPayload::ItemStatusChanged {
                order_id: order_id.to_string(),
                table_id,
                item_id: item_id.to_string(),
                category: updated.category,
                status: updated.status,
                version: updated.version,
                cancel_reason: updated.cancel_reason.clone(),
                updated_at: updated.updated_at,
                total,
            },
            &order,
        );
        if table_changed {
            self.publish_table(&slot, staff);
        }
        drop(slot);

        tracing::info!(
            order_id = %order_id,
            item_id = %item_id,
            from = ?previous,
            to = ?updated.status,
            version = updated.version,
            staff_id = %staff.id,
            "Item transitioned"
        );
        Ok(updated)
    }

    /// Close a fully served order, settling in cash without discount
    pub fn close_order(&self, order_id: &str, staff: &StaffIdentity) -> ManagerResult<CompletedOrder> {
        self.settle_order(order_id, staff, PaymentInput::default())
    }

    /// Close a fully served order with an explicit payment
    pub fn settle_order(
        &self,
        order_id: &str,
        staff: &StaffIdentity,
        payment: PaymentInput,
    ) -> ManagerResult<CompletedOrder> {
        role_filter::authorize(staff.role, OrderAction::Settle)?;
        if payment.discount < Decimal::ZERO {
            return Err(ManagerError::InvalidOperation(
                "discount must not be negative".to_string(),
            ));
        }

        let mut slot = self.registry.lock_order(order_id)?;
        let order = match slot.order.as_ref() {
            Some(order) => order.clone(),
            None => return Err(ManagerError::OrderNotFound(order_id.to_string())),
        };
        if !order.is_settleable() {
            return Err(ManagerError::OrderNotSettleable(format!(
                "order {} has items still in preparation",
                order_id
            )));
        }

        let now = now_millis();
        let table_id = order.table_id;
        let final_amount = (order.total - payment.discount).max(Decimal::ZERO);
        let completed = CompletedOrder {
            payment: PaymentRecord {
                method: payment.method,
                amount: order.total,
                discount: payment.discount,
                final_amount,
                paid_at: now,
            },
            order,
            closed_by: staff.clone(),
            closed_at: now,
        };
        let table = DiningTable::new(table_id);

        self.store.apply(vec![
            StoreWrite::PutCompleted(completed.clone()),
            StoreWrite::RemoveOrder(order_id.to_string()),
            StoreWrite::PutTable(table.clone()),
        ])?;
        slot.order = None;
        slot.table = table;
        self.registry.unindex_order(order_id);

        self.bus.publish(
            staff,
            EventPayload::OrderCompleted {
                order_id: order_id.to_string(),
                table_id,
                final_amount,
            },
        );
        self.publish_table(&slot, staff);
        drop(slot);

        tracing::info!(
            order_id = %order_id,
            table_id,
            method = ?completed.payment.method,
            final_amount = %final_amount,
            staff_id = %staff.id,
            "Order closed"
        );
        Ok(completed)
    }

    /// Move the active order of `from` onto the empty table `to`
    ///
    /// Both tables and the order pointer change in one store transaction.
    pub fn transfer_order(
        &self,
        from: TableId,
        to: TableId,
        staff: &StaffIdentity,
    ) -> ManagerResult<(DiningTable, DiningTable)> {
        role_filter::authorize(staff.role, OrderAction::Transfer)?;
        if from == to {
            let slot = self.registry.lock(from)?;
            return Err(if slot.order.is_some() {
                ManagerError::TargetOccupied(to)
            } else {
                ManagerError::SourceNotActive(from)
            });
        }

        let (mut source, mut target) = self.registry.lock_pair(from, to)?;
        let mut moved = match source.order.as_ref() {
            Some(order) => order.clone(),
            None => return Err(ManagerError::SourceNotActive(from)),
        };
        if !target.table.is_empty() || target.order.is_some() {
            return Err(ManagerError::TargetOccupied(to));
        }

        moved.table_id = to;
        let order_id = moved.id.clone();
        let from_table = DiningTable::new(from);
        let to_table = DiningTable {
            id: to,
            status: moved.table_status(),
            active_order_id: Some(order_id.clone()),
        };

        self.store.apply(vec![
            StoreWrite::PutOrder(moved.clone()),
            StoreWrite::PutTable(from_table.clone()),
            StoreWrite::PutTable(to_table.clone()),
        ])?;
        source.order = None;
        source.table = from_table.clone();
        target.order = Some(moved);
        target.table = to_table.clone();
        self.registry.index_order(&order_id, to);

        self.bus.publish(
            staff,
            EventPayload::OrderTransferred {
                order_id: order_id.clone(),
                from_table_id: from,
                to_table_id: to,
            },
        );
        self.publish_table(&source, staff);
        self.publish_table(&target, staff);
        drop(source);
        drop(target);

        tracing::info!(
            order_id = %order_id,
            from_table = from,
            to_table = to,
            staff_id = %staff.id,
            "Order transferred"
        );
        Ok((from_table, to_table))
    }

    /// Hold an empty table for a guest, or release the hold
    pub fn set_table_reserved(
        &self,
        table_id: TableId,
        reserved: bool,
        staff: &StaffIdentity,
    ) -> ManagerResult<DiningTable> {
        role_filter::authorize(staff.role, OrderAction::Reserve)?;
        let mut slot = self.registry.lock(table_id)?;
        if slot.order.is_some() {
            return Err(ManagerError::InvalidTable(format!(
                "table {} has an active order",
                table_id
            )));
        }
        let (expected, next) = if reserved {
            (TableStatus::Empty, TableStatus::Reserved)
        } else {
            (TableStatus::Reserved, TableStatus::Empty)
        };
        if slot.table.status != expected {
            return Err(ManagerError::InvalidTable(format!(
                "table {} is {:?}",
                table_id, slot.table.status
            )));
        }

        let table = DiningTable {
            id: table_id,
            status: next,
            active_order_id: None,
        };
        self.store.save_table(&table)?;
        slot.table = table.clone();
        self.publish_table(&slot, staff);
        drop(slot);

        tracing::info!(table_id, reserved, staff_id = %staff.id, "Table reservation changed");
        Ok(table)
    }

    // ========== Queries ==========

    /// Role-filtered state of every table
    ///
    /// Takes every slot lock (ascending) for a consistent cut: no publish can
    /// be in flight, so `sequence` is exactly the last event reflected.
    pub fn snapshot(&self, role: Role) -> DashboardSnapshot {
        let slots = self.registry.lock_all();
        let sequence = self.bus.current_sequence();
        let tables = slots
            .iter()
            .map(|slot| {
                (
                    slot.table.id,
                    TableView {
                        table: slot.table.clone(),
                        order: slot.order.clone(),
                    },
                )
            })
            .collect();
        drop(slots);

        let mut snapshot = DashboardSnapshot {
            server_epoch: self.epoch.clone(),
            role,
            generated_at: now_millis(),
            sequence,
            tables,
        };
        role_filter::narrow_snapshot(&mut snapshot);
        snapshot
    }

    pub fn get_order(&self, order_id: &str, role: Role) -> ManagerResult<Order> {
        let slot = self.registry.lock_order(order_id)?;
        slot.order
            .as_ref()
            .map(|order| role_filter::narrow_order(order, role))
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    pub fn tables(&self) -> Vec<DiningTable> {
        self.registry
            .table_ids()
            .filter_map(|id| self.registry.lock(id).ok().map(|slot| slot.table.clone()))
            .collect()
    }

    /// Order, total and item count of one table, as `role` sees it
    pub fn table_summary(&self, table_id: TableId, role: Role) -> ManagerResult<TableSummary> {
        let slot = self.registry.lock(table_id)?;
        let order = slot
            .order
            .as_ref()
            .map(|order| role_filter::narrow_order(order, role));
        let status = slot.table.status;
        drop(slot);

        Ok(TableSummary {
            table_id,
            status,
            total: order.as_ref().map_or(Decimal::ZERO, Order::compute_total),
            item_count: order.as_ref().map_or(0, Order::item_count),
            order,
        })
    }

    /// Closed orders, oldest first; station roles only see their own items
    pub fn completed_orders(&self, role: Role) -> ManagerResult<Vec<CompletedOrder>> {
        Ok(self
            .store
            .load_completed_orders()?
            .iter()
            .filter_map(|completed| role_filter::narrow_completed(completed, role))
            .collect())
    }

    /// What `role` may do to the item right now
    pub fn permitted_actions(
        &self,
        order_id: &str,
        item_id: &str,
        role: Role,
    ) -> ManagerResult<BTreeSet<ItemAction>> {
        let slot = self.registry.lock_order(order_id)?;
        let item = slot
            .order
            .as_ref()
            .and_then(|order| order.item(item_id))
            .ok_or_else(|| ManagerError::ItemNotFound(item_id.to_string()))?;
        Ok(role_filter::permitted_actions(item, role, self.policy))
    }

    // ========== Subscriptions ==========

    /// Subscribe a dashboard; the first message is its snapshot
    ///
    /// If the queue overflows while that snapshot is being built, the sync
    /// is started over so the connection never opens on `ResyncRequired`.
    pub fn subscribe(&self, role: Role) -> Subscription {
        let subscription = self.bus.register(role);
        self.initial_sync(&subscription);
        subscription
    }

    fn initial_sync(&self, subscription: &Subscription) {
        for attempt in 1..=MAX_SYNC_ATTEMPTS {
            if attempt > 1 {
                subscription.queue.begin_sync();
            }
            if self.complete_sync(subscription) {
                return;
            }
        }
    }

    /// Replace whatever the subscriber has queued with a fresh snapshot
    pub fn resync(&self, subscription: &Subscription) {
        subscription.queue.begin_sync();
        self.complete_sync(subscription);
    }

    fn complete_sync(&self, subscription: &Subscription) -> bool {
        let snapshot = self.snapshot(subscription.role());
        let sequence = snapshot.sequence;
        let queued = subscription.queue.finish_sync(snapshot);
        if queued {
            tracing::debug!(
                subscriber_id = subscription.id(),
                sequence,
                "Snapshot queued"
            );
        } else {
            tracing::warn!(
                subscriber_id = subscription.id(),
                "Subscriber overflowed while its snapshot was built"
            );
        }
        queued
    }

    // ========== Helpers ==========

    /// Persist an updated order (plus its table if the status moved) and
    /// commit both to the slot. Returns whether the table status changed.
    fn write_through(&self, slot: &mut TableSlot, order: Order) -> ManagerResult<bool> {
        let table = DiningTable {
            id: slot.table.id,
            status: order.table_status(),
            active_order_id: Some(order.id.clone()),
        };
        let changed = table != slot.table;
        let mut writes = vec![StoreWrite::PutOrder(order.clone())];
        if changed {
            writes.push(StoreWrite::PutTable(table.clone()));
        }
        self.store.apply(writes)?;
        slot.order = Some(order);
        slot.table = table;
        Ok(changed)
    }

    fn publish_table(&self, slot: &TableSlot, staff: &StaffIdentity) {
        self.bus.publish(
            staff,
            EventPayload::TableStatusChanged {
                table_id: slot.table.id,
                status: slot.table.status,
            },
        );
    }

    /// Price and expand requested lines against the catalog
    ///
    /// Campaign items become one line per component, each at the
    /// component's own price and station.
    fn resolve_items(
        &self,
        requests: &[ItemRequest],
        staff: &StaffIdentity,
        now: i64,
    ) -> ManagerResult<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            if request.quantity == 0 || request.quantity > MAX_ITEM_QUANTITY {
                return Err(ManagerError::InvalidOperation(format!(
                    "quantity must be between 1 and {}, got {}",
                    MAX_ITEM_QUANTITY, request.quantity
                )));
            }
            let menu_item = self.menu_item(&request.menu_item_id)?;
            if !menu_item.is_campaign() {
                let name = menu_item.name.clone();
                let category = menu_item.category;
                items.push(new_item(&menu_item, name, category, request.quantity, staff, now));
                continue;
            }
            for component in &menu_item.components {
                let part = self.menu_item(&component.menu_item_id)?;
                let name = format!("{} - {}", menu_item.name, part.name);
                let category = component.category.unwrap_or(part.category);
                items.push(new_item(&part, name, category, request.quantity, staff, now));
            }
        }
        Ok(items)
    }

    fn menu_item(&self, id: &str) -> ManagerResult<MenuItem> {
        self.catalog
            .get_menu_item(id)
            .ok_or_else(|| ManagerError::MenuItemNotFound(id.to_string()))
    }
}

fn new_item(
    menu_item: &MenuItem,
    name: String,
    category: ItemCategory,
    quantity: u32,
    staff: &StaffIdentity,
    now: i64,
) -> OrderItem {
    OrderItem {
        id: uuid::Uuid::new_v4().to_string(),
        menu_item_id: menu_item.id.clone(),
        name,
        category,
        quantity,
        unit_price: menu_item.price,
        status: ItemStatus::Pending,
        cancel_reason: None,
        version: 1,
        updated_by: staff.clone(),
        updated_at: now,
    }
}

#[cfg(test)]
mod tests;
