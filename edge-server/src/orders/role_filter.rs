//! Role-based visibility and permissions
//!
//! Pure functions over role + item. Used to pre-validate mutations and to
//! narrow every outbound snapshot and event per subscriber.
//!
//! # Item permissions
//!
//! | role    | start | finish | serve | cancel |
//! |---------|-------|--------|-------|--------|
//! | ADMIN   | any   | any    | any   | any    |
//! | CASHIER | any   | any    | any   | any    |
//! | KITCHEN | own   | own    | own   | own    |
//! | BAR     | own   | own    | own   | own    |
//! | WAITER  | -     | -      | any   | before preparation |
//!
//! `own` = item category matches the role's station. `before preparation` =
//! PENDING, or IN_PROGRESS when [`RolePolicy::waiter_may_cancel_in_progress`].

use std::collections::BTreeSet;

use shared::models::Role;
use shared::order::{
    CompletedOrder, DashboardSnapshot, EventPayload, ItemAction, ItemStatus, Order, OrderItem,
    SyncEvent,
};

use super::lifecycle;
use super::manager::{ManagerError, ManagerResult};

/// Tunable parts of the permission table
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy {
    pub waiter_may_cancel_in_progress: bool,
}

/// Order-level actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    /// Create an order or add items to it
    PlaceOrder,
    Settle,
    Transfer,
    Reserve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    Deny,
    Any,
    OwnStation,
    BeforePreparation,
}

fn item_grant(role: Role, action: ItemAction) -> Grant {
    match (role, action) {
        (Role::Admin | Role::Cashier, _) => Grant::Any,
        (Role::Kitchen | Role::Bar, _) => Grant::OwnStation,
        (Role::Waiter, ItemAction::Serve) => Grant::Any,
        (Role::Waiter, ItemAction::Cancel) => Grant::BeforePreparation,
        (Role::Waiter, ItemAction::Start | ItemAction::Finish) => Grant::Deny,
    }
}

pub fn may_perform(role: Role, action: OrderAction) -> bool {
    match (role, action) {
        (Role::Admin | Role::Cashier, _) => true,
        (Role::Waiter, OrderAction::Settle) => false,
        (Role::Waiter, _) => true,
        (Role::Kitchen | Role::Bar, _) => false,
    }
}

pub fn authorize(role: Role, action: OrderAction) -> ManagerResult<()> {
    if may_perform(role, action) {
        Ok(())
    } else {
        Err(ManagerError::Unauthorized(format!(
            "{} may not {:?}",
            role, action
        )))
    }
}

/// Whether `role` sees `item` at all
pub fn visible(item: &OrderItem, role: Role) -> bool {
    role.station().is_none_or(|station| item.category == station)
}

/// Status-independent check: may this role ever do `action` to this item
pub fn check_grant(item: &OrderItem, role: Role, action: ItemAction) -> ManagerResult<()> {
    let allowed = match item_grant(role, action) {
        Grant::Deny => false,
        Grant::OwnStation => visible(item, role),
        Grant::Any | Grant::BeforePreparation => true,
    };
    if allowed {
        Ok(())
    } else {
        Err(ManagerError::Unauthorized(format!(
            "{} may not {:?} item {}",
            role, action, item.id
        )))
    }
}

/// Status-dependent part of the table (waiter cancellation window)
pub fn check_policy(
    item: &OrderItem,
    role: Role,
    action: ItemAction,
    policy: RolePolicy,
) -> ManagerResult<()> {
    if item_grant(role, action) != Grant::BeforePreparation {
        return Ok(());
    }
    let open = match item.status {
        ItemStatus::Pending => true,
        ItemStatus::InProgress => policy.waiter_may_cancel_in_progress,
        _ => false,
    };
    if open {
        Ok(())
    } else {
        Err(ManagerError::Unauthorized(format!(
            "{} may not {:?} item {} once preparation started",
            role, action, item.id
        )))
    }
}

/// Actions this role may perform on the item right now
pub fn permitted_actions(item: &OrderItem, role: Role, policy: RolePolicy) -> BTreeSet<ItemAction> {
    lifecycle::legal_actions(item.status)
        .filter(|action| {
            check_grant(item, role, *action).is_ok()
                && check_policy(item, role, *action, policy).is_ok()
        })
        .collect()
}

// ========== Narrowing ==========

/// Station roles get their own items and a total over those items only
pub fn narrow_order(order: &Order, role: Role) -> Order {
    if role.station().is_none() {
        return order.clone();
    }
    let mut narrowed = Order {
        items: order
            .items
            .iter()
            .filter(|item| visible(item, role))
            .cloned()
            .collect(),
        ..order.clone()
    };
    narrowed.recompute_total();
    narrowed
}

/// Completed orders a station role has nothing in are hidden entirely
pub fn narrow_completed(completed: &CompletedOrder, role: Role) -> Option<CompletedOrder> {
    let order = narrow_order(&completed.order, role);
    if order.items.is_empty() {
        return None;
    }
    Some(CompletedOrder {
        order,
        ..completed.clone()
    })
}

pub fn narrow_snapshot(snapshot: &mut DashboardSnapshot) {
    let role = snapshot.role;
    for view in snapshot.tables.values_mut() {
        if let Some(order) = view.order.as_mut() {
            *order = narrow_order(order, role);
        }
    }
}

/// Like [`narrow_event`], with the order the event belongs to
///
/// Item events carry the order total; for station roles it is replaced by
/// the total of the items that role can see.
pub fn narrow_order_event(event: &SyncEvent, role: Role, order: &Order) -> Option<SyncEvent> {
    let mut narrowed = narrow_event(event, role)?;
    if role.station().is_none() {
        return Some(narrowed);
    }
    match &mut narrowed.payload {
        EventPayload::ItemsAdded { total, .. } | EventPayload::ItemStatusChanged { total, .. } => {
            *total = narrow_order(order, role).total;
        }
        _ => {}
    }
    Some(narrowed)
}

/// Event as this role should receive it, or `None` if it is not theirs
pub fn narrow_event(event: &SyncEvent, role: Role) -> Option<SyncEvent> {
    if role.station().is_none() {
        return Some(event.clone());
    }
    let payload = match &event.payload {
        EventPayload::OrderCreated { order } => EventPayload::OrderCreated {
            order: narrow_order(order, role),
        },
        EventPayload::ItemsAdded {
            order_id,
            table_id,
            items,
            total,
        } => {
            let items: Vec<OrderItem> = items
                .iter()
                .filter(|item| visible(item, role))
                .cloned()
                .collect();
            if items.is_empty() {
                return None;
            }
            EventPayload::ItemsAdded {
                order_id: order_id.clone(),
                table_id: *table_id,
                items,
                total: *total,
            }
        }
        EventPayload::ItemStatusChanged { category, .. } => {
            if role.station() != Some(*category) {
                return None;
            }
            event.payload.clone()
        }
        other => other.clone(),
    };
    Some(SyncEvent {
        payload,
        ..event.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{ItemCategory, StaffIdentity};

    fn item(category: ItemCategory, status: ItemStatus) -> OrderItem {
        OrderItem {
            id: format!("{:?}-{:?}", category, status),
            menu_item_id: "m".to_string(),
            name: "Thing".to_string(),
            category,
            quantity: 1,
            unit_price: Decimal::ONE,
            status,
            cancel_reason: None,
            version: 1,
            updated_by: StaffIdentity::new("w1", "Ana", Role::Waiter),
            updated_at: 0,
        }
    }

    #[test]
    fn test_station_roles_only_see_their_category() {
        let soup = item(ItemCategory::Kitchen, ItemStatus::Pending);
        let beer = item(ItemCategory::Bar, ItemStatus::Pending);
        assert!(visible(&soup, Role::Kitchen));
        assert!(!visible(&beer, Role::Kitchen));
        assert!(visible(&beer, Role::Bar));
        for role in [Role::Admin, Role::Waiter, Role::Cashier] {
            assert!(visible(&soup, role) && visible(&beer, role));
        }
    }

    #[test]
    fn test_bar_cannot_touch_kitchen_items() {
        let soup = item(ItemCategory::Kitchen, ItemStatus::Pending);
        assert!(check_grant(&soup, Role::Bar, ItemAction::Start).is_err());
        assert!(check_grant(&soup, Role::Kitchen, ItemAction::Start).is_ok());
        assert!(permitted_actions(&soup, Role::Bar, RolePolicy::default()).is_empty());
    }

    #[test]
    fn test_waiter_actions() {
        let policy = RolePolicy::default();
        let pending = item(ItemCategory::Kitchen, ItemStatus::Pending);
        let cooking = item(ItemCategory::Kitchen, ItemStatus::InProgress);
        let ready = item(ItemCategory::Kitchen, ItemStatus::Ready);

        assert_eq!(
            permitted_actions(&pending, Role::Waiter, policy),
            BTreeSet::from([ItemAction::Cancel])
        );
        assert!(permitted_actions(&cooking, Role::Waiter, policy).is_empty());
        assert_eq!(
            permitted_actions(&ready, Role::Waiter, policy),
            BTreeSet::from([ItemAction::Serve])
        );

        let lenient = RolePolicy {
            waiter_may_cancel_in_progress: true,
        };
        assert_eq!(
            permitted_actions(&cooking, Role::Waiter, lenient),
            BTreeSet::from([ItemAction::Cancel])
        );
    }

    #[test]
    fn test_admin_and_cashier_may_do_everything_legal() {
        let cooking = item(ItemCategory::Bar, ItemStatus::InProgress);
        for role in [Role::Admin, Role::Cashier] {
            assert_eq!(
                permitted_actions(&cooking, role, RolePolicy::default()),
                BTreeSet::from([ItemAction::Finish, ItemAction::Cancel])
            );
        }
    }

    #[test]
    fn test_order_level_table() {
        assert!(may_perform(Role::Waiter, OrderAction::PlaceOrder));
        assert!(!may_perform(Role::Waiter, OrderAction::Settle));
        assert!(may_perform(Role::Cashier, OrderAction::Settle));
        assert!(!may_perform(Role::Kitchen, OrderAction::PlaceOrder));
        assert!(!may_perform(Role::Bar, OrderAction::Transfer));
        assert!(may_perform(Role::Admin, OrderAction::Reserve));
    }

    #[test]
    fn test_station_totals_only_cover_own_items() {
        let staff = StaffIdentity::new("w1", "Ana", Role::Waiter);
        let mut soup = item(ItemCategory::Kitchen, ItemStatus::Pending);
        soup.unit_price = Decimal::from(5);
        let mut beer = item(ItemCategory::Bar, ItemStatus::Pending);
        beer.unit_price = Decimal::from(4);
        let mut order = Order {
            id: "o1".to_string(),
            table_id: 1,
            created_by: staff.clone(),
            items: vec![soup.clone(), beer],
            created_at: 0,
            total: Decimal::ZERO,
        };
        order.recompute_total();

        assert_eq!(narrow_order(&order, Role::Waiter).total, Decimal::from(9));
        assert_eq!(narrow_order(&order, Role::Kitchen).total, Decimal::from(5));
        assert_eq!(narrow_order(&order, Role::Bar).total, Decimal::from(4));

        let event = SyncEvent {
            sequence: 1,
            timestamp: 0,
            operator: staff,
            payload: EventPayload::ItemStatusChanged {
                order_id: "o1".to_string(),
                table_id: 1,
                item_id: soup.id.clone(),
                category: ItemCategory::Kitchen,
                status: ItemStatus::InProgress,
                version: 2,
                cancel_reason: None,
                updated_at: 0,
                total: order.total,
            },
        };
        let total_for = |role| match narrow_order_event(&event, role, &order).map(|e| e.payload) {
            Some(EventPayload::ItemStatusChanged { total, .. }) => Some(total),
            _ => None,
        };
        assert_eq!(total_for(Role::Kitchen), Some(Decimal::from(5)));
        assert_eq!(total_for(Role::Cashier), Some(Decimal::from(9)));
        assert_eq!(total_for(Role::Bar), None);
    }

    #[test]
    fn test_status_event_dropped_for_other_station() {
        let event = SyncEvent {
            sequence: 1,
            timestamp: 0,
            operator: StaffIdentity::new("k1", "Chef", Role::Kitchen),
            payload: EventPayload::ItemStatusChanged {
                order_id: "o1".to_string(),
                table_id: 1,
                item_id: "i1".to_string(),
                category: ItemCategory::Kitchen,
                status: ItemStatus::Ready,
                version: 3,
                cancel_reason: None,
                updated_at: 0,
                total: Decimal::ONE,
            },
        };
        assert!(narrow_event(&event, Role::Bar).is_none());
        assert!(narrow_event(&event, Role::Kitchen).is_some());
        assert!(narrow_event(&event, Role::Waiter).is_some());
    }
}
