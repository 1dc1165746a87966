//! Dashboard-side replica of the server state
//!
//! Applies the snapshot, then deltas, using the per-item version to spot
//! duplicates (dropped) and gaps (resync). Once a gap is seen every further
//! event is refused until the next snapshot arrives.

use std::collections::BTreeMap;

use super::event::{EventPayload, SyncEvent};
use super::snapshot::{DashboardSnapshot, TableView};
use super::types::{Order, OrderItem};
use crate::message::SyncMessage;
use crate::models::{DiningTable, Role, TableId};

/// Result of feeding one message into the replica
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Already reflected locally (at-least-once redelivery)
    Stale,
    /// Local state can no longer be trusted; request a snapshot
    ResyncNeeded,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardReplica {
    role: Option<Role>,
    server_epoch: Option<String>,
    tables: BTreeMap<TableId, TableView>,
    needs_resync: bool,
}

impl DashboardReplica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn server_epoch(&self) -> Option<&str> {
        self.server_epoch.as_deref()
    }

    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    pub fn tables(&self) -> &BTreeMap<TableId, TableView> {
        &self.tables
    }

    pub fn table(&self, table_id: TableId) -> Option<&TableView> {
        self.tables.get(&table_id)
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.tables
            .values()
            .filter_map(|view| view.order.as_ref())
            .find(|order| order.id == order_id)
    }

    pub fn item(&self, order_id: &str, item_id: &str) -> Option<&OrderItem> {
        self.order(order_id).and_then(|order| order.item(item_id))
    }

    pub fn apply(&mut self, message: SyncMessage) -> ApplyOutcome {
        match message {
            SyncMessage::Snapshot(snapshot) => {
                self.apply_snapshot(snapshot);
                ApplyOutcome::Applied
            }
            SyncMessage::Event(event) => self.apply_event(&event),
            SyncMessage::ResyncRequired => {
                self.needs_resync = true;
                ApplyOutcome::ResyncNeeded
            }
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: DashboardSnapshot) {
        self.role = Some(snapshot.role);
        self.server_epoch = Some(snapshot.server_epoch);
        self.tables = snapshot.tables;
        self.needs_resync = false;
    }

    pub fn apply_event(&mut self, event: &SyncEvent) -> ApplyOutcome {
        if self.needs_resync {
            return ApplyOutcome::ResyncNeeded;
        }

        let outcome = match &event.payload {
            EventPayload::OrderCreated { order } => self.on_order_created(order),
            EventPayload::ItemsAdded {
                order_id,
                items,
                total,
                ..
            } => self.on_items_added(order_id, items, *total),
            EventPayload::ItemStatusChanged {
                order_id,
                item_id,
                status,
                version,
                cancel_reason,
                updated_at,
                total,
                ..
            } => match self.order_mut(order_id) {
                Some(order) => match order.item_mut(item_id) {
                    Some(item) if *version <= item.version => ApplyOutcome::Stale,
                    Some(item) if *version == item.version + 1 => {
                        item.status = *status;
                        item.version = *version;
                        item.cancel_reason = cancel_reason.clone();
                        item.updated_by = event.operator.clone();
                        item.updated_at = *updated_at;
                        order.total = *total;
                        ApplyOutcome::Applied
                    }
                    _ => ApplyOutcome::ResyncNeeded,
                },
                None => ApplyOutcome::ResyncNeeded,
            },
            EventPayload::TableStatusChanged { table_id, status } => {
                self.table_mut(*table_id).table.status = *status;
                ApplyOutcome::Applied
            }
            EventPayload::OrderCompleted {
                order_id, table_id, ..
            } => {
                let view = self.table_mut(*table_id);
                if view.order.as_ref().is_some_and(|o| &o.id == order_id) {
                    view.order = None;
                    view.table.active_order_id = None;
                    ApplyOutcome::Applied
                } else {
                    ApplyOutcome::Stale
                }
            }
            EventPayload::OrderTransferred {
                order_id,
                from_table_id,
                to_table_id,
            } => self.on_order_transferred(order_id, *from_table_id, *to_table_id),
        };

        if outcome == ApplyOutcome::ResyncNeeded {
            tracing::debug!(
                sequence = event.sequence,
                event_type = event.payload.event_type(),
                "Replica out of step, waiting for snapshot"
            );
            self.needs_resync = true;
        }
        outcome
    }

    fn on_order_created(&mut self, order: &Order) -> ApplyOutcome {
        if self.order(&order.id).is_some() {
            return ApplyOutcome::Stale;
        }
        let view = self.table_mut(order.table_id);
        view.table.active_order_id = Some(order.id.clone());
        view.order = Some(order.clone());
        ApplyOutcome::Applied
    }

    fn on_items_added(
        &mut self,
        order_id: &str,
        items: &[OrderItem],
        total: rust_decimal::Decimal,
    ) -> ApplyOutcome {
        let Some(order) = self.order_mut(order_id) else {
            return ApplyOutcome::ResyncNeeded;
        };
        let mut added = false;
        for item in items {
            if order.item(&item.id).is_none() {
                order.items.push(item.clone());
                added = true;
            }
        }
        if !added {
            return ApplyOutcome::Stale;
        }
        order.total = total;
        ApplyOutcome::Applied
    }

    fn on_order_transferred(&mut self, order_id: &str, from: TableId, to: TableId) -> ApplyOutcome {
        let at_target = self
            .tables
            .get(&to)
            .and_then(|view| view.order.as_ref())
            .is_some_and(|o| o.id == order_id);
        if at_target {
            return ApplyOutcome::Stale;
        }

        let source = self.table_mut(from);
        if !source.order.as_ref().is_some_and(|o| o.id == order_id) {
            return ApplyOutcome::ResyncNeeded;
        }
        let Some(mut order) = source.order.take() else {
            return ApplyOutcome::ResyncNeeded;
        };
        source.table.active_order_id = None;

        order.table_id = to;
        let target = self.table_mut(to);
        target.table.active_order_id = Some(order.id.clone());
        target.order = Some(order);
        ApplyOutcome::Applied
    }

    fn order_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.tables
            .values_mut()
            .filter_map(|view| view.order.as_mut())
            .find(|order| order.id == order_id)
    }

    fn table_mut(&mut self, table_id: TableId) -> &mut TableView {
        self.tables.entry(table_id).or_insert_with(|| TableView {
            table: DiningTable::new(table_id),
            order: None,
        })
    }
}
