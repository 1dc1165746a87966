//! 实时同步总线
//!
//! # 架构
//!
//! ```text
//! OrdersManager ──publish()──▶ SyncBus ──narrow_event(role)──┬──▶ SubscriberQueue (KITCHEN)
//!   (slot lock held)            sequence++                   ├──▶ SubscriberQueue (BAR)
//!                                                            └──▶ SubscriberQueue (WAITER)
//!                                                                   │ bounded, non-blocking
//!                                                                   ▼
//!                                                             Subscription::recv()
//! ```
//!
//! Publishing only enqueues, so a slow or gone dashboard never holds up a
//! mutation or another dashboard. Every publish happens under the slot lock
//! of the table it concerns; this is what keeps per-item events in version
//! order and what makes a snapshot's sequence an exact cut.

use dashmap::DashMap;
use shared::models::{Role, StaffIdentity};
use shared::order::{EventPayload, Order, SyncEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

use super::subscription::{SubscriberQueue, Subscription};
use crate::orders::role_filter;

/// Default per-subscriber queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
struct BusInner {
    subscribers: DashMap<u64, Arc<SubscriberQueue>>,
    next_subscriber_id: AtomicU64,
    sequence: AtomicU64,
    capacity: usize,
    shutdown_token: CancellationToken,
}

/// 同步总线 - 负责事件扇出
#[derive(Debug, Clone)]
pub struct SyncBus {
    inner: Arc<BusInner>,
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl SyncBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: DashMap::new(),
                next_subscriber_id: AtomicU64::new(1),
                sequence: AtomicU64::new(0),
                capacity,
                shutdown_token: CancellationToken::new(),
            }),
        }
    }

    /// Stamp and fan out one event
    ///
    /// Must be called while holding the slot lock of the table the event
    /// concerns.
    pub fn publish(&self, operator: &StaffIdentity, payload: EventPayload) -> SyncEvent {
        self.fan_out(operator, payload, None)
    }

    /// Publish an item event together with its order, so station roles get
    /// a total over their own items
    pub fn publish_for_order(
        &self,
        operator: &StaffIdentity,
        payload: EventPayload,
        order: &Order,
    ) -> SyncEvent {
        self.fan_out(operator, payload, Some(order))
    }

    fn fan_out(
        &self,
        operator: &StaffIdentity,
        payload: EventPayload,
        order: Option<&Order>,
    ) -> SyncEvent {
        let event = SyncEvent {
            sequence: self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            timestamp: shared::util::now_millis(),
            operator: operator.clone(),
            payload,
        };

        for entry in self.inner.subscribers.iter() {
            let queue = entry.value();
            let narrowed = match order {
                Some(order) => role_filter::narrow_order_event(&event, queue.role, order),
                None => role_filter::narrow_event(&event, queue.role),
            };
            if let Some(narrowed) = narrowed {
                queue.push(narrowed);
            }
        }

        tracing::debug!(
            sequence = event.sequence,
            event_type = event.payload.event_type(),
            order_id = event.payload.order_id().unwrap_or("-"),
            "Event published"
        );
        event
    }

    /// Last sequence handed out
    pub fn current_sequence(&self) -> u64 {
        self.inner.sequence.load(Ordering::SeqCst)
    }

    /// Register a queue in the syncing phase
    pub(crate) fn register(&self, role: Role) -> Subscription {
        let id = self
            .inner
            .next_subscriber_id
            .fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(SubscriberQueue::new(id, role, self.inner.capacity));
        if self.inner.shutdown_token.is_cancelled() {
            queue.close();
        } else {
            self.inner.subscribers.insert(id, queue.clone());
        }
        tracing::info!(subscriber_id = id, role = %role, "Dashboard subscribed");
        Subscription {
            queue,
            bus: self.clone(),
        }
    }

    pub(crate) fn unregister(&self, id: u64) {
        if self.inner.subscribers.remove(&id).is_some() {
            tracing::info!(subscriber_id = id, "Dashboard unsubscribed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Close every subscription; `recv` returns `None` afterwards
    pub fn shutdown(&self) {
        self.inner.shutdown_token.cancel();
        for entry in self.inner.subscribers.iter() {
            entry.value().close();
        }
        tracing::info!("Sync bus shut down");
    }
}
