//! Per-subscriber bounded queue
//!
//! # Phases
//!
//! ```text
//!            begin_sync                finish_sync(snapshot)
//!   ┌──────────────────────► Syncing ─────────────────────────► Live
//!   │                          │ pending > capacity              │ buffer > capacity
//!   │                          ▼                                 ▼
//!   └───────────────────── Overflowed ◄──────────────────────────┘
//! ```
//!
//! While `Syncing`, published events are held in `pending` and replayed after
//! the snapshot (minus those the snapshot already reflects). Overflow drops
//! everything queued; the consumer then sees `ResyncRequired` until it resyncs.

use parking_lot::Mutex;
use shared::message::SyncMessage;
use shared::models::Role;
use shared::order::{DashboardSnapshot, SyncEvent};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

use super::bus::SyncBus;

#[derive(Debug)]
enum Phase {
    Syncing { pending: Vec<SyncEvent> },
    Live,
    Overflowed,
}

#[derive(Debug)]
struct QueueState {
    phase: Phase,
    buffer: VecDeque<SyncMessage>,
    closed: bool,
}

enum Poll {
    Message(SyncMessage),
    Closed,
    Empty,
}

#[derive(Debug)]
pub(crate) struct SubscriberQueue {
    pub(crate) id: u64,
    pub(crate) role: Role,
    capacity: usize,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl SubscriberQueue {
    pub(crate) fn new(id: u64, role: Role, capacity: usize) -> Self {
        Self {
            id,
            role,
            capacity: capacity.max(1),
            state: Mutex::new(QueueState {
                phase: Phase::Syncing {
                    pending: Vec::new(),
                },
                buffer: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Non-blocking enqueue; never waits on the consumer
    pub(crate) fn push(&self, event: SyncEvent) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.closed {
            return;
        }
        let overflow = match &mut state.phase {
            Phase::Syncing { pending } => {
                if pending.len() >= self.capacity {
                    true
                } else {
                    pending.push(event);
                    false
                }
            }
            Phase::Live => {
                if state.buffer.len() >= self.capacity {
                    true
                } else {
                    state.buffer.push_back(SyncMessage::Event(event));
                    false
                }
            }
            Phase::Overflowed => return,
        };
        if overflow {
            state.phase = Phase::Overflowed;
            state.buffer.clear();
            tracing::warn!(
                subscriber_id = self.id,
                role = %self.role,
                capacity = self.capacity,
                "Subscriber queue overflowed, forcing resync"
            );
        }
        drop(guard);
        self.notify.notify_one();
    }

    pub(crate) fn begin_sync(&self) {
        let mut state = self.state.lock();
        state.phase = Phase::Syncing {
            pending: Vec::new(),
        };
        state.buffer.clear();
    }

    /// Queue the snapshot followed by the events published after its cut
    ///
    /// Returns false if the queue overflowed while the snapshot was built.
    pub(crate) fn finish_sync(&self, snapshot: DashboardSnapshot) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let pending = match std::mem::replace(&mut state.phase, Phase::Live) {
            Phase::Syncing { pending } => pending,
            other => {
                state.phase = other;
                return false;
            }
        };
        let cut = snapshot.sequence;
        state.buffer.clear();
        state.buffer.push_back(SyncMessage::Snapshot(snapshot));
        state.buffer.extend(
            pending
                .into_iter()
                .filter(|event| event.sequence > cut)
                .map(SyncMessage::Event),
        );
        drop(guard);
        self.notify.notify_one();
        true
    }

    pub(crate) fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_one();
    }

    fn poll(&self) -> Poll {
        let mut state = self.state.lock();
        if state.closed {
            return Poll::Closed;
        }
        if matches!(state.phase, Phase::Overflowed) {
            return Poll::Message(SyncMessage::ResyncRequired);
        }
        match state.buffer.pop_front() {
            Some(message) => Poll::Message(message),
            None => Poll::Empty,
        }
    }

    fn is_overflowed(&self) -> bool {
        matches!(self.state.lock().phase, Phase::Overflowed)
    }
}

/// Live event stream for one dashboard connection
///
/// Created by `OrdersManager::subscribe`. The first message is always a
/// snapshot. Dropping it unregisters from the bus.
#[derive(Debug)]
pub struct Subscription {
    pub(crate) queue: Arc<SubscriberQueue>,
    pub(crate) bus: SyncBus,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.queue.id
    }

    pub fn role(&self) -> Role {
        self.queue.role
    }

    /// Next message; `None` once the bus shut down
    ///
    /// After an overflow this keeps returning `ResyncRequired` until
    /// `OrdersManager::resync` is called.
    pub async fn recv(&self) -> Option<SyncMessage> {
        loop {
            match self.queue.poll() {
                Poll::Message(message) => return Some(message),
                Poll::Closed => return None,
                Poll::Empty => self.queue.notify.notified().await,
            }
        }
    }

    /// Next message if one is queued
    pub fn try_recv(&self) -> Option<SyncMessage> {
        match self.queue.poll() {
            Poll::Message(message) => Some(message),
            Poll::Closed | Poll::Empty => None,
        }
    }

    pub fn needs_resync(&self) -> bool {
        self.queue.is_overflowed()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unregister(self.queue.id);
    }
}
