//! Item state machine and table status derivation
//!
//! ```text
//! PENDING --start--> IN_PROGRESS --finish--> READY --serve--> SERVED
//! PENDING --cancel--> CANCELLED
//! IN_PROGRESS --cancel--> CANCELLED
//! ```

use shared::models::TableStatus;
use shared::order::{ItemAction, ItemStatus, Order};

use super::manager::{ManagerError, ManagerResult};

/// Next status for `action`, or `IllegalTransition`
pub fn next_status(from: ItemStatus, action: ItemAction) -> ManagerResult<ItemStatus> {
    let allowed = matches!(
        (from, action),
        (ItemStatus::Pending, ItemAction::Start)
            | (ItemStatus::InProgress, ItemAction::Finish)
            | (ItemStatus::Ready, ItemAction::Serve)
            | (ItemStatus::Pending, ItemAction::Cancel)
            | (ItemStatus::InProgress, ItemAction::Cancel)
    );
    if allowed {
        Ok(action.target())
    } else {
        Err(ManagerError::IllegalTransition {
            from,
            to: action.target(),
        })
    }
}

/// Resolve a requested target status into the action that reaches it
pub fn action_for(from: ItemStatus, target: ItemStatus) -> ManagerResult<ItemAction> {
    ItemAction::for_target(target).ok_or(ManagerError::IllegalTransition { from, to: target })
}

/// Actions legal from `status`, ignoring who asks
pub fn legal_actions(status: ItemStatus) -> impl Iterator<Item = ItemAction> {
    ItemAction::ALL
        .into_iter()
        .filter(move |action| next_status(status, *action).is_ok())
}

/// Status of a table given its active order
///
/// With no order the table is EMPTY, or RESERVED while held.
pub fn table_status(order: Option<&Order>, reserved: bool) -> TableStatus {
    match order {
        Some(order) => order.table_status(),
        None if reserved => TableStatus::Reserved,
        None => TableStatus::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [ItemStatus; 5] = [
        ItemStatus::Pending,
        ItemStatus::InProgress,
        ItemStatus::Ready,
        ItemStatus::Served,
        ItemStatus::Cancelled,
    ];

    #[test]
    fn test_happy_path() {
        let mut status = ItemStatus::Pending;
        for action in [ItemAction::Start, ItemAction::Finish, ItemAction::Serve] {
            status = next_status(status, action).unwrap();
        }
        assert_eq!(status, ItemStatus::Served);
    }

    #[test]
    fn test_skipping_a_step_is_illegal() {
        let err = next_status(ItemStatus::Pending, ItemAction::Finish).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::IllegalTransition {
                from: ItemStatus::Pending,
                to: ItemStatus::Ready
            }
        ));
        assert!(next_status(ItemStatus::Pending, ItemAction::Serve).is_err());
        assert!(next_status(ItemStatus::InProgress, ItemAction::Serve).is_err());
    }

    #[test]
    fn test_ready_cannot_be_cancelled() {
        assert!(next_status(ItemStatus::Ready, ItemAction::Cancel).is_err());
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for status in ALL_STATUSES.into_iter().filter(|s| s.is_terminal()) {
            assert_eq!(legal_actions(status).count(), 0, "{:?}", status);
        }
    }

    #[test]
    fn test_pending_is_never_a_target() {
        for from in ALL_STATUSES {
            assert!(action_for(from, ItemStatus::Pending).is_err());
        }
    }

    #[test]
    fn test_empty_table_status() {
        assert_eq!(table_status(None, false), TableStatus::Empty);
        assert_eq!(table_status(None, true), TableStatus::Reserved);
    }
}
