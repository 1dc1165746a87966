//! Per-item version tokens
//!
//! Every transition names the version it was based on. The guard compares it
//! with the item's current version and, on match, produces the mutated copy
//! with the version bumped by exactly one. The copy is committed by the
//! caller only after it has been persisted, while still holding the slot lock
//! of the table that owns the order.

use shared::order::OrderItem;

use super::manager::{ManagerError, ManagerResult};

/// Fail with `VersionConflict` unless `expected` is the item's current version
pub fn check_version(item: &OrderItem, expected: u64) -> ManagerResult<()> {
    if item.version == expected {
        Ok(())
    } else {
        Err(ManagerError::VersionConflict {
            item_id: item.id.clone(),
            expected,
            actual: item.version,
        })
    }
}

/// Compare-and-apply on a copy of `current`
///
/// `mutate` runs only when the versions match; its error aborts the whole
/// operation and `current` is left untouched either way.
pub fn compare_and_apply<F>(current: &OrderItem, expected: u64, mutate: F) -> ManagerResult<OrderItem>
where
    F: FnOnce(&mut OrderItem) -> ManagerResult<()>,
{
    check_version(current, expected)?;
    let mut next = current.clone();
    mutate(&mut next)?;
    next.version = current.version + 1;
    Ok(next)
}
