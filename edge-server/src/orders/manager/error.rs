use super::super::storage::StorageError;
use shared::models::TableId;
use shared::order::{CommandError, CommandErrorCode, ItemStatus};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Illegal transition: {from:?} -> {to:?}")]
    IllegalTransition { from: ItemStatus, to: ItemStatus },

    #[error("Version conflict on item {item_id}: expected {expected}, actual {actual}")]
    VersionConflict {
        item_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Table {0} has no active order")]
    SourceNotActive(TableId),

    #[error("Table {0} is not empty")]
    TargetOccupied(TableId),

    #[error("Order not settleable: {0}")]
    OrderNotSettleable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Order is no longer open: {0}")]
    OrderNotOpen(String),

    #[error("Cancellation requires a reason")]
    CancelReasonRequired,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl ManagerError {
    pub fn code(&self) -> CommandErrorCode {
        match self {
            ManagerError::InvalidTable(_) => CommandErrorCode::InvalidTable,
            ManagerError::EmptyOrder => CommandErrorCode::EmptyOrder,
            ManagerError::IllegalTransition { .. } => CommandErrorCode::IllegalTransition,
            ManagerError::VersionConflict { .. } => CommandErrorCode::VersionConflict,
            ManagerError::SourceNotActive(_) => CommandErrorCode::SourceNotActive,
            ManagerError::TargetOccupied(_) => CommandErrorCode::TargetOccupied,
            ManagerError::OrderNotSettleable(_) => CommandErrorCode::OrderNotSettleable,
            ManagerError::Unauthorized(_) => CommandErrorCode::Unauthorized,
            ManagerError::Persistence(_) => CommandErrorCode::PersistenceFailure,
            ManagerError::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
            ManagerError::ItemNotFound(_) => CommandErrorCode::ItemNotFound,
            ManagerError::MenuItemNotFound(_) => CommandErrorCode::MenuItemNotFound,
            ManagerError::OrderNotOpen(_) => CommandErrorCode::OrderNotOpen,
            ManagerError::CancelReasonRequired => CommandErrorCode::CancelReasonRequired,
            ManagerError::InvalidOperation(_) => CommandErrorCode::InvalidOperation,
        }
    }

    /// VersionConflict / Unauthorized are expected under concurrent use
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let code = err.code();
        if let ManagerError::Persistence(e) = &err {
            // 保留技术细节用于日志/调试
            tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
        }
        CommandError::new(code, err.to_string())
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
