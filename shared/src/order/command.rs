//! Order commands and responses
//!
//! Every mutation a dashboard can request travels as an [`OrderCommand`] and
//! is answered with a [`CommandResponse`].

use serde::{Deserialize, Serialize};

use super::types::{CompletedOrder, ItemRequest, ItemStatus, Order, OrderItem, PaymentInput};
use crate::models::{DiningTable, StaffIdentity, TableId};

/// Command executed on behalf of a staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    pub command_id: String,
    pub operator: StaffIdentity,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(operator: StaffIdentity, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator,
            payload,
        }
    }
}

/// Command body as sent by a dashboard; the operator comes from its session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    pub payload: OrderCommandPayload,
}

impl CommandRequest {
    pub fn into_command(self, operator: StaffIdentity) -> OrderCommand {
        OrderCommand {
            command_id: self
                .command_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            operator,
            payload: self.payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    CreateOrder {
        table_id: TableId,
        items: Vec<ItemRequest>,
    },
    AddItems {
        order_id: String,
        items: Vec<ItemRequest>,
    },
    TransitionItem {
        order_id: String,
        item_id: String,
        target: ItemStatus,
        /// Version the client last observed
        expected_version: u64,
        /// Required when cancelling
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    CloseOrder {
        order_id: String,
        /// Defaults to cash without discount
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment: Option<PaymentInput>,
    },
    TransferOrder {
        from_table_id: TableId,
        to_table_id: TableId,
    },
    SetTableReserved {
        table_id: TableId,
        reserved: bool,
    },
}

/// Successful command outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandResult {
    Order(Order),
    Item(OrderItem),
    Completed(CompletedOrder),
    Transferred { from: DiningTable, to: DiningTable },
    Table(DiningTable),
}

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, result: CommandResult) -> Self {
        Self {
            command_id,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

/// Command error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes (前端负责本地化)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    InvalidTable,
    EmptyOrder,
    IllegalTransition,
    VersionConflict,
    SourceNotActive,
    TargetOccupied,
    OrderNotSettleable,
    Unauthorized,
    PersistenceFailure,
    OrderNotFound,
    ItemNotFound,
    MenuItemNotFound,
    OrderNotOpen,
    CancelReasonRequired,
    InvalidOperation,
}

impl CommandErrorCode {
    /// Expected outcomes of concurrent use, not system faults.
    ///
    /// The dashboard refetches and retries, or tells the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CommandErrorCode::VersionConflict | CommandErrorCode::Unauthorized
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_transition_payload_wire_format() {
        let json = r#"{
            "type": "TRANSITION_ITEM",
            "order_id": "o1",
            "item_id": "i1",
            "target": "IN_PROGRESS",
            "expected_version": 3
        }"#;
        let payload: OrderCommandPayload = serde_json::from_str(json).unwrap();
        match payload {
            OrderCommandPayload::TransitionItem {
                target,
                expected_version,
                reason,
                ..
            } => {
                assert_eq!(target, ItemStatus::InProgress);
                assert_eq!(expected_version, 3);
                assert!(reason.is_none());
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_request_without_id_gets_one() {
        let req = CommandRequest {
            command_id: None,
            payload: OrderCommandPayload::TransferOrder {
                from_table_id: 1,
                to_table_id: 2,
            },
        };
        let cmd = req.into_command(StaffIdentity::new("w1", "Ana", Role::Waiter));
        assert!(!cmd.command_id.is_empty());
        assert_eq!(cmd.operator.role, Role::Waiter);
    }

    #[test]
    fn test_recoverable_codes() {
        assert!(CommandErrorCode::VersionConflict.is_recoverable());
        assert!(CommandErrorCode::Unauthorized.is_recoverable());
        assert!(!CommandErrorCode::PersistenceFailure.is_recoverable());
        assert!(!CommandErrorCode::IllegalTransition.is_recoverable());
    }
}
