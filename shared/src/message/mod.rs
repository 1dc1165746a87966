//! 同步通道消息类型定义
//!
//! 服务端推送 [`SyncMessage`]，看板回发 [`ClientMessage`]。
//! 每次（重新）连接的第一条消息总是完整快照。

use serde::{Deserialize, Serialize};

use crate::order::{DashboardSnapshot, SyncEvent};

/// Server → dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMessage {
    /// Complete role-filtered state; replaces everything held locally
    Snapshot(DashboardSnapshot),
    Event(SyncEvent),
    /// The subscriber fell behind and its queue was dropped
    ResyncRequired,
}

impl SyncMessage {
    pub fn is_snapshot(&self) -> bool {
        matches!(self, SyncMessage::Snapshot(_))
    }
}

/// Dashboard → server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Ask for a fresh snapshot
    Resync,
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"RESYNC"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Resync);
    }

    #[test]
    fn test_resync_required_wire_format() {
        let json = serde_json::to_string(&SyncMessage::ResyncRequired).unwrap();
        assert_eq!(json, r#"{"type":"RESYNC_REQUIRED"}"#);
    }
}
