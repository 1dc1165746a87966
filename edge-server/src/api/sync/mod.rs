//! Sync API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/sync/ws?token= | GET | 看板 WebSocket：先快照，后增量 |
//! | /api/sync/snapshot | GET | 当前角色的完整快照 (HTTP) |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sync", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/ws", get(handler::dashboard_ws))
        .route("/snapshot", get(handler::get_snapshot))
}
