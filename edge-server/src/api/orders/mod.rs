//! Order API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders/command | POST | 执行订单命令 |
//! | /api/orders/active | GET | 进行中的订单 (按角色过滤) |
//! | /api/orders/completed | GET | 已结账订单 (按角色过滤) |
//! | /api/orders/{id} | GET | 单个订单 |
//! | /api/orders/{id}/items/{item_id}/actions | GET | 当前角色可执行的操作 |
//!
//! 全部需要 Bearer 令牌。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/command", post(handler::execute_command))
        .route("/active", get(handler::active_orders))
        .route("/completed", get(handler::completed_orders))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/items/{item_id}/actions", get(handler::permitted_actions))
}
