//! Table API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/tables | GET | 所有餐桌状态 |
//! | /api/tables/{id} | GET | 餐桌汇总 (订单、金额、菜品数) |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/tables", get(handler::list))
        .route("/api/tables/{id}", get(handler::get_summary))
}
