//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - PIN 登录
//! - [`menu`] - 菜单查询
//! - [`orders`] - 订单命令与查询
//! - [`tables`] - 餐桌查询
//! - [`sync`] - 看板实时同步 (WebSocket)

pub mod auth;
pub mod health;
pub mod menu;
pub mod orders;
pub mod sync;
pub mod tables;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// 汇总所有路由
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(menu::router())
        .merge(orders::router())
        .merge(tables::router())
        .merge(sync::router())
}
