//! Edge Server - 餐厅订单生命周期与看板实时同步
//!
//! # 架构概述
//!
//! - **订单核心** (`orders`): 菜品状态机、乐观版本控制、按桌加锁、redb 持久化
//! - **同步总线** (`message`): 按角色过滤的事件扇出，每个看板独立有界队列
//! - **认证** (`auth`): PIN 登录 + JWT
//! - **HTTP API** (`api`): 命令、查询、WebSocket
//!
//! # 模块结构
//!
//! ```text
//! edge-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT 认证
//! ├── services/      # 菜单、员工、初始化数据
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 错误响应、日志
//! ├── message/       # 同步总线
//! └── orders/        # 订单核心
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod message;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentStaff, JwtService};
pub use core::{Config, Server, ServerState};
pub use message::{Subscription, SyncBus};
pub use orders::{OrdersManager, RedbStore};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境：加载 .env，初始化日志
pub fn setup_environment() -> anyhow::Result<()> {
    // .env 可选
    let _ = dotenv::dotenv();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(&level, json, log_dir.as_deref())
}

pub fn print_banner() {
    println!(
        r#"
    ______    __
   / ____/___/ /___ ____
  / __/ / __  / __ `/ _ \
 / /___/ /_/ / /_/ /  __/
/_____/\__,_/\__, /\___/
            /____/   orders
    "#
    );
}
