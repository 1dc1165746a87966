use std::path::PathBuf;

use crate::auth::jwt::load_jwt_secret;
use crate::auth::{JwtConfig, JwtError};
use crate::orders::{ManagerConfig, RolePolicy};

/// 服务器配置 - 边缘节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境，production 时必须设置 JWT_SECRET |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
/// | TABLE_COUNT | 20 | 餐桌数量 |
/// | SYNC_QUEUE_CAPACITY | 256 | 每个看板的事件队列容量 |
/// | WAITER_CANCEL_IN_PROGRESS | false | 服务员可取消制作中的菜品 |
/// | SEED_FILE | (无) | 空库时导入的菜单/员工 JSON |
/// | JWT_SECRET | (开发环境随机) | JWT 密钥 |
/// | JWT_EXPIRATION_MINUTES | 720 | 令牌有效期 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/edge TABLE_COUNT=30 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 餐桌编号 1..=table_count
    pub table_count: u32,
    pub sync_queue_capacity: usize,
    pub waiter_cancel_in_progress: bool,
    pub seed_file: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok(),
            table_count: std::env::var("TABLE_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::orders::manager::DEFAULT_TABLE_COUNT),
            sync_queue_capacity: std::env::var("SYNC_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::message::DEFAULT_QUEUE_CAPACITY),
            waiter_cancel_in_progress: std::env::var("WAITER_CANCEL_IN_PROGRESS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            seed_file: std::env::var("SEED_FILE").ok(),
        }
    }

    /// 使用自定义工作目录，其余取环境变量
    ///
    /// 常用于测试场景
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    /// 订单数据库路径
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            table_count: self.table_count,
            queue_capacity: self.sync_queue_capacity,
            policy: RolePolicy {
                waiter_may_cancel_in_progress: self.waiter_cancel_in_progress,
            },
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 启动前检查：生产环境必须显式配置 JWT_SECRET，不使用临时密钥
    pub fn validate(&self) -> Result<(), JwtError> {
        if self.is_production() {
            load_jwt_secret()?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_allows_generated_secret() {
        let mut config = Config::with_work_dir("/tmp/edge-test");
        config.environment = "development".to_string();
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_manager_config_carries_policy() {
        let mut config = Config::with_work_dir("/tmp/edge-test");
        config.table_count = 7;
        config.sync_queue_capacity = 16;
        config.waiter_cancel_in_progress = true;

        let manager = config.manager_config();
        assert_eq!(manager.table_count, 7);
        assert_eq!(manager.queue_capacity, 16);
        assert!(manager.policy.waiter_may_cancel_in_progress);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/edge-test/orders.redb"));
    }
}
