use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::orders::{OrderStore, OrdersManager, RedbStore};
use crate::services::{CatalogService, SeedData, StaffService};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | manager | Arc<OrdersManager> | 订单核心 + 同步总线 |
/// | catalog | Arc<CatalogService> | 菜单缓存 |
/// | staff | Arc<StaffService> | 员工 PIN 登录 |
/// | jwt | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub manager: Arc<OrdersManager>,
    pub catalog: Arc<CatalogService>,
    pub staff: Arc<StaffService>,
    pub jwt: Arc<JwtService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 校验配置 (生产环境必须有 JWT_SECRET)
    /// 2. 创建工作目录并打开 `<WORK_DIR>/orders.redb`
    /// 3. 空库时导入 SEED_FILE
    /// 4. 从存储恢复餐桌与进行中的订单
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.validate().map_err(anyhow::Error::from)?;
        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = config.db_path();
        tracing::info!(path = %db_path.display(), "Opening order store");
        let store: Arc<dyn OrderStore> = Arc::new(RedbStore::open(&db_path)?);
        Self::with_store(config.clone(), store)
    }

    /// 使用给定存储构建状态 (测试可传入内存库)
    pub fn with_store(config: Config, store: Arc<dyn OrderStore>) -> Result<Self> {
        let catalog = Arc::new(CatalogService::load(store.as_ref())?);
        let staff = Arc::new(StaffService::load(store.as_ref())?);

        if let Some(seed_file) = &config.seed_file {
            SeedData::from_file(seed_file)?.apply_if_empty(store.as_ref(), &catalog, &staff)?;
        }
        if catalog.is_empty() {
            tracing::warn!("Menu is empty, orders cannot be placed until it is seeded");
        }

        let manager = Arc::new(OrdersManager::open(
            store,
            catalog.clone(),
            config.manager_config(),
        )?);
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self {
            config,
            manager,
            catalog,
            staff,
            jwt,
        })
    }

    pub fn orders_manager(&self) -> &Arc<OrdersManager> {
        &self.manager
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt.clone()
    }
}
