//! 服务层 - 服务器核心服务
//!
//! # 服务列表
//!
//! - [`CatalogService`] - 菜单查询（内存缓存）
//! - [`StaffService`] - 员工 PIN 登录
//! - [`SeedData`] - 空库初始化数据

pub mod catalog_service;
pub mod seed;
pub mod staff_service;

pub use catalog_service::{Catalog, CatalogService};
pub use seed::SeedData;
pub use staff_service::StaffService;
