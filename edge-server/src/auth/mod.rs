//! 认证模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentStaff`] - 当前员工 (请求提取器)

pub mod extractor;
pub mod jwt;

pub use extractor::CurrentStaff;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
