//! # 数据集管理运维模块
//!
//! 提供配置加载与验证、日志初始化、用户认证和数据库初始化等功能

pub mod auth;
pub mod config;
pub mod logging;
pub mod seed;

pub use auth::{hash_password, verify_password, AuthService};
pub use config::{ConfigValidator, Settings};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use seed::{initialize_database, AdminCredentials, SeedOutcome};
