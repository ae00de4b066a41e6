//! 数据库初始化
//!
//! 建立所需索引并在管理员不存在时创建默认管理员，可重复执行。

use crate::auth::hash_password;
use chrono::Utc;
use mldm_core::{Result, UserRecord, UserRole};
use mldm_database::{DocumentStore, IndexSpec, MetadataStore};
use std::fmt;
use tracing::info;

/// 默认管理员凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "securepassword123".to_string(),
        }
    }
}

impl AdminCredentials {
    /// 读取 ADMIN_USERNAME / ADMIN_PASSWORD，未设置时使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            username: lookup("ADMIN_USERNAME").unwrap_or(defaults.username),
            password: lookup("ADMIN_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// 初始化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// 新建了管理员
    AdminCreated,
    /// 管理员已存在
    AdminExists,
}

impl fmt::Display for SeedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedOutcome::AdminCreated => write!(f, "Admin user created."),
            SeedOutcome::AdminExists => write!(f, "Admin user already exists."),
        }
    }
}

/// 建立索引并创建默认管理员
pub fn initialize_database(
    store: &mut DocumentStore,
    credentials: &AdminCredentials,
) -> Result<SeedOutcome> {
    let settings = store.settings().clone();
    info!("初始化数据库: {}", settings.db_name);

    store.create_index(&settings.user_collection, IndexSpec::unique("username"))?;
    store.create_index(&settings.dataset_collection, IndexSpec::unique("image_id"))?;
    store.create_index(&settings.dataset_collection, IndexSpec::new("version"))?;
    store.create_index(&settings.dataset_collection, IndexSpec::new("split"))?;

    if store.find_user(&credentials.username)?.is_some() {
        info!("管理员已存在: {}", credentials.username);
        return Ok(SeedOutcome::AdminExists);
    }

    let admin = UserRecord {
        username: credentials.username.clone(),
        password_hash: hash_password(&credentials.password)?,
        role: UserRole::Admin,
        created_at: Utc::now(),
    };
    store.insert_user(&admin)?;

    info!("已创建管理员: {}", admin.username);
    Ok(SeedOutcome::AdminCreated)
}
