//! 用户认证
//!
//! 密码以 Argon2id 加盐哈希（PHC字符串）保存。用户不存在时仍对
//! 空密码哈希做一次校验。

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use mldm_core::{MldmError, Result, UserRecord};
use mldm_database::MetadataStore;
use std::sync::OnceLock;
use tracing::{info, warn};

static EMPTY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn empty_hash() -> Option<&'static str> {
    EMPTY_HASH
        .get_or_init(|| hash_password("").ok())
        .as_deref()
}

/// 以随机盐计算密码哈希
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| MldmError::Authentication(format!("密码哈希失败: {}", e)))?;
    Ok(hash.to_string())
}

/// 校验密码；哈希为空或格式错误时返回 false
pub fn verify_password(password: &str, stored_hash: Option<&str>) -> bool {
    let Some(stored) = stored_hash.or_else(|| empty_hash()) else {
        return false;
    };
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    let matched = Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok();
    // 用户不存在时即使空密码匹配也视为失败
    matched && stored_hash.is_some()
}

/// 登录服务
pub struct AuthService<'a> {
    store: &'a dyn MetadataStore,
}

impl<'a> AuthService<'a> {
    pub fn new(store: &'a dyn MetadataStore) -> Self {
        Self { store }
    }

    /// 校验用户名和密码，成功时返回用户记录
    pub fn login(&self, username: &str, password: &str) -> Result<UserRecord> {
        let user = self.store.find_user(username)?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.as_str());

        if !verify_password(password, stored_hash) {
            warn!("登录失败: {}", username);
            return Err(MldmError::Authentication("invalid credentials".to_string()));
        }

        match user {
            Some(user) => {
                info!("登录成功: {} ({})", user.username, user.role);
                Ok(user)
            }
            None => Err(MldmError::Authentication("invalid credentials".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mldm_core::UserRole;
    use mldm_database::{DocumentStore, StoreSettings};

    fn store_with_user(username: &str, password: &str) -> DocumentStore {
        let mut store = DocumentStore::in_memory(StoreSettings::default());
        let user = UserRecord {
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            role: UserRole::Radiologist,
            created_at: Utc::now(),
        };
        store.insert_user(&user).unwrap();
        store
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(verify_password("secret", Some(&a)));
        assert!(!verify_password("wrong", Some(&a)));
    }

    #[test]
    fn test_unknown_user_never_verifies() {
        assert!(!verify_password("", None));
        assert!(!verify_password("anything", None));
    }

    #[test]
    fn test_malformed_hash() {
        assert!(!verify_password("secret", Some("plaintext")));
    }

    #[test]
    fn test_login() {
        let store = store_with_user("alice", "pw123");
        let auth = AuthService::new(&store);

        let user = auth.login("alice", "pw123").unwrap();
        assert_eq!(user.role, UserRole::Radiologist);

        assert!(matches!(
            auth.login("alice", "nope"),
            Err(MldmError::Authentication(_))
        ));
        assert!(matches!(
            auth.login("bob", "pw123"),
            Err(MldmError::Authentication(_))
        ));
    }
}
