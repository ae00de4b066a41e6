//! 元数据存储操作接口

use crate::connection::DocumentStore;
use crate::models::*;
use mldm_core::{ImageMetadataRecord, MldmError, Result, UserRecord};
use serde_json::Value;

/// 流水线与登录使用的元数据存储接口
pub trait MetadataStore {
    /// 建立索引，返回是否新建
    fn create_index(&mut self, collection: &str, index: IndexSpec) -> Result<bool>;

    /// 追加一条影像元数据记录，返回文档ID
    fn insert_image(&mut self, record: &ImageMetadataRecord) -> Result<String>;

    /// 列出全部影像元数据记录
    fn list_images(&self) -> Result<Vec<ImageMetadataRecord>>;

    /// 按用户名查找用户
    fn find_user(&self, username: &str) -> Result<Option<UserRecord>>;

    /// 新增用户，返回文档ID
    fn insert_user(&mut self, user: &UserRecord) -> Result<String>;
}

impl MetadataStore for DocumentStore {
    fn create_index(&mut self, collection: &str, index: IndexSpec) -> Result<bool> {
        DocumentStore::create_index(self, collection, index)
    }

    fn insert_image(&mut self, record: &ImageMetadataRecord) -> Result<String> {
        let collection = self.settings().image_collection.clone();
        let document = serde_json::to_value(ImageDocument::new(record.clone()))?;
        self.insert(&collection, document)
    }

    fn list_images(&self) -> Result<Vec<ImageMetadataRecord>> {
        let collection = &self.settings().image_collection;
        self.documents(collection)
            .iter()
            .map(|doc| {
                serde_json::from_value::<ImageDocument>(doc.clone())
                    .map(ImageMetadataRecord::from)
                    .map_err(|e| MldmError::Database(format!("影像文档格式错误: {}", e)))
            })
            .collect()
    }

    fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let collection = &self.settings().user_collection;
        match self.find_one(collection, "username", &Value::from(username)) {
            Some(doc) => {
                let user: UserDocument = serde_json::from_value(doc.clone())
                    .map_err(|e| MldmError::Database(format!("用户文档格式错误: {}", e)))?;
                Ok(Some(user.into()))
            }
            None => Ok(None),
        }
    }

    fn insert_user(&mut self, user: &UserRecord) -> Result<String> {
        let collection = self.settings().user_collection.clone();
        let document = serde_json::to_value(UserDocument::new(user.clone()))?;
        self.insert(&collection, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::StoreSettings;
    use chrono::Utc;
    use mldm_core::{ImageStatus, UserRole};

    fn record(name: &str) -> ImageMetadataRecord {
        ImageMetadataRecord {
            filename: name.to_string(),
            hash: "0".repeat(64),
            path: format!("data/ingest/batch/{}", name),
            status: ImageStatus::Anonymized,
        }
    }

    #[test]
    fn test_insert_and_list_images() {
        let mut store = DocumentStore::in_memory(StoreSettings::default());

        store.insert_image(&record("a.dcm")).unwrap();
        store.insert_image(&record("b.dcm")).unwrap();

        let images = store.list_images().unwrap();
        assert_eq!(images, vec![record("a.dcm"), record("b.dcm")]);

        // 文档带有_id和status字段
        let doc = &store.documents("images")[0];
        assert!(doc.get(ID_FIELD).is_some());
        assert_eq!(doc["status"], "anonymized");
    }

    #[test]
    fn test_images_are_append_only() {
        let mut store = DocumentStore::in_memory(StoreSettings::default());

        // 相同内容重复插入不去重
        store.insert_image(&record("a.dcm")).unwrap();
        store.insert_image(&record("a.dcm")).unwrap();
        assert_eq!(store.list_images().unwrap().len(), 2);
    }

    #[test]
    fn test_find_user() {
        let mut store = DocumentStore::in_memory(StoreSettings::default());
        let user = UserRecord {
            username: "admin".to_string(),
            password_hash: "$argon2id$dummy".to_string(),
            role: UserRole::Admin,
            created_at: Utc::now(),
        };

        store.insert_user(&user).unwrap();

        let found = store.find_user("admin").unwrap().unwrap();
        assert_eq!(found.username, "admin");
        assert_eq!(found.role, UserRole::Admin);
        assert!(store.find_user("nobody").unwrap().is_none());
    }
}
