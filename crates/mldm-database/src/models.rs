//! 文档模型
//!
//! 集合中的文档以`serde_json::Value`保存，这里定义带`_id`的类型化视图
//! 以及索引和集合的持久化结构。

use mldm_core::models::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 文档ID字段名
pub const ID_FIELD: &str = "_id";

/// 索引定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// 字段名
    pub field: String,
    /// 是否唯一
    pub unique: bool,
}

impl IndexSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unique: false,
        }
    }

    pub fn unique(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unique: true,
        }
    }
}

/// 单个集合
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
    #[serde(default)]
    pub documents: Vec<serde_json::Value>,
}

/// 数据库文件内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreContents {
    #[serde(default)]
    pub collections: BTreeMap<String, Collection>,
}

/// 影像集合中的文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub record: ImageMetadataRecord,
}

impl ImageDocument {
    pub fn new(record: ImageMetadataRecord) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            record,
        }
    }
}

impl From<ImageDocument> for ImageMetadataRecord {
    fn from(doc: ImageDocument) -> Self {
        doc.record
    }
}

/// 用户集合中的文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub user: UserRecord,
}

impl UserDocument {
    pub fn new(user: UserRecord) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user,
        }
    }
}

impl From<UserDocument> for UserRecord {
    fn from(doc: UserDocument) -> Self {
        doc.user
    }
}
