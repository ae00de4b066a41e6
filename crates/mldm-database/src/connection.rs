//! 数据库连接管理
//!
//! 所有集合保存在同一个JSON文件`<dir>/<db_name>.json`中，文件不存在时视为空库。

use crate::models::{Collection, IndexSpec, StoreContents, ID_FIELD};
use mldm_core::{MldmError, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 存储连接配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// 数据库文件所在目录
    pub dir: PathBuf,
    /// 数据库名
    pub db_name: String,
    /// 用户集合
    pub user_collection: String,
    /// 数据集集合（初始化时建立索引）
    pub dataset_collection: String,
    /// 导入流水线写入的影像集合
    pub image_collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/db"),
            db_name: "ml_dataset_db".to_string(),
            user_collection: "users".to_string(),
            dataset_collection: "datasets".to_string(),
            image_collection: "images".to_string(),
        }
    }
}

impl StoreSettings {
    /// 从环境变量读取，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意键值查找函数构造
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            dir: lookup("METADATA_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            db_name: lookup("DB_NAME").unwrap_or(defaults.db_name),
            user_collection: lookup("USER_COLLECTION").unwrap_or(defaults.user_collection),
            dataset_collection: lookup("DATASET_COLLECTION")
                .unwrap_or(defaults.dataset_collection),
            image_collection: lookup("IMAGE_COLLECTION").unwrap_or(defaults.image_collection),
        }
    }

    /// 数据库文件路径
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.db_name))
    }
}

/// 文档数据库
#[derive(Debug)]
pub struct DocumentStore {
    settings: StoreSettings,
    /// None 表示纯内存模式
    path: Option<PathBuf>,
    contents: StoreContents,
}

impl DocumentStore {
    /// 打开数据库文件，不存在时创建空库
    pub fn open(settings: StoreSettings) -> Result<Self> {
        let path = settings.file_path();

        let contents = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("数据库文件不存在，创建新库: {:?}", path);
                StoreContents::default()
            }
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            settings,
            path: Some(path),
            contents,
        };
        store.save()?;
        Ok(store)
    }

    /// 纯内存数据库，不落盘
    pub fn in_memory(settings: StoreSettings) -> Self {
        Self {
            settings,
            path: None,
            contents: StoreContents::default(),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 保存到文件
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &self.contents)?;
        }
        fs::rename(&tmp_path, path)?;

        debug!("数据库已保存: {:?}", path);
        Ok(())
    }

    /// 集合是否存在
    pub fn has_collection(&self, name: &str) -> bool {
        self.contents.collections.contains_key(name)
    }

    /// 集合中的索引
    pub fn indexes(&self, collection: &str) -> &[IndexSpec] {
        self.contents
            .collections
            .get(collection)
            .map(|c| c.indexes.as_slice())
            .unwrap_or(&[])
    }

    /// 集合中的全部文档
    pub fn documents(&self, collection: &str) -> &[Value] {
        self.contents
            .collections
            .get(collection)
            .map(|c| c.documents.as_slice())
            .unwrap_or(&[])
    }

    /// 按字段精确匹配查找第一条文档
    pub fn find_one(&self, collection: &str, field: &str, value: &Value) -> Option<&Value> {
        self.documents(collection)
            .iter()
            .find(|doc| doc.get(field) == Some(value))
    }

    /// 建立索引，已存在时不做任何修改；返回是否新建
    pub fn create_index(&mut self, collection: &str, index: IndexSpec) -> Result<bool> {
        let coll = self
            .contents
            .collections
            .entry(collection.to_string())
            .or_default();

        if coll.indexes.iter().any(|i| i.field == index.field) {
            return Ok(false);
        }

        if index.unique {
            check_unique_existing(collection, coll, &index.field)?;
        }

        info!("创建索引: {}.{} (unique: {})", collection, index.field, index.unique);
        coll.indexes.push(index);
        self.save()?;
        Ok(true)
    }

    /// 插入文档，返回文档ID
    ///
    /// 唯一索引只对包含该字段的文档生效。
    pub fn insert(&mut self, collection: &str, document: Value) -> Result<String> {
        let id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MldmError::Database(format!("文档缺少{}字段", ID_FIELD)))?;

        let coll = self
            .contents
            .collections
            .entry(collection.to_string())
            .or_default();

        let mut unique_fields: Vec<&str> = coll
            .indexes
            .iter()
            .filter(|i| i.unique)
            .map(|i| i.field.as_str())
            .collect();
        unique_fields.push(ID_FIELD);

        for field in unique_fields {
            let Some(value) = document.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            if coll.documents.iter().any(|doc| doc.get(field) == Some(value)) {
                return Err(MldmError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        coll.documents.push(document);
        self.save()?;
        Ok(id)
    }
}

fn check_unique_existing(collection: &str, coll: &Collection, field: &str) -> Result<()> {
    let mut seen: Vec<&Value> = Vec::new();
    for value in coll
        .documents
        .iter()
        .filter_map(|doc| doc.get(field))
        .filter(|v| !v.is_null())
    {
        if seen.contains(&value) {
            return Err(MldmError::DuplicateKey {
                collection: collection.to_string(),
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        seen.push(value);
    }
    Ok(())
}
