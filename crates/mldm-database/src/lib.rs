//! # 元数据存储模块
//!
//! 以JSON文件持久化的文档数据库，保存用户记录和影像元数据记录。

pub mod connection;
pub mod models;
pub mod queries;

// 重新导出主要类型
pub use connection::{DocumentStore, StoreSettings};
pub use models::*;
pub use queries::MetadataStore;
