//! 错误定义模块

use thiserror::Error;

/// 数据集管理系统统一错误类型
#[derive(Error, Debug)]
pub enum MldmError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("唯一索引冲突: {collection}.{field} = {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    #[error("DICOM处理错误: {0}")]
    Dicom(String),

    #[error("DICOM解析错误: {0}")]
    DicomParse(String),

    #[error("图像处理错误: {0}")]
    Image(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("快照已存在: {0}")]
    SnapshotExists(String),

    #[error("认证失败: {0}")]
    Authentication(String),
}

/// 统一结果类型
pub type Result<T> = std::result::Result<T, MldmError>;
