//! 核心数据模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 影像处理状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// 已脱敏
    Anonymized,
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageStatus::Anonymized => write!(f, "anonymized"),
        }
    }
}

/// 单个已导入影像的元数据记录
///
/// 每个成功导入的文件生成一条，只追加不修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageMetadataRecord {
    /// 原始文件名
    pub filename: String,
    /// 脱敏后文件内容的SHA-256（小写十六进制）
    pub hash: String,
    /// 脱敏后文件的存储路径
    pub path: String,
    pub status: ImageStatus,
}

/// 用户角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// 管理员
    Admin,
    /// 放射科医生
    Radiologist,
    /// 只读用户
    Viewer,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Radiologist => write!(f, "radiologist"),
            UserRole::Viewer => write!(f, "viewer"),
        }
    }
}

/// 用户记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// 加盐哈希（PHC字符串）
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// 数据集划分结果
///
/// 三个子集互不相交，并集恰好是输入文件集合。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAssignment {
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
}

impl SplitAssignment {
    /// 文件总数
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    /// 按子集名称迭代
    pub fn subsets(&self) -> [(&'static str, &[String]); 3] {
        [
            ("train", self.train.as_slice()),
            ("val", self.val.as_slice()),
            ("test", self.test.as_slice()),
        ]
    }
}
