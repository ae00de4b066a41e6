//! 通用工具函数

use crate::Result;
use chrono::{DateTime, TimeZone};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// 快照目录名使用的时间格式（秒级）
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 计算文件内容的SHA-256，返回小写十六进制字符串
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// 计算内存数据的SHA-256
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// 格式化快照时间戳
pub fn snapshot_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()
}

/// 判断文件扩展名是否匹配（区分大小写）
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}
