//! 快照归档
//!
//! 将整个目录树完整复制到以时间戳命名的新目录。快照创建后不再修改。

use chrono::{DateTime, Local};
use mldm_core::utils::{hash_file, snapshot_timestamp};
use mldm_core::{MldmError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// 快照目录名前缀
pub const SNAPSHOT_PREFIX: &str = "snapshot_";

/// 快照文件条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFileEntry {
    /// 相对快照根目录的路径
    pub relative_path: PathBuf,
    /// 文件大小
    pub size: u64,
    /// 文件哈希值
    pub hash: String,
}

/// 快照信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// 快照名称（snapshot_<时间戳>）
    pub name: String,
    /// 快照目录
    pub path: PathBuf,
    /// 源目录
    pub source: PathBuf,
    pub created_at: DateTime<Local>,
    /// 文件数量
    pub file_count: u64,
    /// 数据大小
    pub total_size: u64,
    /// 文件清单
    pub file_manifest: Vec<SnapshotFileEntry>,
}

impl std::fmt::Display for SnapshotInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot created: {}", self.path.display())
    }
}

/// 快照管理器
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    source_root: PathBuf,
    snapshots_root: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(source_root: P, snapshots_root: Q) -> Self {
        Self {
            source_root: source_root.into(),
            snapshots_root: snapshots_root.into(),
        }
    }

    /// 指定时间对应的快照目录
    pub fn snapshot_path(&self, time: &DateTime<Local>) -> PathBuf {
        self.snapshots_root
            .join(format!("{}{}", SNAPSHOT_PREFIX, snapshot_timestamp(time)))
    }

    /// 以指定时间创建快照
    ///
    /// 源目录不存在或目标目录已存在时返回错误，已有快照不受影响。
    pub fn create_snapshot(&self, time: DateTime<Local>) -> Result<SnapshotInfo> {
        if !self.source_root.is_dir() {
            return Err(MldmError::NotFound(format!(
                "快照源目录不存在: {}",
                self.source_root.display()
            )));
        }

        let target = self.snapshot_path(&time);
        fs::create_dir_all(&self.snapshots_root)?;

        // create_dir在目标已存在时失败，保证不会覆盖已有快照
        if let Err(e) = fs::create_dir(&target) {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                return Err(MldmError::SnapshotExists(target.display().to_string()));
            }
            return Err(e.into());
        }

        info!("开始创建快照: {:?} -> {:?}", self.source_root, target);
        let file_manifest = copy_tree(&self.source_root, &target)?;

        let total_size = file_manifest.iter().map(|e| e.size).sum();
        let info = SnapshotInfo {
            name: file_name_of(&target),
            path: target,
            source: self.source_root.clone(),
            created_at: time,
            file_count: file_manifest.len() as u64,
            total_size,
            file_manifest,
        };

        info!(
            "快照创建完成: {} (文件: {}, 大小: {} bytes)",
            info.name, info.file_count, info.total_size
        );
        Ok(info)
    }

    /// 列出已有快照目录，按名称排序
    pub fn list_snapshots(&self) -> Result<Vec<PathBuf>> {
        if !self.snapshots_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots: Vec<PathBuf> = fs::read_dir(&self.snapshots_root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir() && file_name_of(path).starts_with(SNAPSHOT_PREFIX))
            .collect();
        snapshots.sort();
        Ok(snapshots)
    }
}

/// 递归复制目录树，目标根目录必须已存在
fn copy_tree(source: &Path, target: &Path) -> Result<Vec<SnapshotFileEntry>> {
    let mut manifest = Vec::new();

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| MldmError::Storage(format!("遍历目录失败: {}", e)))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| MldmError::Storage(format!("路径计算失败: {}", e)))?
            .to_path_buf();
        let destination = target.join(&relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
            continue;
        }

        let size = fs::copy(entry.path(), &destination)?;
        let hash = hash_file(&destination)?;
        debug!("已复制: {:?} ({} bytes)", relative, size);

        manifest.push(SnapshotFileEntry {
            relative_path: relative,
            size,
            hash,
        });
    }

    Ok(manifest)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
