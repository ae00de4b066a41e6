//! 快照阶段

use crate::context::PipelineContext;
use chrono::{DateTime, Local};
use mldm_core::Result;
use mldm_storage::{SnapshotInfo, SnapshotManager};

/// 以当前时间为增强目录创建快照
pub fn export_snapshot(ctx: &PipelineContext) -> Result<SnapshotInfo> {
    export_snapshot_at(ctx, Local::now())
}

/// 以指定时间为增强目录创建快照，同一秒内重复调用返回错误
pub fn export_snapshot_at(ctx: &PipelineContext, time: DateTime<Local>) -> Result<SnapshotInfo> {
    SnapshotManager::new(&ctx.layout.augmented, &ctx.layout.snapshots).create_snapshot(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DataLayout;
    use chrono::TimeZone;
    use mldm_core::MldmError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_export_snapshot_twice_in_same_second() {
        let dir = TempDir::new().unwrap();
        let ctx = PipelineContext {
            layout: DataLayout::under(dir.path()),
            ..PipelineContext::default()
        };
        fs::create_dir_all(&ctx.layout.augmented).unwrap();
        fs::write(ctx.layout.augmented.join("scan_aug0.png"), b"v1").unwrap();
        let time = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let info = export_snapshot_at(&ctx, time).unwrap();
        assert_eq!(
            info.path,
            ctx.layout.snapshots.join("snapshot_20240506_070809")
        );
        assert_eq!(info.to_string(), format!("Snapshot created: {}", info.path.display()));

        fs::write(ctx.layout.augmented.join("scan_aug0.png"), b"v2").unwrap();
        let second = export_snapshot_at(&ctx, time);

        assert!(matches!(second, Err(MldmError::SnapshotExists(_))));
        assert_eq!(fs::read(info.path.join("scan_aug0.png")).unwrap(), b"v1");
    }

    #[test]
    fn test_export_snapshot_missing_source() {
        let dir = TempDir::new().unwrap();
        let ctx = PipelineContext {
            layout: DataLayout::under(dir.path()),
            ..PipelineContext::default()
        };

        assert!(matches!(export_snapshot(&ctx), Err(MldmError::NotFound(_))));
    }
}
