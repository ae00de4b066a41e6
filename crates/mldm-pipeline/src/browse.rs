//! 阶段浏览与统计

use crate::context::DataLayout;
use crate::ingest::DICOM_EXTENSION;
use mldm_core::{MldmError, Result};
use mldm_dicom::DicomRecord;
use mldm_storage::list_files_where;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// 可浏览的影像扩展名（不区分大小写）
pub const BROWSABLE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "dcm"];

/// 统计尺寸时的采样数量
pub const STATISTICS_SAMPLE_SIZE: usize = 10;

/// 流水线阶段目录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Raw,
    Anonymized,
    Augmented,
    Snapshot,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Raw, Stage::Anonymized, Stage::Augmented, Stage::Snapshot];

    /// 阶段对应的目录
    pub fn dir<'a>(&self, layout: &'a DataLayout) -> &'a Path {
        match self {
            Stage::Raw => &layout.raw,
            Stage::Anonymized => &layout.anonymized,
            Stage::Augmented => &layout.augmented,
            Stage::Snapshot => &layout.snapshots,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Raw => write!(f, "raw"),
            Stage::Anonymized => write!(f, "anonymized"),
            Stage::Augmented => write!(f, "augmented"),
            Stage::Snapshot => write!(f, "snapshot"),
        }
    }
}

impl FromStr for Stage {
    type Err = MldmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Stage::Raw),
            "anonymized" => Ok(Stage::Anonymized),
            "augmented" => Ok(Stage::Augmented),
            "snapshot" | "snapshots" => Ok(Stage::Snapshot),
            _ => Err(MldmError::InvalidInput(format!("未知阶段: {}", s))),
        }
    }
}

fn is_browsable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            BROWSABLE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// 列出阶段目录中的影像文件（不递归），按文件名排序
pub fn list_stage(layout: &DataLayout, stage: Stage) -> Result<Vec<PathBuf>> {
    list_files_where(stage.dir(layout), is_browsable)
}

/// 阶段统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStatistics {
    pub stage: Stage,
    /// 影像文件总数
    pub file_count: usize,
    /// 成功读取尺寸的样本数
    pub sampled: usize,
    /// 样本平均宽度（向下取整）
    pub average_width: Option<u32>,
    /// 样本平均高度（向下取整）
    pub average_height: Option<u32>,
}

impl fmt::Display for StageStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stage: {}", self.stage)?;
        write!(f, "Total Images: {}", self.file_count)?;
        if let (Some(width), Some(height)) = (self.average_width, self.average_height) {
            write!(
                f,
                "\nAvg Width: {} px\nAvg Height: {} px (sampled {})",
                width, height, self.sampled
            )?;
        }
        Ok(())
    }
}

/// 统计阶段目录：文件总数，以及前若干个文件的平均尺寸
///
/// 无法读取尺寸的文件不计入样本。
pub fn stage_statistics(layout: &DataLayout, stage: Stage) -> Result<StageStatistics> {
    let files = list_stage(layout, stage)?;

    let dimensions: Vec<(u32, u32)> = files
        .iter()
        .take(STATISTICS_SAMPLE_SIZE)
        .filter_map(|path| match image_dimensions(path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                debug!("跳过无法读取的文件 {:?}: {}", path, e);
                None
            }
        })
        .collect();

    let sampled = dimensions.len();
    let (average_width, average_height) = if sampled == 0 {
        (None, None)
    } else {
        let width: u64 = dimensions.iter().map(|(w, _)| *w as u64).sum();
        let height: u64 = dimensions.iter().map(|(_, h)| *h as u64).sum();
        (
            Some((width / sampled as u64) as u32),
            Some((height / sampled as u64) as u32),
        )
    };

    Ok(StageStatistics {
        stage,
        file_count: files.len(),
        sampled,
        average_width,
        average_height,
    })
}

/// 读取图像尺寸 (宽, 高)
fn image_dimensions(path: &Path) -> Result<(u32, u32)> {
    if mldm_core::utils::has_extension(path, DICOM_EXTENSION) {
        let (rows, columns) = DicomRecord::open(path)?
            .image_size()
            .ok_or_else(|| MldmError::Dicom("缺少Rows/Columns".to_string()))?;
        return Ok((columns, rows));
    }

    image::image_dimensions(path).map_err(|e| MldmError::Image(e.to_string()))
}
