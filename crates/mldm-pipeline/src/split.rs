//! 划分阶段

use crate::context::{PipelineContext, SplitRatios};
use mldm_core::{MldmError, Result, SplitAssignment};
use mldm_storage::{copy_into, ensure_dir, file_name, list_files_where, list_files_with_extension};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 划分池的文件扩展名
pub const SPLIT_EXTENSION: &str = "png";

/// 按种子打乱并按比例划分文件名
///
/// 先排序再打乱，同一输入集合与种子得到相同划分。
/// 训练集取`floor(n * train)`个，验证集取`floor(n * val)`个，其余全部归入测试集。
pub fn assign_split(mut files: Vec<String>, ratios: SplitRatios, seed: u64) -> SplitAssignment {
    files.sort();
    let mut rng = StdRng::seed_from_u64(seed);
    files.shuffle(&mut rng);

    let n = files.len();
    let train_count = subset_count(n, ratios.train);
    let val_count = subset_count(n, ratios.val).min(n - train_count);

    let test = files.split_off(train_count + val_count);
    let val = files.split_off(train_count);
    SplitAssignment {
        train: files,
        val,
        test,
    }
}

fn subset_count(n: usize, ratio: f64) -> usize {
    ((n as f64 * ratio).floor() as usize).min(n)
}

/// 子集名称
pub const SUBSET_NAMES: [&str; 3] = ["train", "val", "test"];

/// `dest/{train,val,test}`中已有的文件，子目录不存在时跳过
pub fn stale_entries(dest: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for subset in SUBSET_NAMES {
        let dir = dest.join(subset);
        if dir.is_dir() {
            entries.extend(list_files_where(&dir, |_| true)?);
        }
    }
    Ok(entries)
}

/// 划分目录中的`.png`文件并复制到`dest/{train,val,test}`
///
/// 源目录不存在时视为空集合，仍创建三个子目录。源文件不受影响。
/// 子目录中已有的文件不会被清理。
pub fn split_folder(
    ratios: SplitRatios,
    seed: u64,
    folder: &Path,
    dest: &Path,
) -> Result<SplitAssignment> {
    let files = match list_files_with_extension(folder, SPLIT_EXTENSION) {
        Ok(files) => files,
        Err(MldmError::NotFound(_)) => {
            warn!("划分源目录不存在，按空集合处理: {:?}", folder);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let names = files
        .iter()
        .map(|path| file_name(path))
        .collect::<Result<Vec<_>>>()?;
    let assignment = assign_split(names, ratios, seed);

    let stale = stale_entries(dest)?;
    if !stale.is_empty() {
        warn!(
            "划分目录 {:?} 中已有 {} 个文件，旧文件将保留",
            dest,
            stale.len()
        );
    }

    for (subset, names) in assignment.subsets() {
        let target = ensure_dir(dest.join(subset))?;
        for name in names {
            copy_into(folder.join(name), &target)?;
        }
    }

    info!(
        "划分完成: train={}, val={}, test={}",
        assignment.train.len(),
        assignment.val.len(),
        assignment.test.len()
    );
    Ok(assignment)
}

/// 划分报告
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub output_root: PathBuf,
    pub assignment: SplitAssignment,
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset split complete: {} train, {} val, {} test. Files saved in {}",
            self.assignment.train.len(),
            self.assignment.val.len(),
            self.assignment.test.len(),
            self.output_root.display()
        )
    }
}

/// 划分增强目录到划分输出目录
pub fn split_dataset(ctx: &PipelineContext) -> Result<SplitReport> {
    let assignment = split_folder(
        ctx.settings.split_ratios,
        ctx.settings.seed,
        &ctx.layout.augmented,
        &ctx.layout.splits,
    )?;

    Ok(SplitReport {
        output_root: ctx.layout.splits.clone(),
        assignment,
    })
}
