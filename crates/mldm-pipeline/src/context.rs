//! 流水线上下文
//!
//! 进程启动时构造一次，以引用方式传入每个阶段。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 增强参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentationSettings {
    /// 是否生成水平、垂直翻转
    pub flip: bool,
    /// 旋转角度列表（度，逆时针）
    pub rotate: Vec<f64>,
    /// 噪声强度，噪声标准差为 255 * noise
    pub noise: f64,
}

impl Default for AugmentationSettings {
    fn default() -> Self {
        Self {
            flip: true,
            rotate: vec![15.0, -15.0],
            noise: 0.05,
        }
    }
}

/// 划分比例，余数全部归入测试集
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.2,
            test: 0.1,
        }
    }
}

/// 流水线参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub augmentation: AugmentationSettings,
    pub split_ratios: SplitRatios,
    /// 随机种子
    pub seed: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            augmentation: AugmentationSettings::default(),
            split_ratios: SplitRatios::default(),
            seed: 42,
        }
    }
}

/// 数据目录布局
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLayout {
    /// 导入源目录
    pub raw: PathBuf,
    /// 导入输出根目录
    pub ingest: PathBuf,
    /// 增强源目录
    pub anonymized: PathBuf,
    /// 增强输出目录（划分和快照的源目录）
    pub augmented: PathBuf,
    /// 划分输出根目录
    pub splits: PathBuf,
    /// 快照根目录
    pub snapshots: PathBuf,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::under("data")
    }
}

impl DataLayout {
    /// 以给定目录为根的标准布局
    pub fn under<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            raw: root.join("raw"),
            ingest: root.join("ingest"),
            anonymized: root.join("anonymized"),
            augmented: root.join("augmented"),
            splits: root.join("splits"),
            snapshots: root.join("snapshots"),
        }
    }

    /// 导入子目录
    pub fn ingest_folder(&self, subfolder: &str) -> PathBuf {
        self.ingest.join(subfolder)
    }
}

/// 流水线上下文
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub settings: PipelineSettings,
    pub layout: DataLayout,
}

impl PipelineContext {
    pub fn new(settings: PipelineSettings, layout: DataLayout) -> Self {
        Self { settings, layout }
    }
}
