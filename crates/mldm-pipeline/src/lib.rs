//! # 数据集流水线模块
//!
//! 提供数据集准备的各个阶段，每个阶段独立调用、同步执行：
//! - 导入：读取原始DICOM，脱敏后写入导入目录并记录元数据
//! - 增强：对脱敏影像生成翻转、旋转、噪声等变体
//! - 划分：按比例和固定种子将增强结果划分为训练/验证/测试集
//! - 快照：将增强目录完整复制为带时间戳的归档
//! - 浏览：列出各阶段目录中的影像文件并统计尺寸

pub mod augment;
pub mod browse;
pub mod context;
pub mod imaging;
pub mod ingest;
pub mod snapshot;
pub mod split;

// 重新导出主要类型
pub use augment::{augment_folder, AugmentReport, Variant};
pub use browse::{list_stage, stage_statistics, Stage, StageStatistics};
pub use context::{AugmentationSettings, DataLayout, PipelineContext, PipelineSettings, SplitRatios};
pub use ingest::{ingest_file, ingest_folder, FileOutcome, IngestReport};
pub use snapshot::{export_snapshot, export_snapshot_at};
pub use split::{assign_split, split_dataset, split_folder, SplitReport};
