//! 导入阶段
//!
//! 读取原始DICOM文件，脱敏后写入`<ingest>/<subfolder>/<原文件名>`，
//! 计算写出文件的哈希并追加一条元数据记录。单个文件失败只记录为跳过，
//! 不影响其余文件。

use crate::context::PipelineContext;
use mldm_core::utils::{has_extension, hash_file};
use mldm_core::{ImageMetadataRecord, ImageStatus, MldmError, Result};
use mldm_database::MetadataStore;
use mldm_dicom::{Anonymizer, DicomRecord};
use mldm_storage::{ensure_dir, file_name, list_files_with_extension};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// DICOM文件扩展名
pub const DICOM_EXTENSION: &str = "dcm";

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// 导入成功
    Ingested {
        source: PathBuf,
        output: PathBuf,
        hash: String,
        document_id: String,
    },
    /// 跳过（解析失败、I/O错误或存储失败）
    Skipped { source: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Ingested { source, .. } | FileOutcome::Skipped { source, .. } => source,
        }
    }

    pub fn is_ingested(&self) -> bool {
        matches!(self, FileOutcome::Ingested { .. })
    }
}

/// 导入批次报告
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// 输入目录或单个文件
    pub source: PathBuf,
    /// 输出目录
    pub output_folder: PathBuf,
    pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
    /// 成功导入的文件
    pub fn ingested(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_ingested())
    }

    /// 被跳过的文件
    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ingested())
    }

    pub fn ingested_count(&self) -> usize {
        self.ingested().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// 是否没有任何待处理文件
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No DICOM files found in {}", self.source.display());
        }

        write!(
            f,
            "Ingestion complete: {} ingested, {} skipped. Files saved in {}",
            self.ingested_count(),
            self.skipped_count(),
            self.output_folder.display()
        )?;
        for outcome in self.skipped() {
            if let FileOutcome::Skipped { source, reason } = outcome {
                write!(f, "\n  skipped {}: {}", source.display(), reason)?;
            }
        }
        Ok(())
    }
}

/// 批量导入目录下（不递归）全部`.dcm`文件
pub fn ingest_folder(
    ctx: &PipelineContext,
    store: &mut dyn MetadataStore,
    folder: &Path,
    subfolder: &str,
) -> Result<IngestReport> {
    validate_subfolder(subfolder)?;
    if !folder.is_dir() {
        return Err(MldmError::InvalidInput(format!(
            "导入目录不存在: {}",
            folder.display()
        )));
    }

    let output_folder = ctx.layout.ingest_folder(subfolder);
    let files = list_files_with_extension(folder, DICOM_EXTENSION)?;
    if files.is_empty() {
        warn!("目录中没有DICOM文件: {:?}", folder);
        return Ok(IngestReport {
            source: folder.to_path_buf(),
            output_folder,
            outcomes: Vec::new(),
        });
    }

    info!("开始批量导入: {:?} ({} 个文件) -> {:?}", folder, files.len(), output_folder);
    let outcomes = ingest_files(store, &files, &output_folder)?;

    let report = IngestReport {
        source: folder.to_path_buf(),
        output_folder,
        outcomes,
    };
    info!(
        "批量导入完成: 成功 {}, 跳过 {}",
        report.ingested_count(),
        report.skipped_count()
    );
    Ok(report)
}

/// 导入单个`.dcm`文件
pub fn ingest_file(
    ctx: &PipelineContext,
    store: &mut dyn MetadataStore,
    path: &Path,
    subfolder: &str,
) -> Result<IngestReport> {
    validate_subfolder(subfolder)?;
    if !path.is_file() || !has_extension(path, DICOM_EXTENSION) {
        return Err(MldmError::InvalidInput(format!(
            "无效的DICOM文件: {}",
            path.display()
        )));
    }

    let output_folder = ctx.layout.ingest_folder(subfolder);
    info!("开始导入单个文件: {:?} -> {:?}", path, output_folder);
    let outcomes = ingest_files(store, &[path.to_path_buf()], &output_folder)?;

    Ok(IngestReport {
        source: path.to_path_buf(),
        output_folder,
        outcomes,
    })
}

fn ingest_files(
    store: &mut dyn MetadataStore,
    files: &[PathBuf],
    output_folder: &Path,
) -> Result<Vec<FileOutcome>> {
    ensure_dir(output_folder)?;
    let anonymizer = Anonymizer::new();

    let outcomes = files
        .iter()
        .map(|source| match ingest_dicom_file(store, &anonymizer, source, output_folder) {
            Ok((output, hash, document_id)) => {
                info!("已导入: {:?}", source);
                FileOutcome::Ingested {
                    source: source.clone(),
                    output,
                    hash,
                    document_id,
                }
            }
            Err(e) => {
                warn!("导入失败 {:?}: {}", source, e);
                FileOutcome::Skipped {
                    source: source.clone(),
                    reason: e.to_string(),
                }
            }
        })
        .collect();

    Ok(outcomes)
}

fn ingest_dicom_file(
    store: &mut dyn MetadataStore,
    anonymizer: &Anonymizer,
    source: &Path,
    output_folder: &Path,
) -> Result<(PathBuf, String, String)> {
    let filename = file_name(source)?;
    let mut record = DicomRecord::open(source)?;
    anonymizer.anonymize(&mut record);

    let output = output_folder.join(&filename);
    record.save(&output)?;

    // 哈希基于写出的脱敏文件
    let hash = hash_file(&output)?;
    let inserted = store.insert_image(&ImageMetadataRecord {
        filename,
        hash: hash.clone(),
        path: output.display().to_string(),
        status: ImageStatus::Anonymized,
    });

    // 记录写入失败时删除已写出的文件
    let document_id = match inserted {
        Ok(id) => id,
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&output) {
                warn!("无法删除未登记的输出文件 {:?}: {}", output, remove_err);
            }
            return Err(e);
        }
    };

    Ok((output, hash, document_id))
}

/// 子目录名必须是单个普通路径分量
fn validate_subfolder(subfolder: &str) -> Result<()> {
    let mut components = Path::new(subfolder).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(MldmError::InvalidInput(format!("无效的子目录名: {:?}", subfolder))),
    }
}
