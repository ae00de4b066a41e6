//! 患者身份字段脱敏
//!
//! 对白名单中已存在的字段写入固定哨兵值，不存在的字段保持缺失，
//! 其余所有元素（包括像素数据）保持不变。本模块不做任何I/O。

use crate::record::{DicomRecord, IdentifyingField};
use tracing::debug;

/// 脱敏后写入的哨兵值
pub const ANONYMIZED_VALUE: &str = "ANONYMIZED";

/// 一次脱敏替换了哪些字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnonymizationSummary {
    pub replaced: Vec<IdentifyingField>,
}

impl AnonymizationSummary {
    pub fn is_empty(&self) -> bool {
        self.replaced.is_empty()
    }
}

/// 脱敏器
#[derive(Debug, Clone)]
pub struct Anonymizer {
    sentinel: String,
    fields: Vec<IdentifyingField>,
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Anonymizer {
    /// 使用默认哨兵值和完整字段白名单
    pub fn new() -> Self {
        Self {
            sentinel: ANONYMIZED_VALUE.to_string(),
            fields: IdentifyingField::ALL.to_vec(),
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// 原地脱敏
    pub fn anonymize(&self, record: &mut DicomRecord) -> AnonymizationSummary {
        let mut summary = AnonymizationSummary::default();

        for field in &self.fields {
            if record.overwrite_field(*field, &self.sentinel) {
                summary.replaced.push(*field);
            }
        }

        debug!("脱敏完成，替换字段: {:?}", summary.replaced);
        summary
    }
}

/// 使用默认配置脱敏
pub fn anonymize_record(record: &mut DicomRecord) -> AnonymizationSummary {
    Anonymizer::new().anonymize(record)
}
