//! # DICOM处理模块
//!
//! 提供DICOM记录的读取、写入、像素解码以及患者身份字段的脱敏。

pub mod anonymizer;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod record;

pub use anonymizer::{anonymize_record, AnonymizationSummary, Anonymizer, ANONYMIZED_VALUE};
pub use record::{DicomRecord, DicomSummary, IdentifyingField};
