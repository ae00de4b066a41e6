//! DICOM记录
//!
//! 对`dicom-rs`文件对象的薄封装：身份字段通过类型化访问器读取，
//! 像素数据解码为8位灰度图。

use dicom::core::{DataElement, PrimitiveValue, Tag};
use dicom::dictionary_std::tags;
use dicom::object::{open_file, DefaultDicomObject};
use dicom_pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption};
use image::GrayImage;
use mldm_core::{MldmError, Result};
use std::fmt;
use std::path::Path;
use tracing::{debug, error};

/// 需要脱敏的患者身份字段（白名单）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifyingField {
    /// 患者姓名 (0010,0010)
    PatientName,
    /// 患者ID (0010,0020)
    PatientId,
    /// 患者出生日期 (0010,0030)
    PatientBirthDate,
}

impl IdentifyingField {
    pub const ALL: [IdentifyingField; 3] = [
        IdentifyingField::PatientName,
        IdentifyingField::PatientId,
        IdentifyingField::PatientBirthDate,
    ];

    /// 对应的DICOM标签
    pub fn tag(self) -> Tag {
        match self {
            IdentifyingField::PatientName => tags::PATIENT_NAME,
            IdentifyingField::PatientId => tags::PATIENT_ID,
            IdentifyingField::PatientBirthDate => tags::PATIENT_BIRTH_DATE,
        }
    }

    /// DICOM关键字
    pub fn keyword(self) -> &'static str {
        match self {
            IdentifyingField::PatientName => "PatientName",
            IdentifyingField::PatientId => "PatientID",
            IdentifyingField::PatientBirthDate => "PatientBirthDate",
        }
    }
}

impl fmt::Display for IdentifyingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// 已解析的DICOM文件
#[derive(Debug, Clone)]
pub struct DicomRecord {
    obj: DefaultDicomObject,
}

impl DicomRecord {
    /// 从文件读取
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("读取DICOM文件: {:?}", path);

        let obj = open_file(path).map_err(|e| {
            error!("DICOM文件解析失败: {:?}, 错误: {}", path, e);
            MldmError::DicomParse(format!("无法解析DICOM文件 {}: {}", path.display(), e))
        })?;

        Ok(Self { obj })
    }

    /// 由已有的文件对象构造
    pub fn from_object(obj: DefaultDicomObject) -> Self {
        Self { obj }
    }

    pub fn object(&self) -> &DefaultDicomObject {
        &self.obj
    }

    pub fn into_object(self) -> DefaultDicomObject {
        self.obj
    }

    /// 写入文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.obj
            .write_to_file(path)
            .map_err(|e| MldmError::Dicom(format!("无法写入DICOM文件 {}: {}", path.display(), e)))?;
        debug!("DICOM文件已写入: {:?}", path);
        Ok(())
    }

    // === 身份字段访问器 ===

    /// 获取患者姓名
    pub fn patient_name(&self) -> Option<String> {
        self.field(IdentifyingField::PatientName)
    }

    /// 获取患者ID
    pub fn patient_id(&self) -> Option<String> {
        self.field(IdentifyingField::PatientId)
    }

    /// 获取患者出生日期
    pub fn patient_birth_date(&self) -> Option<String> {
        self.field(IdentifyingField::PatientBirthDate)
    }

    /// 读取身份字段，字段不存在时返回None
    pub fn field(&self, field: IdentifyingField) -> Option<String> {
        self.string_element(field.tag())
    }

    /// 字段是否存在
    pub fn has_field(&self, field: IdentifyingField) -> bool {
        self.obj.element(field.tag()).is_ok()
    }

    /// 覆盖已存在字段的值，保留原VR；字段不存在时不做任何修改
    pub(crate) fn overwrite_field(&mut self, field: IdentifyingField, value: &str) -> bool {
        let vr = match self.obj.element(field.tag()) {
            Ok(element) => element.vr(),
            Err(_) => return false,
        };

        self.obj
            .put(DataElement::new(field.tag(), vr, PrimitiveValue::from(value)));
        true
    }

    // === 像素数据 ===

    /// 解码第一帧像素数据为8位灰度图
    ///
    /// 不应用VOI LUT，8位样本值保持不变。
    pub fn to_grayscale(&self) -> Result<GrayImage> {
        let decoded = self
            .obj
            .decode_pixel_data()
            .map_err(|e| MldmError::Image(format!("像素数据解码失败: {}", e)))?;

        let image = decoded
            .to_dynamic_image_with_options(
                0,
                &ConvertOptions::new().with_voi_lut(VoiLutOption::Identity),
            )
            .map_err(|e| MldmError::Image(format!("像素数据转换失败: {}", e)))?;

        Ok(image.to_luma8())
    }

    /// 获取图像尺寸 (行数, 列数)
    pub fn image_size(&self) -> Option<(u32, u32)> {
        let rows = self.integer_element(tags::ROWS)?;
        let columns = self.integer_element(tags::COLUMNS)?;
        Some((rows, columns))
    }

    /// 预览用的元数据摘要
    pub fn summary(&self) -> DicomSummary {
        DicomSummary {
            patient_name: self.patient_name(),
            patient_id: self.patient_id(),
            modality: self.string_element(tags::MODALITY),
            study_date: self.string_element(tags::STUDY_DATE),
            dimensions: self.image_size(),
            pixel_spacing: self.string_element(tags::PIXEL_SPACING),
            bits_stored: self.integer_element(tags::BITS_STORED),
            photometric_interpretation: self.string_element(tags::PHOTOMETRIC_INTERPRETATION),
        }
    }

    fn string_element(&self, tag: Tag) -> Option<String> {
        match self.obj.element(tag) {
            Ok(element) => match element.to_str() {
                Ok(value) => Some(value.trim_end_matches(['\0', ' ']).to_string()),
                Err(_) => {
                    debug!("标签 {:?} 不是字符串类型", tag);
                    None
                }
            },
            Err(_) => None,
        }
    }

    fn integer_element(&self, tag: Tag) -> Option<u32> {
        self.obj
            .element(tag)
            .ok()
            .and_then(|element| element.to_int::<u32>().ok())
    }
}

/// DICOM元数据摘要
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DicomSummary {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub modality: Option<String>,
    pub study_date: Option<String>,
    /// (行数, 列数)
    pub dimensions: Option<(u32, u32)>,
    pub pixel_spacing: Option<String>,
    pub bits_stored: Option<u32>,
    pub photometric_interpretation: Option<String>,
}

impl fmt::Display for DicomSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_na(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("N/A")
        }

        writeln!(f, "Patient Name: {}", or_na(&self.patient_name))?;
        writeln!(f, "Patient ID: {}", or_na(&self.patient_id))?;
        writeln!(f, "Modality: {}", or_na(&self.modality))?;
        writeln!(f, "Study Date: {}", or_na(&self.study_date))?;
        match self.dimensions {
            Some((rows, columns)) => writeln!(f, "Image Dimensions: {} x {}", rows, columns)?,
            None => writeln!(f, "Image Dimensions: N/A")?,
        }
        writeln!(f, "Pixel Spacing: {}", or_na(&self.pixel_spacing))?;
        match self.bits_stored {
            Some(bits) => writeln!(f, "Bits Stored: {}", bits)?,
            None => writeln!(f, "Bits Stored: N/A")?,
        }
        write!(
            f,
            "Photometric Interpretation: {}",
            or_na(&self.photometric_interpretation)
        )
    }
}
