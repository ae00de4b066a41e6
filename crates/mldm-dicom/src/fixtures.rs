//! 测试用DICOM样例构造

use crate::DicomRecord;
use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::dictionary_std::{tags, uids};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};

/// 样例患者信息
#[derive(Debug, Clone)]
pub struct PatientInfo {
    pub name: String,
    pub id: String,
    pub birth_date: String,
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self {
            name: "Doe^John".to_string(),
            id: "12345".to_string(),
            birth_date: "19800101".to_string(),
        }
    }
}

/// 构造一张8位单通道（MONOCHROME2）图像的DICOM记录
pub fn sample_record(
    rows: u16,
    columns: u16,
    pixels: Vec<u8>,
    patient: Option<PatientInfo>,
) -> DicomRecord {
    assert_eq!(pixels.len(), rows as usize * columns as usize);

    let sop_instance_uid = format!("1.2.826.0.1.3680043.9.7382.{}.{}", rows, columns);
    let mut obj = InMemDicomObject::new_empty();

    obj.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
    ));
    obj.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(sop_instance_uid.as_str()),
    ));
    obj.put(DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("OT")));
    obj.put(DataElement::new(
        tags::STUDY_DESCRIPTION,
        VR::LO,
        PrimitiveValue::from("CHEST PA"),
    ));

    if let Some(patient) = patient {
        obj.put(DataElement::new(
            tags::PATIENT_NAME,
            VR::PN,
            PrimitiveValue::from(patient.name.as_str()),
        ));
        obj.put(DataElement::new(
            tags::PATIENT_ID,
            VR::LO,
            PrimitiveValue::from(patient.id.as_str()),
        ));
        obj.put(DataElement::new(
            tags::PATIENT_BIRTH_DATE,
            VR::DA,
            PrimitiveValue::from(patient.birth_date.as_str()),
        ));
    }

    obj.put(DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)));
    obj.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)));
    obj.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(columns)));
    obj.put(DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(8_u16)));
    obj.put(DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(8_u16)));
    obj.put(DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(7_u16)));
    obj.put(DataElement::new(
        tags::PIXEL_REPRESENTATION,
        VR::US,
        PrimitiveValue::from(0_u16),
    ));
    obj.put(DataElement::new(tags::PIXEL_DATA, VR::OB, PrimitiveValue::from(pixels)));

    let meta = FileMetaTableBuilder::new()
        .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
        .media_storage_sop_class_uid(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
        .media_storage_sop_instance_uid(sop_instance_uid);

    let file_obj = obj.with_meta(meta).expect("valid file meta");
    DicomRecord::from_object(file_obj)
}

/// 生成渐变像素数据，便于区分翻转/旋转结果
pub fn gradient_pixels(rows: u16, columns: u16) -> Vec<u8> {
    (0..rows as usize * columns as usize)
        .map(|i| ((i * 7) % 256) as u8)
        .collect()
}
