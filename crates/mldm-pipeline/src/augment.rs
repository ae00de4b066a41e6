//! 增强阶段
//!
//! 对每个脱敏DICOM文件解码为灰度图，按固定顺序生成变体：
//! 原图、水平翻转、垂直翻转（启用翻转时）、每个旋转角度一张、一张噪声图，
//! 依次保存为`<文件名>_aug<序号>.png`。本阶段不写元数据记录。

use crate::context::{AugmentationSettings, PipelineContext};
use crate::imaging::{add_gaussian_noise, flip_horizontal, flip_vertical, rotate_about_center};
use crate::ingest::DICOM_EXTENSION;
use image::{GrayImage, ImageFormat};
use mldm_core::{MldmError, Result};
use mldm_dicom::DicomRecord;
use mldm_storage::{ensure_dir, file_stem, list_files_with_extension};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 单个增强变体
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant {
    Original,
    FlipHorizontal,
    FlipVertical,
    /// 逆时针旋转角度（度）
    Rotate(f64),
    /// 噪声强度
    Noise(f64),
}

impl Variant {
    /// 按配置生成变体列表，顺序固定
    pub fn plan(settings: &AugmentationSettings) -> Vec<Variant> {
        let mut variants = vec![Variant::Original];
        if settings.flip {
            variants.push(Variant::FlipHorizontal);
            variants.push(Variant::FlipVertical);
        }
        variants.extend(settings.rotate.iter().map(|angle| Variant::Rotate(*angle)));
        variants.push(Variant::Noise(settings.noise));
        variants
    }

    fn apply(&self, image: &GrayImage, rng: &mut StdRng) -> GrayImage {
        match self {
            Variant::Original => image.clone(),
            Variant::FlipHorizontal => flip_horizontal(image),
            Variant::FlipVertical => flip_vertical(image),
            Variant::Rotate(angle) => rotate_about_center(image, *angle),
            Variant::Noise(level) => add_gaussian_noise(image, *level, rng),
        }
    }
}

/// 增强输出文件名
pub fn variant_file_name(stem: &str, index: usize) -> String {
    format!("{}_aug{}.png", stem, index)
}

/// 增强报告
#[derive(Debug, Clone)]
pub struct AugmentReport {
    pub source_folder: PathBuf,
    pub output_folder: PathBuf,
    /// 处理的源文件数
    pub sources: usize,
    /// 写出的文件
    pub files_written: Vec<PathBuf>,
}

impl fmt::Display for AugmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Augmentation complete: {} images from {} source files. Files saved in {}",
            self.files_written.len(),
            self.sources,
            self.output_folder.display()
        )
    }
}

/// 增强目录下（不递归）全部`.dcm`文件，输出到增强目录
///
/// 任一文件失败即中止并返回错误。
pub fn augment_folder(ctx: &PipelineContext, folder: &Path) -> Result<AugmentReport> {
    if !folder.is_dir() {
        return Err(MldmError::InvalidInput(format!(
            "增强源目录不存在: {}",
            folder.display()
        )));
    }

    let output_folder = ensure_dir(&ctx.layout.augmented)?;
    let sources = list_files_with_extension(folder, DICOM_EXTENSION)?;
    let variants = Variant::plan(&ctx.settings.augmentation);
    let mut rng = StdRng::seed_from_u64(ctx.settings.seed);

    info!(
        "开始增强: {:?} ({} 个文件, 每个 {} 个变体) -> {:?}",
        folder,
        sources.len(),
        variants.len(),
        output_folder
    );

    let mut files_written = Vec::with_capacity(sources.len() * variants.len());
    for source in &sources {
        let stem = file_stem(source)?;
        let image = DicomRecord::open(source)?.to_grayscale()?;

        for (index, variant) in variants.iter().enumerate() {
            let output = output_folder.join(variant_file_name(&stem, index));
            variant
                .apply(&image, &mut rng)
                .save_with_format(&output, ImageFormat::Png)
                .map_err(|e| {
                    MldmError::Image(format!("无法保存图像 {}: {}", output.display(), e))
                })?;
            debug!("已生成 {:?}: {:?}", variant, output);
            files_written.push(output);
        }
    }

    let report = AugmentReport {
        source_folder: folder.to_path_buf(),
        output_folder,
        sources: sources.len(),
        files_written,
    };
    info!("增强完成: {}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DataLayout;
    use mldm_dicom::fixtures::{gradient_pixels, sample_record};
    use std::fs;
    use tempfile::TempDir;

    fn setup(settings: AugmentationSettings) -> (TempDir, PipelineContext) {
        let dir = TempDir::new().unwrap();
        let mut ctx = PipelineContext {
            layout: DataLayout::under(dir.path().join("data")),
            ..PipelineContext::default()
        };
        ctx.settings.augmentation = settings;
        fs::create_dir_all(&ctx.layout.anonymized).unwrap();
        (dir, ctx)
    }

    fn write_source(ctx: &PipelineContext, name: &str) {
        sample_record(6, 8, gradient_pixels(6, 8), None)
            .save(ctx.layout.anonymized.join(name))
            .unwrap();
    }

    fn load(path: &Path) -> GrayImage {
        image::open(path).unwrap().to_luma8()
    }

    #[test]
    fn test_plan_order() {
        let settings = AugmentationSettings {
            flip: true,
            rotate: vec![90.0, -30.0],
            noise: 0.1,
        };

        assert_eq!(
            Variant::plan(&settings),
            vec![
                Variant::Original,
                Variant::FlipHorizontal,
                Variant::FlipVertical,
                Variant::Rotate(90.0),
                Variant::Rotate(-30.0),
                Variant::Noise(0.1),
            ]
        );
    }

    #[test]
    fn test_plan_without_flip() {
        let settings = AugmentationSettings {
            flip: false,
            rotate: vec![],
            noise: 0.05,
        };

        assert_eq!(
            Variant::plan(&settings),
            vec![Variant::Original, Variant::Noise(0.05)]
        );
    }

    #[test]
    fn test_six_variants_per_source() {
        let (_dir, ctx) = setup(AugmentationSettings {
            flip: true,
            rotate: vec![15.0, -15.0],
            noise: 0.05,
        });
        write_source(&ctx, "scan01.dcm");
        write_source(&ctx, "scan02.dcm");

        let report = augment_folder(&ctx, &ctx.layout.anonymized).unwrap();

        assert_eq!(report.sources, 2);
        assert_eq!(report.files_written.len(), 12);
        let names: Vec<_> = report.files_written[..6]
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "scan01_aug0.png",
                "scan01_aug1.png",
                "scan01_aug2.png",
                "scan01_aug3.png",
                "scan01_aug4.png",
                "scan01_aug5.png",
            ]
        );
        assert!(ctx.layout.augmented.join("scan02_aug5.png").exists());
    }

    #[test]
    fn test_variant_contents() {
        let (_dir, ctx) = setup(AugmentationSettings {
            flip: true,
            rotate: vec![0.0],
            noise: 0.0,
        });
        write_source(&ctx, "scan.dcm");

        augment_folder(&ctx, &ctx.layout.anonymized).unwrap();

        let out = &ctx.layout.augmented;
        let original = load(&out.join("scan_aug0.png"));
        assert_eq!(original.dimensions(), (8, 6));
        assert_eq!(load(&out.join("scan_aug1.png")), flip_horizontal(&original));
        assert_eq!(load(&out.join("scan_aug2.png")), flip_vertical(&original));
        assert_eq!(load(&out.join("scan_aug3.png")), original);
        // 噪声强度为0时与原图一致
        assert_eq!(load(&out.join("scan_aug4.png")), original);
    }

    #[test]
    fn test_original_variant_keeps_source_pixels() {
        let (_dir, ctx) = setup(AugmentationSettings {
            flip: false,
            rotate: vec![],
            noise: 0.0,
        });
        let pixels = gradient_pixels(4, 4);
        sample_record(4, 4, pixels.clone(), None)
            .save(ctx.layout.anonymized.join("s.dcm"))
            .unwrap();

        augment_folder(&ctx, &ctx.layout.anonymized).unwrap();

        let original = load(&ctx.layout.augmented.join("s_aug0.png"));
        assert_eq!(original.into_raw(), pixels);
    }

    #[test]
    fn test_missing_folder() {
        let (dir, ctx) = setup(AugmentationSettings::default());

        let result = augment_folder(&ctx, &dir.path().join("missing"));
        assert!(matches!(result, Err(MldmError::InvalidInput(_))));
    }

    #[test]
    fn test_corrupt_file_aborts() {
        let (_dir, ctx) = setup(AugmentationSettings::default());
        fs::write(ctx.layout.anonymized.join("bad.dcm"), b"garbage").unwrap();

        let result = augment_folder(&ctx, &ctx.layout.anonymized);
        assert!(matches!(result, Err(MldmError::DicomParse(_))));
    }
}
