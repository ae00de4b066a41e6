//! 配置管理
//!
//! 从配置文件加载流水线参数，环境变量可覆盖文件中的值（前缀 `MLDM_`，
//! 嵌套键用 `__` 分隔，如 `MLDM_SPLIT_RATIOS__TRAIN=0.8`）。
//! 缺少必需键时加载失败。

use crate::logging::LoggingConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use mldm_pipeline::{AugmentationSettings, DataLayout, PipelineContext, PipelineSettings, SplitRatios};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// 比例之和允许的浮点误差
const RATIO_SUM_TOLERANCE: f64 = 1e-9;

/// 完整配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// 增强配置
    pub augmentation: AugmentationSettings,
    /// 划分比例
    pub split_ratios: SplitRatios,
    /// 随机种子
    pub seed: u64,
    /// 数据目录
    #[serde(default)]
    pub paths: DataLayout,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// 从文件加载并验证配置
    pub fn load(config_path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path))
            .add_source(
                Environment::with_prefix("MLDM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", config_path))?;

        let config: Settings = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        ConfigValidator::new().validate(&config)?;

        info!("Configuration loaded successfully from: {}", config_path);
        Ok(config)
    }

    /// 流水线参数部分
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            augmentation: self.augmentation.clone(),
            split_ratios: self.split_ratios,
            seed: self.seed,
        }
    }

    /// 构造流水线上下文
    pub fn into_context(self) -> PipelineContext {
        PipelineContext::new(self.pipeline_settings(), self.paths)
    }
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: String,
    /// 验证函数
    validator: fn(&Settings) -> Result<()>,
    /// 错误消息
    error_message: String,
}

fn check_ratio(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("{} must be within [0, 1], got {}", name, value))
    }
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "split_ratios".to_string(),
                validator: |config| {
                    let ratios = &config.split_ratios;
                    check_ratio("train", ratios.train)?;
                    check_ratio("val", ratios.val)?;
                    check_ratio("test", ratios.test)
                },
                error_message: "Invalid split ratio".to_string(),
            },
            ValidationRule {
                field_path: "split_ratios".to_string(),
                validator: |config| {
                    let ratios = &config.split_ratios;
                    let sum = ratios.train + ratios.val + ratios.test;
                    if sum > 1.0 + RATIO_SUM_TOLERANCE {
                        Err(anyhow::anyhow!("Split ratios sum to {}, exceeding 1", sum))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid split ratios".to_string(),
            },
            ValidationRule {
                field_path: "augmentation.noise".to_string(),
                validator: |config| {
                    let noise = config.augmentation.noise;
                    if noise.is_finite() && noise >= 0.0 {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("Noise level must be a non-negative number, got {}", noise))
                    }
                },
                error_message: "Invalid noise level".to_string(),
            },
            ValidationRule {
                field_path: "augmentation.rotate".to_string(),
                validator: |config| {
                    match config.augmentation.rotate.iter().find(|a| !a.is_finite()) {
                        Some(angle) => Err(anyhow::anyhow!("Rotation angle must be finite, got {}", angle)),
                        None => Ok(()),
                    }
                },
                error_message: "Invalid rotation angle".to_string(),
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &Settings) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(anyhow::anyhow!("{}: {}", rule.error_message, e));
            }
        }

        info!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
augmentation:
  flip: true
  rotate: [15, -15]
  noise: 0.05
split_ratios:
  train: 0.7
  val: 0.2
  test: 0.1
seed: 42
paths:
  augmented: /tmp/mldm/augmented
logging:
  level: debug
"#;

    fn write_config(contents: &str) -> (TempDir, String) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, contents).unwrap();
        (dir, path.to_string_lossy().into_owned())
    }

    fn valid_settings() -> Settings {
        Settings {
            augmentation: AugmentationSettings::default(),
            split_ratios: SplitRatios::default(),
            seed: 42,
            paths: DataLayout::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_load_full_config() {
        let (_dir, path) = write_config(FULL_CONFIG);

        let settings = Settings::load(&path).unwrap();

        assert!(settings.augmentation.flip);
        assert_eq!(settings.augmentation.rotate, vec![15.0, -15.0]);
        assert_eq!(settings.augmentation.noise, 0.05);
        assert_eq!(settings.split_ratios, SplitRatios::default());
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.paths.augmented, PathBuf::from("/tmp/mldm/augmented"));
        // 未配置的目录使用默认值
        assert_eq!(settings.paths.raw, PathBuf::from("data/raw"));
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_missing_key_fails() {
        let without_seed = FULL_CONFIG.replace("seed: 42\n", "");
        let (_dir, path) = write_config(&without_seed);

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");

        assert!(Settings::load(&path.to_string_lossy()).is_err());
    }

    #[test]
    fn test_into_context() {
        let (_dir, path) = write_config(FULL_CONFIG);

        let ctx = Settings::load(&path).unwrap().into_context();

        assert_eq!(ctx.settings.seed, 42);
        assert_eq!(ctx.layout.augmented, PathBuf::from("/tmp/mldm/augmented"));
    }

    #[test]
    fn test_validator_accepts_defaults() {
        assert!(ConfigValidator::new().validate(&valid_settings()).is_ok());
    }

    #[test]
    fn test_validator_rejects_ratio_sum() {
        let mut settings = valid_settings();
        settings.split_ratios.train = 0.9;

        assert!(ConfigValidator::new().validate(&settings).is_err());
    }

    #[test]
    fn test_validator_rejects_negative_values() {
        let mut settings = valid_settings();
        settings.split_ratios.val = -0.1;
        assert!(ConfigValidator::new().validate(&settings).is_err());

        let mut settings = valid_settings();
        settings.augmentation.noise = -1.0;
        assert!(ConfigValidator::new().validate(&settings).is_err());
    }

    #[test]
    fn test_validator_allows_ratio_sum_below_one() {
        let mut settings = valid_settings();
        settings.split_ratios = SplitRatios {
            train: 0.5,
            val: 0.2,
            test: 0.0,
        };

        assert!(ConfigValidator::new().validate(&settings).is_ok());
    }
}
