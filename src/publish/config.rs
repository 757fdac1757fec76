//! # 配置模块
//!
//! ## 设计思路
//!
//! 将流水线的“可调策略”集中到 `PublishConfig`，由入口层显式构造后注入，
//! 流水线内部不读取环境变量，便于测试替换。
//!
//! ## 实现思路
//!
//! - `new` 只要求公开链接前缀，其余字段取生产默认值。
//! - `validate` 在流水线构造时执行，参数越界直接拒绝。

use std::path::PathBuf;

use super::snippet::DEFAULT_KEY_PREFIX;
use super::transformer::DEFAULT_THUMBNAIL_MAX_DIMENSION;
use super::PublishError;

/// 缩略图边界允许范围（像素）。
pub const THUMBNAIL_MAX_DIMENSION_RANGE: std::ops::RangeInclusive<u32> = 16..=10_000;

/// 发布流水线配置。
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// 公开链接前缀，直接与对象名拼接（通常以 `/` 结尾）。
    pub bucket_url: String,
    /// 上传键前缀。
    pub key_prefix: String,
    /// 缩略图宽/高单边上限。
    pub thumbnail_max_dimension: u32,
    /// 剪贴板写入失败是否让整个调用失败。
    pub strict_clipboard: bool,
    /// 临时副本所在目录，`None` 使用系统临时目录。
    pub temp_dir: Option<PathBuf>,
}

impl PublishConfig {
    pub fn new(bucket_url: impl Into<String>) -> Self {
        Self {
            bucket_url: bucket_url.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            thumbnail_max_dimension: DEFAULT_THUMBNAIL_MAX_DIMENSION,
            strict_clipboard: false,
            temp_dir: None,
        }
    }

    pub fn validate(&self) -> Result<(), PublishError> {
        if self.bucket_url.trim().is_empty() {
            return Err(PublishError::InvalidArgument("bucket_url 不能为空".to_string()));
        }
        if !THUMBNAIL_MAX_DIMENSION_RANGE.contains(&self.thumbnail_max_dimension) {
            return Err(PublishError::InvalidArgument(format!(
                "thumbnail_max_dimension 必须在 {}~{} 之间",
                THUMBNAIL_MAX_DIMENSION_RANGE.start(),
                THUMBNAIL_MAX_DIMENSION_RANGE.end()
            )));
        }
        if let Some(dir) = &self.temp_dir {
            if !dir.is_dir() {
                return Err(PublishError::InvalidArgument(format!(
                    "临时目录不存在：{}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_layout() {
        let config = PublishConfig::new("https://cdn.example/");
        assert_eq!(config.key_prefix, "images/");
        assert_eq!(config.thumbnail_max_dimension, 800);
        assert!(!config.strict_clipboard);
        config.validate().expect("defaults should be valid");
    }

    #[test]
    fn rejects_empty_bucket_url() {
        let config = PublishConfig::new("  ");
        assert!(matches!(config.validate(), Err(PublishError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_out_of_range_thumbnail_bound() {
        let mut config = PublishConfig::new("https://cdn.example/");
        config.thumbnail_max_dimension = 8;
        assert!(matches!(config.validate(), Err(PublishError::InvalidArgument(_))));

        config.thumbnail_max_dimension = 20_000;
        assert!(matches!(config.validate(), Err(PublishError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_missing_temp_dir() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let mut config = PublishConfig::new("https://cdn.example/");
        config.temp_dir = Some(dir.path().join("nope"));
        assert!(matches!(config.validate(), Err(PublishError::InvalidArgument(_))));
    }
}
