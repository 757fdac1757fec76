//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImagePublisher` 只负责流程编排，不直接依赖任何外部程序或网络实现。
//! 处理链路固定为：
//! 1. 校验原图并暂存两份副本
//! 2. 缩放缩略图副本
//! 3. 一次批量优化两份副本
//! 4. 上传、拼装 HTML、写剪贴板
//!
//! 任一阶段失败都会先清理两份副本再返回错误。
//!
//! ## 实现思路
//!
//! - 各能力（缩放 / 优化 / 上传 / 剪贴板）以 trait 对象注入，测试可替换为内存实现。
//! - 阶段迁移以 `PipelineStage` 记录，配合 `stage/transform/optimise/upload/total` 耗时日志。
//! - 全程顺序 `await`，不引入并发。

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use super::optimiser::{optimise_batch, Optimiser};
use super::publisher::Publisher;
use super::source::{Snippet, SourceFile};
use super::stager::{StagedPair, Stager};
use super::transformer::{Resizer, Transformer};
use super::{PublishConfig, PublishError};
use crate::clipboard::ClipboardWriter;
use crate::storage::Uploader;

/// 流水线状态。`Cleanup` 可从任一状态进入。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Staged,
    ThumbnailTransformed,
    BothOptimised,
    BothUploaded,
    SnippetReturned,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Staged => "staged",
            Self::ThumbnailTransformed => "thumbnail-transformed",
            Self::BothOptimised => "both-optimised",
            Self::BothUploaded => "both-uploaded",
            Self::SnippetReturned => "snippet-returned",
        };
        f.write_str(name)
    }
}

/// 流水线依赖的外部能力。
pub struct Capabilities {
    pub resizer: Box<dyn Resizer>,
    pub optimiser: Box<dyn Optimiser>,
    pub uploader: Box<dyn Uploader>,
    pub clipboard: Box<dyn ClipboardWriter>,
}

#[derive(Debug, Default)]
struct StageTimings {
    stage: Duration,
    transform: Duration,
    optimise: Duration,
    upload: Duration,
}

/// 单文件发布流水线。
pub struct ImagePublisher {
    stager: Stager,
    transformer: Transformer,
    optimiser: Box<dyn Optimiser>,
    publisher: Publisher,
}

impl ImagePublisher {
    /// 校验配置并组装流水线。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use imgpub::publish::{Capabilities, ImagePublisher, PublishConfig};
    ///
    /// let publisher = ImagePublisher::new(PublishConfig::new("https://cdn.example/"), capabilities)?;
    /// let snippet = publisher.process_file("photo.jpg", "a cat").await?;
    /// println!("{}", snippet);
    /// ```
    pub fn new(config: PublishConfig, capabilities: Capabilities) -> Result<Self, PublishError> {
        config.validate()?;

        let stager = match &config.temp_dir {
            Some(dir) => Stager::in_dir(dir),
            None => Stager::new(),
        };

        Ok(Self {
            stager,
            transformer: Transformer::new(capabilities.resizer, config.thumbnail_max_dimension),
            optimiser: capabilities.optimiser,
            publisher: Publisher::new(capabilities.uploader, capabilities.clipboard, &config),
        })
    }

    /// 处理主入口：暂存 → 缩放 → 优化 → 上传，返回 HTML 片段。
    ///
    /// 无论成功与否，返回前两份临时副本都已删除（或已尝试删除并记录日志）。
    pub async fn process_file(
        &self,
        path: impl AsRef<Path>,
        alt_text: &str,
    ) -> Result<Snippet, PublishError> {
        let total_start = Instant::now();
        let mut timings = StageTimings::default();

        let source = SourceFile::open(path)?;

        let stage_start = Instant::now();
        let staged = self.stager.stage(&source)?;
        timings.stage = stage_start.elapsed();
        log::debug!("➡️ {}", PipelineStage::Staged);

        let result = self.run_stages(&source, &staged, alt_text, &mut timings).await;

        log::debug!("🧹 cleanup");
        staged.cleanup();

        match &result {
            Ok(_) => log::info!(
                "✅ 发布完成 - stage={}ms transform={}ms optimise={}ms upload={}ms total={}ms",
                timings.stage.as_millis(),
                timings.transform.as_millis(),
                timings.optimise.as_millis(),
                timings.upload.as_millis(),
                total_start.elapsed().as_millis()
            ),
            Err(err) => log::error!(
                "❌ 发布失败 - code={} stage={}：{}",
                err.code(),
                err.stage(),
                err
            ),
        }

        result
    }

    async fn run_stages(
        &self,
        source: &SourceFile,
        staged: &StagedPair,
        alt_text: &str,
        timings: &mut StageTimings,
    ) -> Result<Snippet, PublishError> {
        let transform_start = Instant::now();
        self.transformer.shrink_to_fit(&staged.thumbnail).await?;
        timings.transform = transform_start.elapsed();
        log::debug!("➡️ {}", PipelineStage::ThumbnailTransformed);

        let optimise_start = Instant::now();
        optimise_batch(
            self.optimiser.as_ref(),
            &[staged.full.path(), staged.thumbnail.path()],
        )
        .await?;
        timings.optimise = optimise_start.elapsed();
        log::debug!("➡️ {}", PipelineStage::BothOptimised);

        let upload_start = Instant::now();
        let snippet = self
            .publisher
            .publish(source, &staged.full, &staged.thumbnail, alt_text)
            .await?;
        timings.upload = upload_start.elapsed();
        log::debug!("➡️ {}", PipelineStage::BothUploaded);
        log::debug!("➡️ {}", PipelineStage::SnippetReturned);

        Ok(snippet)
    }
}
