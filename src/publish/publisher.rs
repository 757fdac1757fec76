//! # 发布模块
//!
//! ## 设计思路
//!
//! 负责流水线的最后一段：派生对象名 → 上传（先原图后缩略图）→ 拼装 HTML → 写剪贴板。
//!
//! ## 实现思路
//!
//! - 上传顺序固定，便于测试断言。
//! - 两次写入不是事务：缩略图失败时已上传的原图不回滚，只在日志中记录其键与文件 ID。
//! - 剪贴板写入默认失败只告警；`strict_clipboard` 开启时失败会让调用失败。

use bytes::Bytes;

use super::snippet::{derive_object_name, render_snippet, strip_key_prefix};
use super::source::{Candidate, Snippet, SourceFile, UploadResult};
use super::{PublishConfig, PublishError};
use crate::clipboard::ClipboardWriter;
use crate::storage::Uploader;

pub struct Publisher {
    uploader: Box<dyn Uploader>,
    clipboard: Box<dyn ClipboardWriter>,
    bucket_url: String,
    key_prefix: String,
    strict_clipboard: bool,
}

impl Publisher {
    pub fn new(
        uploader: Box<dyn Uploader>,
        clipboard: Box<dyn ClipboardWriter>,
        config: &PublishConfig,
    ) -> Self {
        Self {
            uploader,
            clipboard,
            bucket_url: config.bucket_url.clone(),
            key_prefix: config.key_prefix.clone(),
            strict_clipboard: config.strict_clipboard,
        }
    }

    /// 上传两份副本（均已优化）并返回 HTML 片段。
    pub async fn publish(
        &self,
        source: &SourceFile,
        full: &Candidate,
        thumbnail: &Candidate,
        alt_text: &str,
    ) -> Result<Snippet, PublishError> {
        log::info!("⬆️ 开始上传 {}", source.path().display());

        let full = self.upload_candidate(source, full).await?;
        let thumbnail = match self.upload_candidate(source, thumbnail).await {
            Ok(result) => result,
            Err(err) => {
                log::warn!(
                    "⚠️ 缩略图上传失败，已上传的原图不会回滚：{}（file_id={}）",
                    full.object_key,
                    full.file_id
                );
                return Err(err);
            }
        };

        let html = render_snippet(&full.public_url, &thumbnail.public_url, alt_text);
        self.mirror_to_clipboard(&html).await?;

        Ok(Snippet {
            html,
            full,
            thumbnail,
        })
    }

    async fn upload_candidate(
        &self,
        source: &SourceFile,
        candidate: &Candidate,
    ) -> Result<UploadResult, PublishError> {
        let key = format!("{}{}", self.key_prefix, derive_object_name(source, candidate.role()));
        let bytes = tokio::fs::read(candidate.path())
            .await
            .map_err(|e| PublishError::FileSystem(format!("无法读取待上传副本：{}", e)))?;

        let uploaded = self.uploader.upload(&key, Bytes::from(bytes)).await?;
        let object_name = strip_key_prefix(&uploaded.file_name, &self.key_prefix).to_string();
        let public_url = format!("{}{}", self.bucket_url, object_name);

        log::info!("✅ 已上传 {} -> {}", candidate.role().as_str(), uploaded.file_name);

        Ok(UploadResult {
            role: candidate.role(),
            object_key: uploaded.file_name,
            object_name,
            file_id: uploaded.file_id,
            public_url,
        })
    }

    async fn mirror_to_clipboard(&self, html: &str) -> Result<(), PublishError> {
        match self.clipboard.write_text(html).await {
            Ok(()) => {
                log::info!("📋 HTML 片段已复制到剪贴板");
                Ok(())
            }
            Err(err) if self.strict_clipboard => Err(err),
            Err(err) => {
                log::warn!("⚠️ 复制到剪贴板失败（已忽略）：{}", err);
                Ok(())
            }
        }
    }
}
