//! 对象存储模块
//!
//! # 设计思路
//!
//! 流水线只依赖 `Uploader` 能力接口，具体后端（Backblaze B2）在 `b2` 子模块中实现。
//! 客户端由入口层按配置显式构建后注入，不使用进程级全局单例，
//! 测试可用内存实现替换。
//!
//! # 实现思路
//!
//! - 上传以整块字节（`Bytes`）提交，不做分片。
//! - 返回存储侧确认的对象键与文件 ID，公开链接由调用方拼装。
//! - 不做重试与回滚：任何一次写入失败都直接上抛。

pub mod b2;

use async_trait::async_trait;
use bytes::Bytes;

use crate::publish::PublishError;

pub use b2::{B2Credentials, B2Uploader, DEFAULT_B2_API_URL};

/// 存储侧确认的对象。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// 存储中的完整键，例如 `images/photo_full.jpg`。
    pub file_name: String,
    pub file_id: String,
}

/// 对象写入能力。
#[async_trait]
pub trait Uploader: Send + Sync {
    /// 将 `bytes` 写入 `key`，同名对象以最后一次写入为准。
    async fn upload(&self, key: &str, bytes: Bytes) -> Result<UploadedObject, PublishError>;
}
