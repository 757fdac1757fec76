//! # 图片发布模块（publish）
//!
//! ## 设计思路
//!
//! 该模块将“原图校验 → 暂存副本 → 缩放 → 批量优化 → 上传 → 拼装 HTML”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线（含清理与阶段耗时日志）
//! - `stager`：复制原图为两份临时副本
//! - `transformer`：缩略图 box-fit 缩放（ImageMagick / 内置实现）
//! - `optimiser`：单次批量优化
//! - `publisher`：上传、拼装 HTML、写剪贴板
//! - `tool`：外部程序调用与错误映射
//! - `config/error/source/snippet`：配置、错误、中间数据模型、命名与 HTML
//!
//! ## 新同事快速上手
//!
//! ```text
//! main.rs（参数 + 环境配置）
//!    ↓
//! handler.rs（ImagePublisher::process_file）
//!    ├─ stager.rs（两份临时副本，RAII 清理）
//!    ├─ transformer.rs（缩放缩略图）
//!    ├─ optimiser.rs（一次批量优化）
//!    └─ publisher.rs（storage::Uploader + clipboard::ClipboardWriter）
//!    ↓
//! Snippet / PublishError
//! ```

mod config;
mod error;
mod handler;
mod optimiser;
mod publisher;
mod snippet;
mod source;
mod stager;
mod tool;
mod transformer;

pub use config::{PublishConfig, THUMBNAIL_MAX_DIMENSION_RANGE};
pub use error::PublishError;
pub use handler::{Capabilities, ImagePublisher, PipelineStage};
pub use optimiser::{optimise_batch, CommandOptimiser, Optimiser, DEFAULT_OPTIMISER_PROGRAM};
pub use publisher::Publisher;
pub use snippet::{derive_object_name, escape_attribute, render_snippet, strip_key_prefix, DEFAULT_KEY_PREFIX};
pub use source::{Candidate, CandidateRole, Snippet, SourceFile, UploadResult};
pub use stager::{StagedPair, Stager};
pub use transformer::{
    box_fit, BuiltinResizer, MagickResizer, Resizer, Transformer, DEFAULT_THUMBNAIL_MAX_DIMENSION,
};
