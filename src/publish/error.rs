//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载发布链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! `code()` / `stage()` 给出稳定标识，供 CLI 退出码映射与日志检索使用。

/// 发布流水线统一错误类型。
///
/// 该类型会在入口层被上转为 `AppError`，最终映射为进程退出码。
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("文件不存在：{0}")]
    NotFound(String),

    #[error("参数错误：{0}")]
    InvalidArgument(String),

    #[error("外部工具不存在：{tool}")]
    ToolMissing { tool: String },

    #[error("外部工具执行失败：{tool}（{status}）{diagnostic}")]
    ToolFailed {
        tool: String,
        status: String,
        diagnostic: String,
    },

    #[error("上传失败：{0}")]
    Upload(String),

    #[error("对象存储认证失败：{0}")]
    Authorization(String),

    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("文件错误：{0}")]
    FileSystem(String),
}

impl PublishError {
    /// 稳定错误码（snake_case）。
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ToolMissing { .. } => "tool_missing",
            Self::ToolFailed { .. } => "tool_failed",
            Self::Upload(_) => "upload_failed",
            Self::Authorization(_) => "authorization_failed",
            Self::Clipboard(_) => "clipboard_failed",
            Self::FileSystem(_) => "filesystem",
        }
    }

    /// 产生该错误的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::FileSystem(_) => "stage",
            Self::InvalidArgument(_) => "optimise",
            Self::ToolMissing { .. } | Self::ToolFailed { .. } => "process",
            Self::Upload(_) | Self::Authorization(_) => "upload",
            Self::Clipboard(_) => "clipboard",
        }
    }
}
