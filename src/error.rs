//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 入口层只面对一个 `AppError`：配置阶段的 `ConfigError` 与流水线的 `PublishError`
//! 都通过 `From` 上转，`main` 里可以直接用 `?`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息，原样透传内层消息。
//! - `exit_code()` 给出稳定的进程退出码，脚本可据此区分失败原因。
//!
//! | 退出码 | 含义 |
//! |--------|------|
//! | 0 | 成功 |
//! | 2 | 命令行参数错误（clap 直接退出） |
//! | 3 | 配置缺失或非法 |
//! | 4 | 原图不存在 |
//! | 5 | 参数非法 |
//! | 6 | 外部工具不存在 |
//! | 7 | 外部工具执行失败 |
//! | 8 | 上传失败 |
//! | 9 | 对象存储认证失败 |
//! | 10 | 剪贴板写入失败（仅严格模式） |
//! | 11 | 文件系统错误 |

use crate::publish::PublishError;
use crate::settings::ConfigError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 环境配置缺失或非法
    #[error("配置错误：{0}")]
    Config(#[from] ConfigError),

    /// 发布流水线错误
    #[error("{0}")]
    Publish(#[from] PublishError),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 3,
            Self::Publish(err) => match err {
                PublishError::NotFound(_) => 4,
                PublishError::InvalidArgument(_) => 5,
                PublishError::ToolMissing { .. } => 6,
                PublishError::ToolFailed { .. } => 7,
                PublishError::Upload(_) => 8,
                PublishError::Authorization(_) => 9,
                PublishError::Clipboard(_) => 10,
                PublishError::FileSystem(_) => 11,
            },
        }
    }

    /// 日志检索用的稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Publish(err) => err.code(),
        }
    }
}
