//! 剪贴板写入模块
//!
//! # 设计思路
//!
//! 发布完成后把 HTML 片段复制到系统剪贴板，属于“尽力而为”的附带动作。
//! 流水线只依赖 `ClipboardWriter` 接口，写入方式由配置决定：
//! - **system**：通过 `arboard` 直接写入（阻塞线程中执行）
//! - **command**：把文本写入平台剪贴板程序的标准输入（pbcopy / wl-copy / xclip / clip）
//! - **off**：不写剪贴板
//!
//! # 实现思路
//!
//! - `ClipboardMode` 负责模式字符串解析与反向输出。
//! - `build_writer` 按模式构造具体实现，入口层只持有 `Box<dyn ClipboardWriter>`。
//! - 写入失败统一映射为 `PublishError::Clipboard`，是否致命由流水线决定。

pub mod command;
pub mod system;

use async_trait::async_trait;

use crate::publish::PublishError;

pub use command::CommandClipboard;
pub use system::SystemClipboard;

/// 文本写入剪贴板的能力。
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), PublishError>;
}

/// 剪贴板写入方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMode {
    System,
    Command,
    Off,
}

impl ClipboardMode {
    /// 从外部字符串解析模式。
    ///
    /// # 示例
    /// ```rust
    /// use imgpub::clipboard::ClipboardMode;
    ///
    /// let mode = ClipboardMode::parse(" Command ")?;
    /// assert_eq!(mode.as_str(), "command");
    /// # Ok::<(), imgpub::publish::PublishError>(())
    /// ```
    pub fn parse(mode: &str) -> Result<Self, PublishError> {
        match mode.trim().to_lowercase().as_str() {
            "system" => Ok(Self::System),
            "command" => Ok(Self::Command),
            "off" | "none" => Ok(Self::Off),
            other => Err(PublishError::InvalidArgument(format!(
                "未知剪贴板模式：{}（可选：system / command / off）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Command => "command",
            Self::Off => "off",
        }
    }

    /// 平台默认模式。
    ///
    /// Windows 剪贴板由系统持有数据，直接用 arboard；
    /// 其余平台的选区归写入进程所有，短命进程退出即丢失，交给常驻的 pbcopy / xclip / wl-copy。
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::System
        } else {
            Self::Command
        }
    }
}

/// 关闭剪贴板写入时使用的空实现。
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledClipboard;

#[async_trait]
impl ClipboardWriter for DisabledClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), PublishError> {
        log::debug!("📋 剪贴板写入已关闭，跳过");
        Ok(())
    }
}

/// 按模式构造写入器。
pub fn build_writer(mode: ClipboardMode) -> Box<dyn ClipboardWriter> {
    match mode {
        ClipboardMode::System => Box::new(SystemClipboard),
        ClipboardMode::Command => {
            let writer = CommandClipboard::platform_default();
            log::debug!("📋 剪贴板程序：{}", writer.program());
            Box::new(writer)
        }
        ClipboardMode::Off => Box::new(DisabledClipboard),
    }
}
