//! 通过平台剪贴板程序写入：文本写入子进程标准输入。

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::ClipboardWriter;
use crate::publish::PublishError;

#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// 按平台选择剪贴板程序。
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("pbcopy", Vec::<String>::new())
        } else if cfg!(target_os = "windows") {
            Self::new("clip", Vec::<String>::new())
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new("wl-copy", Vec::<String>::new())
        } else {
            Self::new("xclip", ["-selection", "clipboard"])
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ClipboardWriter for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), PublishError> {
        // xclip 等程序会在后台常驻持有选区，不能等待其输出管道关闭。
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    PublishError::Clipboard(format!("剪贴板程序不存在：{}", self.program))
                }
                _ => PublishError::Clipboard(format!("启动 {} 失败：{}", self.program, e)),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| PublishError::Clipboard(format!("写入 {} 失败：{}", self.program, e)))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| PublishError::Clipboard(format!("等待 {} 失败：{}", self.program, e)))?;

        if !status.success() {
            return Err(PublishError::Clipboard(format!("{} 退出异常：{}", self.program, status)));
        }

        log::debug!("📋 已通过 {} 写入剪贴板", self.program);
        Ok(())
    }
}
