//! 通过 `arboard` 写入系统剪贴板。
//!
//! `arboard` 调用会阻塞，放在 `spawn_blocking` 中执行，避免占住运行时线程。
//! Linux/X11 下剪贴板内容由写入进程持有，进程退出后是否保留取决于桌面的剪贴板管理器。

use async_trait::async_trait;

use super::ClipboardWriter;
use crate::publish::PublishError;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

#[async_trait]
impl ClipboardWriter for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), PublishError> {
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| PublishError::Clipboard(format!("无法访问剪贴板：{}", e)))?;
            clipboard
                .set_text(text)
                .map_err(|e| PublishError::Clipboard(format!("写入剪贴板失败：{}", e)))
        })
        .await
        .map_err(|e| PublishError::Clipboard(format!("线程执行失败：{}", e)))?
    }
}
