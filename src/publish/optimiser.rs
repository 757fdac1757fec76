//! # 优化模块
//!
//! 两份副本必须在**同一次**外部调用中完成优化（一次进程启动覆盖所有文件），
//! 这是耗时约束而不只是便利写法。优化器原地改写文件，体积只减不增。

use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;

use super::stager::file_size;
use super::tool::run_tool;
use super::PublishError;

#[cfg(target_os = "macos")]
pub const DEFAULT_OPTIMISER_PROGRAM: &str = "/Applications/ImageOptim.app/Contents/MacOS/ImageOptim";

#[cfg(not(target_os = "macos"))]
pub const DEFAULT_OPTIMISER_PROGRAM: &str = "image_optim";

/// 批量原地优化能力。
#[async_trait]
pub trait Optimiser: Send + Sync {
    /// 一次调用优化全部文件。调用方保证 `paths` 非空。
    async fn optimise(&self, paths: &[&Path]) -> Result<(), PublishError>;
}

/// 校验批次并发起唯一一次优化调用。
pub async fn optimise_batch(optimiser: &dyn Optimiser, paths: &[&Path]) -> Result<(), PublishError> {
    if paths.is_empty() {
        return Err(PublishError::InvalidArgument("优化批次为空".to_string()));
    }

    let before: Vec<Option<u64>> = paths.iter().map(|p| file_size(p)).collect();
    optimiser.optimise(paths).await?;

    for (path, before) in paths.iter().zip(before) {
        let after = file_size(path);
        match (before, after) {
            (Some(before), Some(after)) if after > before => log::warn!(
                "⚠️ 优化后体积变大 - {}: {} -> {} 字节",
                path.display(),
                before,
                after
            ),
            (Some(before), Some(after)) => log::info!(
                "🗜️ 已优化 {}: {} -> {} 字节",
                path.display(),
                before,
                after
            ),
            _ => log::debug!("无法读取 {} 的体积", path.display()),
        }
    }

    Ok(())
}

/// 调用外部批量优化程序（默认 ImageOptim / image_optim）。
///
/// 命令行形如 `<program> <args>... <path>...`。
#[derive(Debug, Clone)]
pub struct CommandOptimiser {
    program: String,
    args: Vec<String>,
}

impl CommandOptimiser {
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_args(program, Vec::<String>::new())
    }

    /// 在文件路径之前追加固定参数。
    pub fn with_args<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CommandOptimiser {
    fn default() -> Self {
        Self::new(DEFAULT_OPTIMISER_PROGRAM)
    }
}

#[async_trait]
impl Optimiser for CommandOptimiser {
    async fn optimise(&self, paths: &[&Path]) -> Result<(), PublishError> {
        let args: Vec<&OsStr> = self
            .args
            .iter()
            .map(OsStr::new)
            .chain(paths.iter().map(|p| p.as_os_str()))
            .collect();
        run_tool(&self.program, args).await
    }
}
