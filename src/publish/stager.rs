//! # 暂存模块
//!
//! ## 设计思路
//!
//! 将原图复制为两份互相独立的临时文件（原图副本 / 缩略图副本），
//! 后续阶段只在副本上原地修改，原图始终只读。
//!
//! ## 实现思路
//!
//! - 原图只读取一次，同一份字节写入两个临时文件。
//! - 临时文件保留原扩展名作为后缀，外部工具依赖扩展名识别格式。
//! - 副本以 `TempPath` 持有：即使流水线中途 `?` 返回或 panic，`Drop` 也会删除文件。
//! - 正常路径上调用 `StagedPair::cleanup()` 显式删除，并把失败写入日志。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;

use super::source::{Candidate, CandidateRole, SourceFile};
use super::PublishError;

const TEMP_PREFIX: &str = "imgpub-";

/// 一次调用内的两份副本。
#[derive(Debug)]
pub struct StagedPair {
    pub full: Candidate,
    pub thumbnail: Candidate,
}

impl StagedPair {
    /// 删除两份副本。
    ///
    /// 删除失败只记录日志，不覆盖流水线本身的结果。
    pub fn cleanup(self) {
        for candidate in [self.full, self.thumbnail] {
            let role = candidate.role;
            let path = candidate.path().to_path_buf();
            match candidate.path.close() {
                Ok(()) => log::debug!("🧹 已删除临时文件 - {}: {}", role.as_str(), path.display()),
                Err(err) => log::warn!(
                    "⚠️ 删除临时文件失败 - {}: {}（{}）",
                    role.as_str(),
                    path.display(),
                    err
                ),
            }
        }
    }
}

/// 临时副本生成器。
#[derive(Debug, Clone, Default)]
pub struct Stager {
    temp_dir: Option<PathBuf>,
}

impl Stager {
    /// 使用系统临时目录。
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定目录存放副本。
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    /// 生成两份与原图字节一致的副本。
    pub fn stage(&self, source: &SourceFile) -> Result<StagedPair, PublishError> {
        if !source.path().exists() {
            return Err(PublishError::NotFound(source.path().display().to_string()));
        }

        let data = fs::read(source.path())
            .map_err(|e| PublishError::FileSystem(format!("无法读取原图：{}", e)))?;

        let full = self.write_candidate(CandidateRole::Full, source.extension(), &data)?;
        let thumbnail = self.write_candidate(CandidateRole::Thumbnail, source.extension(), &data)?;

        log::debug!(
            "📦 已暂存 {} 字节 - full: {} thumbnail: {}",
            data.len(),
            full.path().display(),
            thumbnail.path().display()
        );

        Ok(StagedPair { full, thumbnail })
    }

    fn write_candidate(
        &self,
        role: CandidateRole,
        extension: &str,
        data: &[u8],
    ) -> Result<Candidate, PublishError> {
        let mut builder = Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(extension);

        let created = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = created
            .map_err(|e| PublishError::FileSystem(format!("创建临时文件失败：{}", e)))?;

        // 句柄在 into_temp_path 时关闭，外部工具才能安全改写文件。
        file.write_all(data)
            .and_then(|_| file.flush())
            .map_err(|e| PublishError::FileSystem(format!("写入临时文件失败：{}", e)))?;

        Ok(Candidate {
            role,
            path: file.into_temp_path(),
        })
    }
}

/// 读取文件大小，失败时返回 `None`（仅用于日志）。
pub(crate) fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}
