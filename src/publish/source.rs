//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“流水线中间结果”解耦：
//! - `SourceFile` 表示用户给出的原图（只读）
//! - `Candidate` 表示流水线独占的临时副本（原图 / 缩略图）
//! - `UploadResult` 表示已写入对象存储的结果
//! - `Snippet` 表示最终输出的 HTML 片段

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::PublishError;

/// 用户提供的原图。
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    basename: String,
    extension: String,
}

impl SourceFile {
    /// 校验路径存在并拆出文件名与扩展名。
    ///
    /// 扩展名带前导 `.`；没有扩展名时为空字符串。
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PublishError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PublishError::NotFound(path.display().to_string()));
        }
        if !path.is_file() {
            return Err(PublishError::InvalidArgument(format!(
                "不是普通文件：{}",
                path.display()
            )));
        }

        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PublishError::InvalidArgument(format!("无法解析文件名：{}", path.display()))
            })?;
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            basename,
            extension,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// 临时副本的角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRole {
    Full,
    Thumbnail,
}

impl CandidateRole {
    /// 派生远端对象名时使用的后缀。
    pub fn name_suffix(self) -> &'static str {
        match self {
            Self::Full => "_full",
            Self::Thumbnail => "_thumb",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Thumbnail => "thumbnail",
        }
    }
}

/// 流水线独占的临时副本。
///
/// 持有 `TempPath`，离开作用域即删除文件。
pub struct Candidate {
    pub(crate) role: CandidateRole,
    pub(crate) path: TempPath,
}

impl Candidate {
    pub fn role(&self) -> CandidateRole {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("role", &self.role)
            .field("path", &self.path())
            .finish()
    }
}

/// 单个副本上传后的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub role: CandidateRole,
    /// 存储中的完整键，例如 `images/photo_full.jpg`。
    pub object_key: String,
    /// 去掉上传前缀后的对象名，例如 `photo_full.jpg`。
    pub object_name: String,
    /// 存储侧分配的文件 ID。
    pub file_id: String,
    pub public_url: String,
}

/// 最终输出的 HTML 片段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub html: String,
    pub full: UploadResult,
    pub thumbnail: UploadResult,
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}
