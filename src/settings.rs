//! 运行配置模块
//!
//! # 设计思路
//!
//! 所有配置来自环境变量（入口层会先尝试加载 `.env`）。
//! 解析集中在 `AppSettings::from_lookup`，测试传入内存表即可，不必修改进程环境。
//!
//! # 实现思路
//!
//! - 必填项缺失或为空时返回 `ConfigError::MissingVar`，携带变量名。
//! - 可选项给出生产默认值，非法取值返回 `ConfigError::Invalid`。
//! - `AppSettings` 同时充当能力工厂：按配置构造缩放器 / 优化器 / 剪贴板写入器。

use std::fmt;
use std::path::{Path, PathBuf};

use crate::clipboard::{self, ClipboardMode, ClipboardWriter};
use crate::publish::{
    BuiltinResizer, CommandOptimiser, MagickResizer, Optimiser, PublishConfig, Resizer,
    DEFAULT_OPTIMISER_PROGRAM, THUMBNAIL_MAX_DIMENSION_RANGE,
};
use crate::storage::{B2Credentials, DEFAULT_B2_API_URL};

pub const ENV_KEY_ID: &str = "B2_APPLICATION_KEY_ID";
pub const ENV_APPLICATION_KEY: &str = "B2_APPLICATION_KEY";
pub const ENV_BUCKET_NAME: &str = "BUCKET_NAME";
pub const ENV_BUCKET_URL: &str = "BUCKET_URL";
pub const ENV_B2_API_URL: &str = "B2_API_URL";
pub const ENV_RESIZER: &str = "IMGPUB_RESIZER";
pub const ENV_CONVERT_BIN: &str = "IMGPUB_CONVERT_BIN";
pub const ENV_CONVERT_ARGS: &str = "IMGPUB_CONVERT_ARGS";
pub const ENV_OPTIMISER_BIN: &str = "IMGPUB_OPTIMISER_BIN";
pub const ENV_OPTIMISER_ARGS: &str = "IMGPUB_OPTIMISER_ARGS";
pub const ENV_THUMB_MAX: &str = "IMGPUB_THUMB_MAX";
pub const ENV_CLIPBOARD: &str = "IMGPUB_CLIPBOARD";
pub const ENV_STRICT_CLIPBOARD: &str = "IMGPUB_STRICT_CLIPBOARD";
pub const ENV_TMP_DIR: &str = "IMGPUB_TMP_DIR";

/// 配置解析错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("缺少环境变量 {0}")]
    MissingVar(&'static str),

    #[error("环境变量 {name}={value} 无效：{reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// 缩放实现选择。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizerKind {
    ImageMagick,
    Builtin,
}

impl ResizerKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "imagemagick" | "magick" | "convert" => Some(Self::ImageMagick),
            "builtin" | "native" => Some(Self::Builtin),
            _ => None,
        }
    }
}

/// 进程级运行配置。
#[derive(Clone)]
pub struct AppSettings {
    pub credentials: B2Credentials,
    pub bucket_name: String,
    pub b2_api_url: String,
    pub resizer: ResizerKind,
    pub convert_program: String,
    pub convert_args: Vec<String>,
    pub optimiser_program: String,
    pub optimiser_args: Vec<String>,
    pub clipboard: ClipboardMode,
    pub publish: PublishConfig,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("credentials", &self.credentials)
            .field("bucket_name", &self.bucket_name)
            .field("b2_api_url", &self.b2_api_url)
            .field("resizer", &self.resizer)
            .field("convert_program", &self.convert_program)
            .field("convert_args", &self.convert_args)
            .field("optimiser_program", &self.optimiser_program)
            .field("optimiser_args", &self.optimiser_args)
            .field("clipboard", &self.clipboard)
            .field("publish", &self.publish)
            .finish()
    }
}

impl AppSettings {
    /// 从进程环境读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取配置。
    ///
    /// # 示例
    /// ```rust
    /// use std::collections::HashMap;
    /// use imgpub::settings::AppSettings;
    ///
    /// let env: HashMap<&str, &str> = HashMap::from([
    ///     ("B2_APPLICATION_KEY_ID", "id"),
    ///     ("B2_APPLICATION_KEY", "secret"),
    ///     ("BUCKET_NAME", "pics"),
    ///     ("BUCKET_URL", "https://cdn.example/"),
    /// ]);
    /// let settings = AppSettings::from_lookup(|k| env.get(k).map(|v| v.to_string()))?;
    /// assert_eq!(settings.publish.thumbnail_max_dimension, 800);
    /// # Ok::<(), imgpub::settings::ConfigError>(())
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingVar(name));

        let credentials = B2Credentials {
            key_id: require(ENV_KEY_ID)?,
            application_key: require(ENV_APPLICATION_KEY)?,
        };
        let bucket_name = require(ENV_BUCKET_NAME)?;
        let bucket_url = require(ENV_BUCKET_URL)?;

        let resizer = match get(ENV_RESIZER) {
            None => ResizerKind::ImageMagick,
            Some(value) => ResizerKind::parse(&value).ok_or_else(|| ConfigError::Invalid {
                name: ENV_RESIZER,
                value,
                reason: "可选：imagemagick / builtin".to_string(),
            })?,
        };

        let clipboard = match get(ENV_CLIPBOARD) {
            None => ClipboardMode::platform_default(),
            Some(value) => ClipboardMode::parse(&value).map_err(|e| ConfigError::Invalid {
                name: ENV_CLIPBOARD,
                value,
                reason: e.to_string(),
            })?,
        };

        let strict_clipboard = match get(ENV_STRICT_CLIPBOARD) {
            None => false,
            Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::Invalid {
                name: ENV_STRICT_CLIPBOARD,
                value,
                reason: "应为 true / false".to_string(),
            })?,
        };

        let mut publish = PublishConfig::new(bucket_url);
        publish.strict_clipboard = strict_clipboard;
        if let Some(value) = get(ENV_TMP_DIR) {
            if !Path::new(&value).is_dir() {
                return Err(ConfigError::Invalid {
                    name: ENV_TMP_DIR,
                    value,
                    reason: "目录不存在".to_string(),
                });
            }
            publish.temp_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get(ENV_THUMB_MAX) {
            publish.thumbnail_max_dimension = value.parse().map_err(|_| ConfigError::Invalid {
                name: ENV_THUMB_MAX,
                value: value.clone(),
                reason: "应为正整数".to_string(),
            })?;
        }
        if !THUMBNAIL_MAX_DIMENSION_RANGE.contains(&publish.thumbnail_max_dimension) {
            return Err(ConfigError::Invalid {
                name: ENV_THUMB_MAX,
                value: publish.thumbnail_max_dimension.to_string(),
                reason: format!(
                    "应在 {}~{} 之间",
                    THUMBNAIL_MAX_DIMENSION_RANGE.start(),
                    THUMBNAIL_MAX_DIMENSION_RANGE.end()
                ),
            });
        }

        Ok(Self {
            credentials,
            bucket_name,
            b2_api_url: get(ENV_B2_API_URL).unwrap_or_else(|| DEFAULT_B2_API_URL.to_string()),
            resizer,
            convert_program: get(ENV_CONVERT_BIN).unwrap_or_else(|| "convert".to_string()),
            convert_args: get(ENV_CONVERT_ARGS).map(split_args).unwrap_or_default(),
            optimiser_program: get(ENV_OPTIMISER_BIN)
                .unwrap_or_else(|| DEFAULT_OPTIMISER_PROGRAM.to_string()),
            optimiser_args: get(ENV_OPTIMISER_ARGS).map(split_args).unwrap_or_default(),
            clipboard,
            publish,
        })
    }

    pub fn build_resizer(&self) -> Box<dyn Resizer> {
        match self.resizer {
            ResizerKind::ImageMagick => Box::new(MagickResizer::with_args(
                self.convert_program.clone(),
                self.convert_args.clone(),
            )),
            ResizerKind::Builtin => Box::new(BuiltinResizer::default()),
        }
    }

    pub fn build_optimiser(&self) -> Box<dyn Optimiser> {
        Box::new(CommandOptimiser::with_args(
            self.optimiser_program.clone(),
            self.optimiser_args.clone(),
        ))
    }

    pub fn build_clipboard(&self) -> Box<dyn ClipboardWriter> {
        clipboard::build_writer(self.clipboard)
    }
}

fn split_args(args: String) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
