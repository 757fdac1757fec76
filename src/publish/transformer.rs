//! # 缩放模块
//!
//! ## 设计思路
//!
//! 只对缩略图副本做“等比缩入边界框”（box-fit）：宽高都不超过上限，
//! 已在范围内则不做任何改动。原图副本保持原分辨率。
//!
//! ## 实现思路
//!
//! - `Resizer` 是能力接口，流水线只依赖接口。
//! - `MagickResizer`：调用 ImageMagick，`<bound>x<bound>>` 语义即“仅在更大时缩小”。
//! - `BuiltinResizer`：进程内实现，`image` 解码 + `fast_image_resize` 缩放，
//!   卷积失败时回退 `DynamicImage::thumbnail_exact`，按原格式写回。

use std::ffi::OsStr;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb, Rgba};

use super::source::Candidate;
use super::tool::run_tool;
use super::PublishError;

/// 缩略图默认边界（像素）。
pub const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 800;

const BUILTIN_TOOL_NAME: &str = "builtin";

/// 原地缩放能力。
#[async_trait]
pub trait Resizer: Send + Sync {
    /// 将 `path` 指向的图片缩入 `bound x bound`，仅在更大时生效，原地覆盖。
    async fn shrink_to_fit(&self, path: &Path, bound: u32) -> Result<(), PublishError>;
}

/// 流水线中的缩放阶段。
pub struct Transformer {
    resizer: Box<dyn Resizer>,
    bound: u32,
}

impl Transformer {
    pub fn new(resizer: Box<dyn Resizer>, bound: u32) -> Self {
        Self { resizer, bound }
    }

    /// 缩放缩略图副本。
    pub async fn shrink_to_fit(&self, candidate: &Candidate) -> Result<(), PublishError> {
        log::debug!(
            "🧩 缩放 {} 副本至 {}x{} 以内",
            candidate.role().as_str(),
            self.bound,
            self.bound
        );
        self.resizer.shrink_to_fit(candidate.path(), self.bound).await
    }
}

/// 计算等比缩入边界框后的目标尺寸。
///
/// 已在边界内返回 `None`；每边至少 1 像素。
pub fn box_fit(width: u32, height: u32, bound: u32) -> Option<(u32, u32)> {
    if width <= bound && height <= bound {
        return None;
    }

    let scale = (bound as f64 / width as f64).min(bound as f64 / height as f64);
    let target_width = ((width as f64 * scale).round() as u32).clamp(1, bound);
    let target_height = ((height as f64 * scale).round() as u32).clamp(1, bound);
    Some((target_width, target_height))
}

/// 调用 ImageMagick 的缩放实现。
///
/// 命令行形如 `<program> <args>... <path> -resize NxN> <path>`，输入输出为同一文件。
#[derive(Debug, Clone)]
pub struct MagickResizer {
    program: String,
    args: Vec<String>,
}

impl MagickResizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_args(program, Vec::<String>::new())
    }

    /// 在输入路径之前追加固定参数，例如 GraphicsMagick 的 `gm convert`。
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

impl Default for MagickResizer {
    fn default() -> Self {
        Self::new("convert")
    }
}

#[async_trait]
impl Resizer for MagickResizer {
    async fn shrink_to_fit(&self, path: &Path, bound: u32) -> Result<(), PublishError> {
        let geometry = format!("{0}x{0}>", bound);
        let args: Vec<&OsStr> = self
            .args
            .iter()
            .map(OsStr::new)
            .chain([
                path.as_os_str(),
                OsStr::new("-resize"),
                OsStr::new(&geometry),
                path.as_os_str(),
            ])
            .collect();
        run_tool(&self.program, args).await
    }
}

/// 进程内缩放实现。
#[derive(Debug, Clone)]
pub struct BuiltinResizer {
    filter: fr::FilterType,
}

impl BuiltinResizer {
    pub fn new(filter: fr::FilterType) -> Self {
        Self { filter }
    }
}

impl Default for BuiltinResizer {
    fn default() -> Self {
        Self::new(fr::FilterType::Lanczos3)
    }
}

#[async_trait]
impl Resizer for BuiltinResizer {
    async fn shrink_to_fit(&self, path: &Path, bound: u32) -> Result<(), PublishError> {
        let path: PathBuf = path.to_path_buf();
        let filter = self.filter;

        tokio::task::spawn_blocking(move || shrink_file(&path, bound, filter))
            .await
            .map_err(|e| builtin_failure(format!("线程执行失败：{}", e)))?
    }
}

fn shrink_file(path: &Path, bound: u32, filter: fr::FilterType) -> Result<(), PublishError> {
    let bytes = std::fs::read(path)
        .map_err(|e| PublishError::FileSystem(format!("无法读取待缩放文件：{}", e)))?;

    let format = image::guess_format(&bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|e| builtin_failure(format!("不支持的图片格式：{}", e)))?;

    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| builtin_failure(format!("图片解码失败：{}", e)))?;

    let (width, height) = decoded.dimensions();
    let Some((target_width, target_height)) = box_fit(width, height, bound) else {
        log::debug!("⏭️ {}x{} 已在 {}x{} 以内，跳过缩放", width, height, bound, bound);
        return Ok(());
    };

    log::info!(
        "🧩 缩略图 {}x{} -> {}x{}（{:?}）",
        width,
        height,
        target_width,
        target_height,
        filter
    );

    let thumbnail = match convolve(&decoded, target_width, target_height, filter) {
        Ok(thumbnail) => thumbnail,
        Err(reason) => {
            log::warn!("⚠️ 卷积缩放失败，改用 thumbnail_exact：{}", reason);
            decoded.thumbnail_exact(target_width, target_height)
        }
    };

    let mut encoded = Cursor::new(Vec::new());
    thumbnail
        .write_to(&mut encoded, format)
        .map_err(|e| builtin_failure(format!("图片编码失败：{}", e)))?;

    std::fs::write(path, encoded.into_inner())
        .map_err(|e| PublishError::FileSystem(format!("写回缩略图失败：{}", e)))
}

/// 按原图是否带 alpha 选择 RGB / RGBA 缓冲，JPEG 等格式无法写入 alpha。
fn convolve(
    decoded: &DynamicImage,
    width: u32,
    height: u32,
    filter: fr::FilterType,
) -> Result<DynamicImage, String> {
    let has_alpha = decoded.color().has_alpha();
    let (pixels, pixel_type) = if has_alpha {
        (decoded.to_rgba8().into_raw(), fr::PixelType::U8x4)
    } else {
        (decoded.to_rgb8().into_raw(), fr::PixelType::U8x3)
    };

    let src = fr::images::Image::from_vec_u8(decoded.width(), decoded.height(), pixels, pixel_type)
        .map_err(|e| e.to_string())?;
    let mut dst = fr::images::Image::new(width, height, pixel_type);
    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(filter));
    fr::Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| e.to_string())?;

    let raw = dst.into_vec();
    let thumbnail = if has_alpha {
        ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageRgba8)
    } else {
        ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
    };
    thumbnail.ok_or_else(|| format!("输出缓冲长度与 {}x{} 不符", width, height))
}

fn builtin_failure(diagnostic: String) -> PublishError {
    PublishError::ToolFailed {
        tool: BUILTIN_TOOL_NAME.to_string(),
        status: "error".to_string(),
        diagnostic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x % 255) as u8;
            let g = (y % 255) as u8;
            let b = ((x + y) % 255) as u8;
            Rgba([r, g, b, 255])
        });
        let dyn_img = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        dyn_img.save_with_format(path, format).expect("failed to encode test image");
    }

    #[test]
    fn box_fit_preserves_aspect_ratio() {
        assert_eq!(box_fit(1600, 900, 800), Some((800, 450)));
        assert_eq!(box_fit(900, 1600, 800), Some((450, 800)));
        assert_eq!(box_fit(801, 801, 800), Some((800, 800)));
    }

    #[test]
    fn box_fit_is_noop_within_bound() {
        assert_eq!(box_fit(800, 800, 800), None);
        assert_eq!(box_fit(640, 480, 800), None);
        assert_eq!(box_fit(1, 1, 800), None);
    }

    #[test]
    fn box_fit_never_collapses_to_zero() {
        assert_eq!(box_fit(10_000, 1, 800), Some((800, 1)));
    }

    #[tokio::test]
    async fn builtin_shrinks_large_png() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("wide.png");
        write_image(&path, 1600, 1000, ImageFormat::Png);

        BuiltinResizer::default()
            .shrink_to_fit(&path, 800)
            .await
            .expect("resize should succeed");

        let resized = image::open(&path).expect("reopen failed");
        assert_eq!(resized.dimensions(), (800, 500));
    }

    #[tokio::test]
    async fn builtin_keeps_jpeg_format() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("tall.jpg");
        write_image(&path, 600, 1200, ImageFormat::Jpeg);

        BuiltinResizer::default()
            .shrink_to_fit(&path, 800)
            .await
            .expect("resize should succeed");

        let bytes = std::fs::read(&path).expect("read failed");
        assert_eq!(image::guess_format(&bytes).expect("guess failed"), ImageFormat::Jpeg);
        let (w, h) = image::load_from_memory(&bytes).expect("decode failed").dimensions();
        assert_eq!((w, h), (400, 800));
    }

    #[tokio::test]
    async fn builtin_leaves_small_image_untouched() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("small.png");
        write_image(&path, 320, 200, ImageFormat::Png);
        let before = std::fs::read(&path).expect("read failed");

        BuiltinResizer::default()
            .shrink_to_fit(&path, 800)
            .await
            .expect("resize should succeed");

        assert_eq!(std::fs::read(&path).expect("read failed"), before);
    }

    #[tokio::test]
    async fn builtin_rejects_non_image() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not pixels").expect("write failed");

        let result = BuiltinResizer::default().shrink_to_fit(&path, 800).await;
        assert!(matches!(result, Err(PublishError::ToolFailed { tool, .. }) if tool == "builtin"));
    }

    #[tokio::test]
    async fn magick_missing_binary_is_tool_missing() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("a.png");
        write_image(&path, 10, 10, ImageFormat::Png);

        let result = MagickResizer::new("imgpub-no-such-convert")
            .shrink_to_fit(&path, 800)
            .await;
        assert!(matches!(result, Err(PublishError::ToolMissing { .. })));
    }

    #[cfg(unix)]
    async fn magick_argv(dir: &Path, bound: u32) -> (PathBuf, String) {
        let log_path = dir.join("argv.log");
        let image = dir.join("thumb.png");
        write_image(&image, 10, 10, ImageFormat::Png);

        let script = format!("printf '%s|' \"$@\" > '{}'", log_path.display());
        MagickResizer::with_args("sh", ["-c".to_string(), script, "fake-convert".to_string()])
            .shrink_to_fit(&image, bound)
            .await
            .expect("fake convert should succeed");

        let argv = std::fs::read_to_string(&log_path).expect("read log failed");
        (image, argv)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn magick_shrinks_in_place_only_when_larger() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let (image, argv) = magick_argv(dir.path(), 800).await;
        let image = image.display().to_string();
        assert_eq!(argv, format!("{0}|-resize|800x800>|{0}|", image));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn magick_geometry_follows_configured_bound() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let (_, argv) = magick_argv(dir.path(), 320).await;
        let parts: Vec<&str> = argv.split('|').collect();
        assert_eq!(parts[1], "-resize");
        assert_eq!(parts[2], "320x320>");
        assert_eq!(parts[0], parts[3]);
    }
}
