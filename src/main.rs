//! # imgpub — 命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与能力装配。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;

use clap::Parser;
use imgpub::error::AppError;
use imgpub::publish::{Capabilities, ImagePublisher, Snippet, SourceFile};
use imgpub::settings::AppSettings;
use imgpub::storage::B2Uploader;

#[derive(Parser, Debug)]
#[command(name = "imgpub")]
#[command(
    about = "Publish an image and its thumbnail to B2, then print an HTML snippet",
    long_about = None
)]
struct Cli {
    /// Path to the source image
    path: PathBuf,

    /// Alt text for the <img> tag
    alt_text: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match dotenvy::dotenv() {
        Ok(path) => log::debug!("已加载 {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => log::warn!("⚠️ .env 解析失败（已忽略）：{}", err),
    }

    match run(cli).await {
        Ok(snippet) => println!("{}", snippet),
        Err(err) => {
            log::error!("❌ {}（code={}）", err, err.code());
            std::process::exit(err.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<Snippet, AppError> {
    let settings = AppSettings::from_env()?;
    log::debug!("{:?}", settings);

    // 原图不存在时在联网之前失败
    SourceFile::open(&cli.path)?;

    let uploader = B2Uploader::connect(
        &settings.credentials,
        &settings.b2_api_url,
        &settings.bucket_name,
    )
    .await?;
    log::info!("🪣 上传目标桶：{}", uploader.bucket_name());

    let capabilities = Capabilities {
        resizer: settings.build_resizer(),
        optimiser: settings.build_optimiser(),
        uploader: Box::new(uploader),
        clipboard: settings.build_clipboard(),
    };
    let publisher = ImagePublisher::new(settings.publish.clone(), capabilities)?;

    Ok(publisher.process_file(&cli.path, &cli.alt_text).await?)
}
