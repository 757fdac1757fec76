//! # imgpub — 图片发布工具库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 main.rs (clap + env_logger)              │
//! │   imgpub <path> <alt-text>                               │
//! │       │  .env / 环境变量 → settings::AppSettings         │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↓ Result<Snippet, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓                                                  │
//! │  ┌─ error ────── AppError (统一错误 + 退出码)            │
//! │  │                                                       │
//! │  ├─ publish ──── ImagePublisher 流水线                   │
//! │  │   ├─ stager        两份临时副本 (RAII 清理)           │
//! │  │   ├─ transformer   缩略图 box-fit 缩放                │
//! │  │   ├─ optimiser     单次批量优化                       │
//! │  │   └─ publisher     上传 + HTML + 剪贴板               │
//! │  │                                                       │
//! │  ├─ storage ──── Uploader trait + B2 原生 API             │
//! │  ├─ clipboard ── ClipboardWriter (arboard / 系统命令)    │
//! │  └─ settings ─── 环境变量解析 + 能力装配                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，映射进程退出码 |
//! | [`publish`] | 暂存、缩放、优化、上传、拼装 HTML 的完整流水线 |
//! | [`storage`] | 对象存储上传抽象与 Backblaze B2 实现 |
//! | [`clipboard`] | 剪贴板写入抽象与系统剪贴板 / 外部命令实现 |
//! | [`settings`] | 从环境变量读取配置并构造各能力实现 |

pub mod error;
pub mod clipboard;
pub mod publish;
pub mod storage;
pub mod settings;
