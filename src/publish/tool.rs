//! # 外部工具调用
//!
//! 缩放与优化都委托给外部程序。这里统一处理进程启动与结果映射：
//! - 程序不存在 → `ToolMissing`
//! - 非零退出 → `ToolFailed`，附带 stderr（为空时取 stdout）
//!
//! 不设置超时：外部工具卡住时整个调用随之阻塞。

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::time::Instant;

use tokio::process::Command;

use super::PublishError;

/// 诊断输出最多保留的字符数，避免日志被大段输出淹没。
const DIAGNOSTIC_MAX_CHARS: usize = 4_000;

/// 运行外部程序并等待结束。
pub(crate) async fn run_tool<I, S>(program: &str, args: I) -> Result<(), PublishError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let started = Instant::now();
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => PublishError::ToolMissing {
                tool: program.to_string(),
            },
            _ => PublishError::ToolFailed {
                tool: program.to_string(),
                status: "spawn failed".to_string(),
                diagnostic: e.to_string(),
            },
        })?;

    log::debug!(
        "🔧 {} 结束 - status={} elapsed={}ms",
        program,
        output.status,
        started.elapsed().as_millis()
    );

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let diagnostic = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr.trim().to_string()
    };

    Err(PublishError::ToolFailed {
        tool: program.to_string(),
        status: output.status.to_string(),
        diagnostic: truncate_diagnostic(diagnostic),
    })
}

fn truncate_diagnostic(text: String) -> String {
    if text.chars().count() <= DIAGNOSTIC_MAX_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(DIAGNOSTIC_MAX_CHARS).collect();
    cut.push('…');
    cut
}
