//! Follow the compose logs of the app container and keep only `chat_send` events.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};

use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    process::Command,
};

/// Container tool looked up on `PATH`.
pub const CONTAINER_TOOL: &str = "docker";
/// Compose service whose logs are followed.
pub const SERVICE: &str = "dragonscales";
/// Marker every chat request logs.
pub const MARKER: &str = "chat_send";

/// Failures while following the logs.
#[derive(Debug, Error)]
pub enum LogTailError {
    /// The container tool is not installed.
    #[error("`{tool}` not found in PATH")]
    ToolMissing { tool: String },
    /// Spawning or reading from the log command failed.
    #[error("log command failed")]
    Io(#[from] std::io::Error),
}

/// Locate an executable named `program` in the `PATH`-style list `search_path`.
pub fn find_in_path(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    std::env::split_paths(search_path?)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Copy the lines of `reader` containing `marker` to `writer`, flushing after each one.
///
/// Lines are matched and written as raw bytes, so output that is not UTF-8 passes through
/// untouched. Returns the number of lines passed through.
pub async fn filter_lines<R, W>(mut reader: R, writer: &mut W, marker: &str) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let marker = marker.as_bytes();
    let mut line = Vec::new();
    let mut passed = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(passed);
        }
        if contains(&line, marker) {
            writer.write_all(&line).await?;
            if !line.ends_with(b"\n") {
                writer.write_all(b"\n").await?;
            }
            writer.flush().await?;
            passed += 1;
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Run `<tool> compose logs -f <service>` and stream the matching lines to stdout.
pub async fn follow(tool: &Path, service: &str, marker: &str) -> Result<ExitStatus, LogTailError> {
    let mut child = Command::new(tool)
        .args(["compose", "logs", "-f", service])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(stdout) = child.stdout.take() {
        let mut out = tokio::io::stdout();
        filter_lines(BufReader::new(stdout), &mut out, marker).await?;
    }

    Ok(child.wait().await?)
}

/// Resolve the container tool from the process `PATH`, then follow the logs.
pub async fn run() -> Result<ExitStatus, LogTailError> {
    let path = std::env::var_os("PATH");
    let tool = find_in_path(CONTAINER_TOOL, path.as_deref()).ok_or_else(|| {
        LogTailError::ToolMissing {
            tool: CONTAINER_TOOL.to_string(),
        }
    })?;
    follow(&tool, SERVICE, MARKER).await
}
