use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use crate::MediaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    YtDlp,
    FfMpeg,
    FfProbe,
}

impl Tool {
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::YtDlp => "yt-dlp",
            Tool::FfMpeg => "ffmpeg",
            Tool::FfProbe => "ffprobe",
        }
    }

    pub fn env_override(&self) -> &'static str {
        match self {
            Tool::YtDlp => "YTDLP_PATH",
            Tool::FfMpeg => "FFMPEG_PATH",
            Tool::FfProbe => "FFPROBE_PATH",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

const WELL_KNOWN_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Finds the executable for `tool`.
///
/// Lookup order: the tool's env override, well-known install directories,
/// then every entry of `PATH`.
pub fn locate(tool: Tool) -> Result<PathBuf, MediaError> {
    if let Some(path) = std::env::var_os(tool.env_override()).map(PathBuf::from) {
        if path.is_file() {
            return Ok(path);
        }
        tracing::warn!(?path, %tool, "Configured override does not exist, searching instead");
    }

    let path_dirs = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect::<Vec<_>>())
        .unwrap_or_default();

    WELL_KNOWN_DIRS
        .iter()
        .map(PathBuf::from)
        .chain(path_dirs)
        .map(|dir| dir.join(tool.binary_name()))
        .find(|candidate| candidate.is_file())
        .ok_or(MediaError::ToolNotFound(tool))
}

/// Runs a prepared command and turns a non-zero exit into `CommandFailed`
pub(crate) fn run(tool: Tool, mut command: Command) -> Result<Output, MediaError> {
    tracing::debug!(%tool, ?command, "Running external tool");

    let output = command.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::error!(%tool, status = %output.status, %stderr, "External tool failed");
        return Err(MediaError::CommandFailed {
            tool,
            status: output.status.to_string(),
            stderr,
        });
    }
    Ok(output)
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
