use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    tools::{locate, path_arg, run},
    MediaError, Tool,
};

/// Per-request network options passed through to yt-dlp
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlp {
    pub fn new() -> Result<Self, MediaError> {
        Self::new_with_cookies(None)
    }

    pub fn new_with_cookies(cookies: Option<PathBuf>) -> Result<Self, MediaError> {
        let binary = locate(Tool::YtDlp)?;
        let cookies = cookies.filter(|path| {
            let exists = path.is_file();
            if !exists {
                tracing::warn!(?path, "Cookies file not found, continuing without cookies");
            }
            exists
        });

        Ok(Self { binary, cookies })
    }

    fn base_command(&self, opts: &DownloadOptions) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--quiet", "--no-warnings", "--geo-bypass", "--no-check-certificate"]);

        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        if let Some(proxy) = &opts.proxy {
            cmd.args(["--proxy", proxy]);
        }
        if let Some(user_agent) = &opts.user_agent {
            cmd.args(["--user-agent", user_agent]);
        }
        cmd
    }

    /// Downloads the best single-file format into `output_template`
    /// (a yt-dlp template such as `/dir/<id>.%(ext)s`).
    pub fn download_video(
        &self,
        url: &str,
        output_template: &Path,
        opts: &DownloadOptions,
    ) -> Result<(), MediaError> {
        let mut cmd = self.base_command(opts);
        cmd.args(["-f", "best", "-o"])
            .arg(path_arg(output_template))
            .arg(url);

        run(Tool::YtDlp, cmd).map(|_| ())
    }

    /// Extracts the audio track, transcoding to `format` at 192K
    pub fn download_audio(
        &self,
        url: &str,
        format: &str,
        output_template: &Path,
        opts: &DownloadOptions,
    ) -> Result<(), MediaError> {
        let mut cmd = self.base_command(opts);
        cmd.args(["-f", "bestaudio/best", "-x", "--audio-format", format])
            .args(["--audio-quality", "192K", "-o"])
            .arg(path_arg(output_template))
            .arg(url);

        run(Tool::YtDlp, cmd).map(|_| ())
    }
}
