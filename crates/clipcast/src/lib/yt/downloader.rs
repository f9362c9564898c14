use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clipcast_media::{DownloadFailure, DownloadOptions, MediaError, YtDlp};

use crate::{
    stealth::Stealth,
    yt::{watch_url, MediaDownloader},
};

const MAX_ATTEMPTS: usize = 3;
const PARTIAL_SUFFIXES: [&str; 4] = [".part", ".ytdl", ".temp", ".tmp"];
const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "m4a", "opus", "ogg", "wav", "aac"];
/// Audio is fetched into its own directory so it never collides with the
/// concurrent video download
const AUDIO_SUBDIR: &str = "audio";

/// yt-dlp downloads with proxy and user-agent rotation between attempts
pub struct YtDlpDownloader {
    yt_dlp: YtDlp,
    stealth: Arc<Stealth>,
}

impl YtDlpDownloader {
    pub fn new(yt_dlp: YtDlp, stealth: Arc<Stealth>) -> Self {
        Self { yt_dlp, stealth }
    }

    /// Runs `op` up to [`MAX_ATTEMPTS`] times on the blocking pool, with
    /// fresh network options each time
    async fn with_retries<Op>(&self, video_id: &str, op: Op) -> anyhow::Result<()>
    where
        Op: Fn(&YtDlp, &DownloadOptions) -> Result<(), MediaError> + Clone + Send + 'static,
    {
        let mut errors = Vec::with_capacity(MAX_ATTEMPTS);
        let mut failure = DownloadFailure::Other;

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                self.stealth.pause().await;
            }

            let opts = self.stealth.download_options();
            tracing::info!(attempt, proxy = ?opts.proxy, %video_id, "Downloading with yt-dlp");

            let yt_dlp = self.yt_dlp.clone();
            let op = op.clone();
            let result = tokio::task::spawn_blocking(move || op(&yt_dlp, &opts))
                .await
                .context("yt-dlp task panicked")?;

            match result {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "yt-dlp attempt failed");
                    let classified = e.classify();
                    if classified != DownloadFailure::Other {
                        failure = classified;
                    }
                    errors.push(format!("attempt {attempt}: {e}"));
                }
            }
        }

        let mut message = format!(
            "All download attempts failed for {video_id}: {}",
            errors.join("; ")
        );
        if let Some(hint) = failure.hint() {
            message.push_str(". ");
            message.push_str(hint);
        }
        anyhow::bail!(message)
    }
}

impl MediaDownloader for YtDlpDownloader {
    #[tracing::instrument(skip(self))]
    async fn download_video(&self, video_id: &str, dir: &Path) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        self.stealth.pause().await;

        let expected = dir.join(format!("{video_id}.mp4"));
        if is_non_empty(&expected) {
            tracing::debug!(path = %expected.display(), "Video already downloaded");
            return Ok(expected);
        }

        let url = watch_url(video_id);
        let template = dir.join(format!("{video_id}.%(ext)s"));
        self.with_retries(video_id, move |yt_dlp, opts| {
            yt_dlp.download_video(&url, &template, opts)
        })
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to download video"))?;

        find_downloaded(dir, video_id)?
            .with_context(|| format!("yt-dlp did not produce a video file for {video_id}"))
    }

    #[tracing::instrument(skip(self))]
    async fn download_audio(&self, video_id: &str, dir: &Path) -> anyhow::Result<PathBuf> {
        let dir = &dir.join(AUDIO_SUBDIR);
        tokio::fs::create_dir_all(dir).await?;
        self.stealth.pause().await;

        let audio_mp3_path = dir.join(format!("{video_id}.mp3"));
        if is_non_empty(&audio_mp3_path) {
            tracing::debug!(path = %audio_mp3_path.display(), "Audio already downloaded");
            return Ok(audio_mp3_path);
        }

        let url = watch_url(video_id);
        let template = dir.join(format!("{video_id}.%(ext)s"));
        self.with_retries(video_id, move |yt_dlp, opts| {
            yt_dlp.download_audio(&url, "mp3", &template, opts)
        })
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to download audio"))?;

        if !audio_mp3_path.exists() {
            anyhow::bail!(
                "yt-dlp did not produce expected file: {}",
                audio_mp3_path.display()
            );
        }
        Ok(audio_mp3_path)
    }
}

fn is_non_empty(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Finds the video `<video_id>.*` in `dir`, skipping partial downloads and
/// audio files; prefers mp4
pub fn find_downloaded(dir: &Path, video_id: &str) -> std::io::Result<Option<PathBuf>> {
    let prefix = format!("{video_id}.");

    let mut candidates = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| {
                    name.starts_with(&prefix)
                        && !PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s))
                })
        })
        .filter(|path| !is_audio(path))
        .filter(|path| is_non_empty(path))
        .collect::<Vec<_>>();
    candidates.sort();

    let mp4 = candidates
        .iter()
        .position(|p| p.extension().is_some_and(|ext| ext == "mp4"));
    Ok(match mp4 {
        Some(idx) => Some(candidates.swap_remove(idx)),
        None => candidates.into_iter().next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_finished_download_and_skips_partials() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc123def45.webm.part"), b"partial").unwrap();
        std::fs::write(dir.path().join("zzz.mp4"), b"other").unwrap();
        assert_eq!(find_downloaded(dir.path(), "abc123def45").unwrap(), None);

        std::fs::write(dir.path().join("abc123def45.webm"), b"video").unwrap();
        assert_eq!(
            find_downloaded(dir.path(), "abc123def45").unwrap(),
            Some(dir.path().join("abc123def45.webm"))
        );

        std::fs::write(dir.path().join("abc123def45.mp4"), b"video").unwrap();
        assert_eq!(
            find_downloaded(dir.path(), "abc123def45").unwrap(),
            Some(dir.path().join("abc123def45.mp4"))
        );
    }

    #[test]
    fn audio_files_are_never_taken_for_video() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc123def45.mp3"), b"audio").unwrap();
        std::fs::write(dir.path().join("abc123def45.m4a"), b"audio").unwrap();
        assert_eq!(find_downloaded(dir.path(), "abc123def45").unwrap(), None);

        std::fs::write(dir.path().join("abc123def45.webm"), b"video").unwrap();
        assert_eq!(
            find_downloaded(dir.path(), "abc123def45").unwrap(),
            Some(dir.path().join("abc123def45.webm")),
            "webm video must win over the mp3 next to it"
        );
    }

    #[test]
    fn empty_files_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc123def45.mp4"), b"").unwrap();
        assert_eq!(find_downloaded(dir.path(), "abc123def45").unwrap(), None);
        assert!(!is_non_empty(&dir.path().join("abc123def45.mp4")));
    }
}
