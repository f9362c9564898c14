use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use clipcast::yt::MediaDownloader;

/// Writes a small placeholder file for every download
#[derive(Clone, Default)]
pub struct MockDownloader {
    pub calls: Arc<Mutex<Vec<PathBuf>>>,
    pub fail_with: Option<String>,
}

impl MockDownloader {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    fn write(&self, dir: &Path, file_name: String) -> anyhow::Result<PathBuf> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);
        std::fs::write(&path, b"media")?;
        self.calls.lock().unwrap().push(path.clone());
        Ok(path)
    }
}

impl MediaDownloader for MockDownloader {
    async fn download_video(&self, video_id: &str, dir: &Path) -> anyhow::Result<PathBuf> {
        self.write(dir, format!("{video_id}.mp4"))
    }

    async fn download_audio(&self, video_id: &str, dir: &Path) -> anyhow::Result<PathBuf> {
        self.write(dir, format!("{video_id}.mp3"))
    }
}
