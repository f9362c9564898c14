use std::path::{Path, PathBuf};

use anyhow::Context;
use clipcast_media::{FrameStyle, VideoProcessor};

use crate::{
    content::ContentRepurposer,
    llm::generator::TextGenerator,
    yt::VideoInfo,
};

const THUMBNAIL_WIDTH: u32 = 1280;
const THUMBNAIL_HEIGHT: u32 = 720;

impl<G, V> ContentRepurposer<G, V>
where
    G: TextGenerator + Send + Sync,
    V: VideoProcessor + Send + Sync,
{
    /// Grabs the middle frame as `thumbnails/<id>/<id>_thumbnail.jpg`,
    /// captioned with the title
    #[tracing::instrument(skip_all, fields(video_id = %info.id))]
    pub fn extract_thumbnail(&self, video_path: &Path, info: &VideoInfo) -> anyhow::Result<PathBuf> {
        let probe = self
            .video
            .probe(video_path)
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to probe video"))
            .with_context(|| format!("Failed to probe {}", video_path.display()))?;

        let path = self
            .artifact_dir("thumbnails", &info.id)?
            .join(format!("{}_thumbnail.jpg", info.id));

        let style = FrameStyle {
            width: THUMBNAIL_WIDTH,
            height: THUMBNAIL_HEIGHT,
            caption: Some(info.title.clone()).filter(|t| !t.is_empty()),
        };

        self.video
            .extract_frame(video_path, probe.duration_secs / 2.0, &path, &style)
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to extract thumbnail"))
            .context("Failed to extract thumbnail")?;

        tracing::info!(path = %path.display(), "Thumbnail created");
        Ok(path)
    }
}
