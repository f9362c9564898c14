use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use clipcast_media::{ClipStyle, VideoProcessor};
use itertools::Itertools;
use rayon::prelude::*;

use crate::{
    content::{text::truncate_chars, ContentRepurposer},
    llm::generator::TextGenerator,
    yt::{TranscriptEntry, VideoInfo},
};

const TOP_SEGMENTS: usize = 3;
const CONTEXT_PADDING_SECS: f64 = 2.0;
const MIN_CLIP_SECS: f64 = 5.0;
const TARGET_CLIP_SECS: f64 = 30.0;
const TITLE_CHARS: usize = 50;

struct RenderJob {
    key: String,
    start: f64,
    end: f64,
    output: PathBuf,
    style: ClipStyle,
}

impl<G, V> ContentRepurposer<G, V>
where
    G: TextGenerator + Send + Sync,
    V: VideoProcessor + Send + Sync,
{
    /// Cuts up to three highlight clips, each rendered once framed for
    /// Instagram and once as-is for Facebook.
    ///
    /// Renders that fail are skipped; if nothing can be rendered at all the
    /// result is empty rather than an error.
    #[tracing::instrument(skip_all, fields(video_id = %info.id))]
    pub fn create_video_shorts(
        &self,
        video_path: &Path,
        info: &VideoInfo,
        transcript: &[TranscriptEntry],
    ) -> BTreeMap<String, PathBuf> {
        match self.try_create_video_shorts(video_path, info, transcript) {
            Ok(shorts) => {
                if shorts.is_empty() {
                    tracing::warn!("No video shorts were successfully created");
                }
                shorts
            }
            Err(e) => {
                tracing::error!(error = ?e, "Error creating video shorts");
                BTreeMap::new()
            }
        }
    }

    fn try_create_video_shorts(
        &self,
        video_path: &Path,
        info: &VideoInfo,
        transcript: &[TranscriptEntry],
    ) -> anyhow::Result<BTreeMap<String, PathBuf>> {
        let size = std::fs::metadata(video_path).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            anyhow::bail!(
                "Video file not found or is empty: {}",
                video_path.display()
            );
        }

        let probe = self.video.probe(video_path)?;
        if !probe.is_valid() {
            anyhow::bail!(
                "Video has invalid duration or dimensions: duration={}, size={}x{}",
                probe.duration_secs,
                probe.width,
                probe.height
            );
        }
        tracing::info!(duration = probe.duration_secs, width = probe.width, height = probe.height, "Video loaded");

        let dir = self.artifact_dir("shorts", &info.id)?;
        let base_style = ClipStyle {
            title: Some(truncate_chars(&info.title, TITLE_CHARS)),
            footer: Some(format!(
                "Source: {}",
                info.channel_title.as_deref().unwrap_or("YouTube")
            )),
            frame: None,
        };
        let instagram_frame = probe
            .is_landscape()
            .then_some(self.resize_dims.instagram_story);

        let jobs = plan_segments(transcript, probe.duration_secs)
            .into_iter()
            .enumerate()
            .flat_map(|(i, (start, end))| {
                let n = i + 1;
                [
                    ("instagram", instagram_frame),
                    ("facebook", None),
                ]
                .map(|(platform, frame)| {
                    let key = format!("{platform}_short_{n}");
                    RenderJob {
                        output: dir.join(format!("{}_{key}.mp4", info.id)),
                        key,
                        start,
                        end,
                        style: ClipStyle {
                            frame,
                            ..base_style.clone()
                        },
                    }
                })
            })
            .collect_vec();

        let shorts = jobs
            .par_iter()
            .filter_map(|job| {
                tracing::info!(key = %job.key, start = job.start, end = job.end, "Rendering short");
                self.video
                    .cut_clip(video_path, job.start, job.end, &job.output, &job.style)
                    .inspect_err(|e| tracing::error!(error = ?e, key = %job.key, "Error creating short"))
                    .ok()
                    .map(|()| (job.key.clone(), job.output.clone()))
            })
            .collect::<BTreeMap<_, _>>();

        tracing::info!(count = shorts.len(), dir = %dir.display(), "Created video shorts");
        Ok(shorts)
    }
}

/// Picks clip windows: the longest transcript entries padded for context,
/// or equal slices of the video when none are long enough
pub fn plan_segments(transcript: &[TranscriptEntry], duration: f64) -> Vec<(f64, f64)> {
    let highlights = transcript
        .iter()
        .sorted_by(|a, b| b.duration.total_cmp(&a.duration))
        .take(TOP_SEGMENTS)
        .map(|entry| {
            let start = (entry.start - CONTEXT_PADDING_SECS).max(0.0);
            let end = (entry.start + entry.duration + CONTEXT_PADDING_SECS).min(duration);
            (start, end)
        })
        .filter(|(start, end)| end - start >= MIN_CLIP_SECS)
        .collect_vec();

    if !highlights.is_empty() {
        return highlights;
    }

    let count = ((duration / TARGET_CLIP_SECS).floor() as usize).clamp(1, TOP_SEGMENTS);
    let slice = duration / count as f64;
    (0..count)
        .map(|i| (i as f64 * slice, ((i + 1) as f64 * slice).min(duration)))
        .collect()
}
