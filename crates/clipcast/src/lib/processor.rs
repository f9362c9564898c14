use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clipcast_media::VideoProcessor;
use clipcast_store::{DataStore, VideoRecord};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    content::ContentRepurposer,
    llm::{
        generator::TextGenerator,
        transcriber::{AudioInput, Transcriber},
    },
    yt::{
        client::YouTubeClient, extract_video_id, watch_url, MediaDownloader, PageFetcher,
        TranscriptEntry, VideoInfo,
    },
};

pub mod builder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub video: bool,
    pub audio: bool,
    pub transcript: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
            transcript: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepurposeOptions {
    pub blog: bool,
    pub posts: bool,
    pub shorts: bool,
    pub thumbnail: bool,
}

impl Default for RepurposeOptions {
    fn default() -> Self {
        Self {
            blog: true,
            posts: true,
            shorts: true,
            thumbnail: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub info: VideoInfo,
    pub video_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    pub transcript_path: Option<PathBuf>,
    pub transcript_entries: usize,
    /// The transcript came from speech-to-text rather than captions
    pub transcribed: bool,
    pub metadata_path: PathBuf,
    /// Non-fatal failures, in the order they happened
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RepurposeReport {
    pub video_id: String,
    pub blog: Option<PathBuf>,
    pub posts: BTreeMap<String, PathBuf>,
    pub shorts: BTreeMap<String, PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub errors: Vec<String>,
}

/// Contents of `metadata/<id>_metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_info: VideoInfo,
    pub video_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    pub has_transcript: bool,
    pub processing_date: DateTime<Utc>,
}

/// Scrapes YouTube videos and turns them into blog posts, social posts,
/// short clips and thumbnails
pub struct ContentPipeline<D, F, M, T, G, V>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + 'static,
    M: MediaDownloader + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
    V: VideoProcessor + Send + Sync + 'static,
{
    download_path: PathBuf,
    store: D,
    youtube: YouTubeClient<F>,
    downloader: M,
    transcriber: Option<T>,
    repurposer: ContentRepurposer<G, V>,
    max_videos: usize,
    chunk_duration_seconds: u16,
}

impl<D, F, M, T, G, V> ContentPipeline<D, F, M, T, G, V>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + 'static,
    M: MediaDownloader + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
    V: VideoProcessor + Send + Sync + 'static,
{
    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn repurposer(&self) -> &ContentRepurposer<G, V> {
        &self.repurposer
    }

    fn metadata_path(&self, video_id: &str) -> PathBuf {
        self.repurposer
            .output_path()
            .join("metadata")
            .join(format!("{video_id}_metadata.json"))
    }

    /// Speech-to-text over the downloaded audio, split into chunks
    async fn transcribe_audio(
        &self,
        transcriber: &T,
        video_id: &str,
        audio_path: &Path,
    ) -> anyhow::Result<Vec<TranscriptEntry>> {
        let input = AudioInput::Chunked {
            chunk_duration_seconds: self.chunk_duration_seconds,
            chunks_dir_path: self.download_path.join(video_id).join("chunks"),
            file_path: audio_path.to_path_buf(),
        };

        let response = transcriber
            .transcribe(input)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to transcribe audio: {e:?}"))?;

        Ok(response.into_entries())
    }

    /// Fetches a video's details and, as requested, its media and transcript.
    ///
    /// Only the metadata lookup is fatal; download and transcript failures
    /// are collected in [`ScrapeReport::errors`].
    #[tracing::instrument(skip(self))]
    pub async fn scrape(&self, url: &str, options: ScrapeOptions) -> anyhow::Result<ScrapeReport> {
        let info = self
            .youtube
            .get_video_info(url)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to get video info"))
            .context("Failed to get video info")?;
        tracing::info!(video_id = %info.id, title = %info.title, "Fetched video info");

        let mut errors = Vec::new();
        let dir = self.download_path.join(&info.id);

        let (video, audio) = tokio::join!(
            async {
                if options.video {
                    Some(self.downloader.download_video(&info.id, &dir).await)
                } else {
                    None
                }
            },
            async {
                if options.audio {
                    Some(self.downloader.download_audio(&info.id, &dir).await)
                } else {
                    None
                }
            },
        );

        let video_path = match video {
            Some(Ok(path)) => Some(path),
            Some(Err(e)) => {
                tracing::error!(error = ?e, "Video download failed");
                errors.push(format!("video download failed: {e:#}"));
                None
            }
            None => None,
        };
        let audio_path = match audio {
            Some(Ok(path)) => Some(path),
            Some(Err(e)) => {
                tracing::error!(error = ?e, "Audio download failed");
                errors.push(format!("audio download failed: {e:#}"));
                None
            }
            None => None,
        };

        let mut transcript = Vec::new();
        let mut transcribed = false;
        if options.transcript {
            transcript = self.youtube.get_transcript(&info.id).await;

            if transcript.is_empty() {
                match (&self.transcriber, &audio_path) {
                    (Some(transcriber), Some(audio)) => {
                        tracing::info!("No captions, transcribing audio");
                        match self.transcribe_audio(transcriber, &info.id, audio).await {
                            Ok(entries) => {
                                transcribed = !entries.is_empty();
                                transcript = entries;
                            }
                            Err(e) => {
                                tracing::error!(error = ?e, "Transcription failed");
                                errors.push(format!("transcription failed: {e:#}"));
                            }
                        }
                    }
                    _ => tracing::warn!("No transcript available for this video"),
                }
            }
        }

        let transcript_path = if transcript.is_empty() {
            None
        } else {
            Some(self.repurposer.save_transcript(&info.id, &transcript)?)
        };
        let has_transcript = transcript_path.is_some();

        let metadata = VideoMetadata {
            video_info: info.clone(),
            video_path: video_path.clone(),
            audio_path: audio_path.clone(),
            has_transcript,
            processing_date: Utc::now(),
        };
        let metadata_path = self.metadata_path(&info.id);
        if let Some(parent) = metadata_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?)
            .with_context(|| format!("Failed to write {}", metadata_path.display()))?;

        let record = VideoRecord {
            video_id: info.id.clone(),
            title: info.title.clone(),
            channel_title: info.channel_title.clone(),
            channel_id: info.channel_id.clone(),
            published_at: info.published_at.clone(),
            view_count: info.view_count,
            video_path: video_path.as_deref().map(|p| p.display().to_string()),
            audio_path: audio_path.as_deref().map(|p| p.display().to_string()),
            has_transcript,
            processed_at: metadata.processing_date,
            info_json: serde_json::to_value(&info)?,
        };
        self.store
            .upsert_video(&record)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to store video record"))
            .context("Failed to store video record")?;

        Ok(ScrapeReport {
            info,
            video_path,
            audio_path,
            transcript_path,
            transcript_entries: transcript.len(),
            transcribed,
            metadata_path,
            errors,
        })
    }

    /// Builds the selected artifacts for a scraped video. A failed artifact
    /// is recorded in the report and does not stop the rest.
    #[tracing::instrument(skip(self))]
    pub async fn repurpose(
        &self,
        video_id: &str,
        options: RepurposeOptions,
    ) -> anyhow::Result<RepurposeReport> {
        let record = self
            .store
            .get_video(video_id)
            .await
            .context("Failed to load video record")?
            .ok_or_else(|| anyhow::anyhow!("Unknown video {video_id}; scrape it first"))?;

        let info: VideoInfo = serde_json::from_value(record.info_json.clone())
            .with_context(|| format!("Malformed stored metadata for {video_id}"))?;

        let mut report = RepurposeReport {
            video_id: video_id.to_string(),
            ..Default::default()
        };

        let transcript = self
            .repurposer
            .load_transcript(video_id)
            .unwrap_or_else(|e| {
                tracing::error!(error = ?e, "Failed to load transcript");
                report.errors.push(format!("transcript: {e:#}"));
                Vec::new()
            });

        if options.blog {
            match self.repurposer.create_blog_post(&info, &transcript).await {
                Ok(path) => report.blog = Some(path),
                Err(e) => report.errors.push(format!("blog: {e:#}")),
            }
        }

        if options.posts {
            match self
                .repurposer
                .create_social_media_posts(&info, &transcript)
                .await
            {
                Ok(posts) => report.posts = posts,
                Err(e) => report.errors.push(format!("posts: {e:#}")),
            }
        }

        let video_path = record
            .video_path
            .as_deref()
            .map(PathBuf::from)
            .filter(|p| p.exists());

        if options.shorts {
            match &video_path {
                Some(path) => {
                    report.shorts = self.repurposer.create_video_shorts(path, &info, &transcript);
                    if report.shorts.is_empty() {
                        report.errors.push("shorts: no clip could be rendered".into());
                    }
                }
                None => report.errors.push("shorts: no downloaded video".into()),
            }
        }

        if options.thumbnail {
            match &video_path {
                Some(path) => match self.repurposer.extract_thumbnail(path, &info) {
                    Ok(path) => report.thumbnail = Some(path),
                    Err(e) => report.errors.push(format!("thumbnail: {e:#}")),
                },
                None => report.errors.push("thumbnail: no downloaded video".into()),
            }
        }

        tracing::info!(
            posts = report.posts.len(),
            shorts = report.shorts.len(),
            errors = report.errors.len(),
            "Repurposed video"
        );
        Ok(report)
    }

    /// Scrapes and repurposes every new video among `urls`, up to
    /// `max_videos` of them in input order
    #[tracing::instrument(skip_all, fields(urls = urls.len()))]
    pub async fn run(&self, urls: &[String]) -> anyhow::Result<Vec<(ScrapeReport, RepurposeReport)>> {
        let video_ids = urls
            .iter()
            .filter_map(|url| {
                let id = extract_video_id(url);
                if id.is_none() {
                    tracing::warn!(%url, "Skipping URL without a video id");
                }
                id
            })
            .unique()
            .collect_vec();

        let id_refs = video_ids.iter().map(String::as_str).collect_vec();
        let existing = self
            .store
            .get_existing_video_ids(&id_refs)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to get existing video IDs"))
            .context("Failed to get existing video IDs")?;

        let batch = video_ids
            .into_iter()
            .filter(|id| !existing.contains(id))
            .take(self.max_videos)
            .collect_vec();

        if batch.is_empty() {
            tracing::info!("No new videos to process at this time");
            return Ok(Vec::new());
        }
        tracing::info!(count = batch.len(), "Processing videos");

        let mut results = Vec::with_capacity(batch.len());
        for video_id in batch {
            let scraped = self
                .scrape(&watch_url(&video_id), ScrapeOptions::default())
                .await?;
            let repurposed = self
                .repurpose(&video_id, RepurposeOptions::default())
                .await?;
            results.push((scraped, repurposed));
        }

        Ok(results)
    }
}
