use anyhow::Context;
use serde_json::Value;

use crate::{
    error::Error,
    parser::{parse_caption_tracks, parse_channel_page, parse_video_summaries, parse_watch_page},
    yt::{
        api::YouTubeApi,
        extract_video_id,
        transcript::{parse_timed_text, select_track},
        watch_url, ChannelInfo, PageFetcher, TranscriptEntry, VideoInfo, VideoSummary,
    },
};

const CHANNEL_BASE_URL: &str = "https://www.youtube.com/channel";
const TRENDING_URL: &str = "https://www.youtube.com/feed/trending";
const TRENDING_MAX_RESULTS: usize = 50;

/// YouTube access that prefers the Data API when a key is configured and
/// falls back to scraping public pages
pub struct YouTubeClient<F: PageFetcher> {
    fetcher: F,
    api: Option<YouTubeApi>,
    region_code: String,
}

impl<F: PageFetcher> YouTubeClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            api: None,
            region_code: "US".into(),
        }
    }

    pub fn with_api(mut self, api: Option<YouTubeApi>) -> Self {
        self.api = api;
        self
    }

    pub fn with_region_code(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = region_code.into();
        self
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_video_info(&self, url: &str) -> anyhow::Result<VideoInfo> {
        let video_id =
            extract_video_id(url).ok_or_else(|| Error::InvalidVideoUrl(url.to_string()))?;

        if let Some(api) = &self.api {
            match api.video(&video_id).await {
                Ok(info) => return Ok(info),
                Err(e) => {
                    tracing::warn!(error = ?e, %video_id, "API lookup failed, falling back to scraping")
                }
            }
        }

        self.scrape_video_info(&video_id).await
    }

    async fn scrape_video_info(&self, video_id: &str) -> anyhow::Result<VideoInfo> {
        let doc = self
            .fetcher
            .fetch_document(&watch_url(video_id))
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to fetch watch page"))?;

        let player = doc.player_response::<Value>()?;
        let initial = doc.initial_data::<Value>().ok();

        parse_watch_page(&player, initial.as_ref())
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to parse watch page"))
            .context("Failed to extract video info from the watch page")
    }

    /// Captions for `video_id`; any failure yields an empty transcript
    #[tracing::instrument(skip(self))]
    pub async fn get_transcript(&self, video_id: &str) -> Vec<TranscriptEntry> {
        match self.try_get_transcript(video_id).await {
            Ok(entries) => {
                tracing::info!(count = entries.len(), "Fetched transcript");
                entries
            }
            Err(e) => {
                tracing::error!(error = ?e, "Error getting transcript");
                Vec::new()
            }
        }
    }

    async fn try_get_transcript(&self, video_id: &str) -> anyhow::Result<Vec<TranscriptEntry>> {
        let doc = self.fetcher.fetch_document(&watch_url(video_id)).await?;
        let player = doc.player_response::<Value>()?;
        let tracks = parse_caption_tracks(&player);

        let Some(choice) = select_track(&tracks) else {
            tracing::info!("No caption tracks available");
            return Ok(Vec::new());
        };

        let raw = match self.fetcher.fetch_text(&choice.url()).await {
            Ok(raw) => raw,
            Err(e) if choice.translate => {
                tracing::warn!(error = ?e, "Translated captions failed, using the original track");
                self.fetcher.fetch_text(&choice.original_url()).await?
            }
            Err(e) => return Err(e),
        };

        Ok(parse_timed_text(&raw)?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_channel_info(&self, channel_id: &str) -> anyhow::Result<ChannelInfo> {
        if let Some(api) = &self.api {
            match api.channel(channel_id).await {
                Ok(channel) => return Ok(channel),
                Err(e) => tracing::warn!(error = ?e, "API channel lookup failed, scraping"),
            }
        }

        let doc = self
            .fetcher
            .fetch_document(&format!("{CHANNEL_BASE_URL}/{channel_id}"))
            .await?;
        let initial = doc.initial_data::<Value>()?;
        Ok(parse_channel_page(channel_id, &initial)?)
    }

    /// Latest uploads of a channel
    #[tracing::instrument(skip(self))]
    pub async fn recent_videos(
        &self,
        channel_id: &str,
        max: usize,
    ) -> anyhow::Result<Vec<VideoSummary>> {
        if let Some(api) = &self.api {
            match api.recent_uploads(channel_id, max).await {
                Ok(videos) => return Ok(videos),
                Err(e) => tracing::warn!(error = ?e, "API uploads lookup failed, scraping"),
            }
        }

        let doc = self
            .fetcher
            .fetch_document(&format!("{CHANNEL_BASE_URL}/{channel_id}/videos"))
            .await?;
        let initial = doc.initial_data::<Value>()?;

        Ok(parse_video_summaries(&initial)
            .into_iter()
            .take(max)
            .collect())
    }

    pub async fn channel_video_ids(
        &self,
        channel_id: &str,
        max: usize,
    ) -> anyhow::Result<Vec<String>> {
        Ok(self
            .recent_videos(channel_id, max)
            .await?
            .into_iter()
            .map(|v| v.video_id)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn related_videos(
        &self,
        video_id: &str,
        max: usize,
    ) -> anyhow::Result<Vec<VideoSummary>> {
        if let Some(api) = &self.api {
            match api.related_videos(video_id, max).await {
                Ok(videos) => return Ok(videos),
                Err(e) => tracing::warn!(error = ?e, "API related lookup failed, scraping"),
            }
        }

        let doc = self.fetcher.fetch_document(&watch_url(video_id)).await?;
        let initial = doc.initial_data::<Value>()?;

        Ok(parse_video_summaries(&initial)
            .into_iter()
            .filter(|v| v.video_id != video_id)
            .take(max)
            .collect())
    }

    /// Titles, descriptions and tags of currently trending videos
    #[tracing::instrument(skip(self))]
    pub async fn trending_texts(&self, category: Option<&str>) -> anyhow::Result<Vec<String>> {
        if let Some(api) = &self.api {
            match api
                .most_popular(&self.region_code, TRENDING_MAX_RESULTS, category)
                .await
            {
                Ok(videos) => {
                    return Ok(videos
                        .into_iter()
                        .flat_map(|v| {
                            std::iter::once(v.title)
                                .chain(std::iter::once(v.description))
                                .chain(v.tags)
                        })
                        .collect())
                }
                Err(e) => tracing::warn!(error = ?e, "API trending lookup failed, scraping"),
            }
        }

        let doc = self.fetcher.fetch_document(TRENDING_URL).await?;
        let initial = doc.initial_data::<Value>()?;

        Ok(parse_video_summaries(&initial)
            .into_iter()
            .map(|v| v.title)
            .collect())
    }
}
