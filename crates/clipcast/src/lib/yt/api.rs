//! YouTube Data API v3 client.

use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;

use crate::{
    types::{ApiChannel, ApiList, ApiPlaylistItem, ApiSearchResult, ApiVideo},
    yt::{ChannelInfo, VideoInfo, VideoSummary},
};

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});

pub struct YouTubeApi {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

impl YouTubeApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://www.googleapis.com/youtube/v3".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<ApiList<T>> {
        let resp = self
            .client
            .get(format!("{}/{resource}", self.base_url))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, resource, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("YouTube API {resource} returned {status}: {message}");
        }

        resp.json::<ApiList<T>>()
            .await
            .with_context(|| format!("Malformed YouTube API {resource} response"))
    }

    #[tracing::instrument(skip(self))]
    pub async fn video(&self, video_id: &str) -> anyhow::Result<VideoInfo> {
        let list = self
            .get::<ApiVideo>(
                "videos",
                &[("part", "snippet,contentDetails,statistics"), ("id", video_id)],
            )
            .await?;

        list.items
            .into_iter()
            .next()
            .map(VideoInfo::from)
            .with_context(|| format!("Video {video_id} not found"))
    }

    #[tracing::instrument(skip(self))]
    pub async fn channel(&self, channel_id: &str) -> anyhow::Result<ChannelInfo> {
        let list = self
            .get::<ApiChannel>(
                "channels",
                &[("part", "snippet,contentDetails"), ("id", channel_id)],
            )
            .await?;

        let channel = list
            .items
            .into_iter()
            .next()
            .with_context(|| format!("Channel {channel_id} not found"))?;

        Ok(ChannelInfo {
            id: channel.id,
            title: channel.snippet.title,
            description: channel.snippet.description,
            uploads_playlist_id: channel
                .content_details
                .and_then(|d| d.related_playlists.uploads),
        })
    }

    /// Latest uploads of a channel, newest first
    #[tracing::instrument(skip(self))]
    pub async fn recent_uploads(
        &self,
        channel_id: &str,
        max: usize,
    ) -> anyhow::Result<Vec<VideoSummary>> {
        let channel = self.channel(channel_id).await?;
        let playlist = channel
            .uploads_playlist_id
            .with_context(|| format!("Channel {channel_id} has no uploads playlist"))?;

        let max_results = max.to_string();
        let list = self
            .get::<ApiPlaylistItem>(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("playlistId", &playlist),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|item| {
                Some(VideoSummary {
                    video_id: item.snippet.resource_id.video_id?,
                    title: item.snippet.title,
                    channel_id: Some(channel.id.clone()),
                    channel_title: Some(channel.title.clone()),
                })
            })
            .take(max)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn related_videos(
        &self,
        video_id: &str,
        max: usize,
    ) -> anyhow::Result<Vec<VideoSummary>> {
        let max_results = max.to_string();
        let list = self
            .get::<ApiSearchResult>(
                "search",
                &[
                    ("part", "snippet"),
                    ("relatedToVideoId", video_id),
                    ("type", "video"),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|item| {
                Some(VideoSummary {
                    video_id: item.id.video_id?,
                    title: item.snippet.title,
                    channel_id: Some(item.snippet.channel_id),
                    channel_title: Some(item.snippet.channel_title),
                })
            })
            .take(max)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn most_popular(
        &self,
        region_code: &str,
        max: usize,
        category: Option<&str>,
    ) -> anyhow::Result<Vec<VideoInfo>> {
        let max_results = max.to_string();
        let mut query = vec![
            ("part", "snippet,statistics"),
            ("chart", "mostPopular"),
            ("regionCode", region_code),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(category) = category {
            query.push(("videoCategoryId", category));
        }

        let list = self.get::<ApiVideo>("videos", &query).await?;
        Ok(list.items.into_iter().map(VideoInfo::from).collect())
    }
}

impl From<ApiVideo> for VideoInfo {
    fn from(video: ApiVideo) -> Self {
        let statistics = video.statistics.unwrap_or_default();
        VideoInfo {
            thumbnail_url: video.snippet.thumbnails.best().map(String::from),
            id: video.id,
            title: video.snippet.title,
            description: video.snippet.description,
            published_at: video.snippet.published_at,
            channel_title: video.snippet.channel_title,
            channel_id: video.snippet.channel_id,
            duration_secs: video
                .content_details
                .and_then(|d| d.duration)
                .and_then(|d| parse_iso8601_duration(&d)),
            view_count: statistics.view_count,
            like_count: statistics.like_count,
            comment_count: statistics.comment_count,
            tags: video.snippet.tags,
            scraped: false,
        }
    }
}

/// `PT1H2M3S` style durations, as returned in `contentDetails.duration`
pub fn parse_iso8601_duration(raw: &str) -> Option<u64> {
    let caps = ISO_DURATION_RE.captures(raw)?;
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(part(1) * 86_400 + part(2) * 3600 + part(3) * 60 + part(4))
}
