pub mod api;
pub mod client;
pub mod downloader;
pub mod scraper;
pub mod transcript;
mod video_id;

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::parser::YtHtmlDocument;

pub use video_id::{extract_video_id, watch_url};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<String>,
    pub channel_title: Option<String>,
    pub channel_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<u64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub tags: Vec<String>,
    /// Came from the watch page rather than the Data API
    pub scraped: bool,
}

/// One caption line; times in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub uploads_playlist_id: Option<String>,
}

pub trait PageFetcher: Send + Sync {
    fn fetch_text(&self, url: &str) -> impl Future<Output = anyhow::Result<String>> + Send;

    fn fetch_document(
        &self,
        url: &str,
    ) -> impl Future<Output = anyhow::Result<YtHtmlDocument>> + Send {
        async move { self.fetch_text(url).await.map(YtHtmlDocument::from) }
    }
}

pub trait MediaDownloader {
    /// Downloads the video into `dir` and returns the file path
    fn download_video(
        &self,
        video_id: &str,
        dir: &Path,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;

    /// Downloads the audio track as mp3 into `dir`
    fn download_audio(
        &self,
        video_id: &str,
        dir: &Path,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;
}
