//! Publishing to Facebook pages and Instagram business accounts through the
//! Graph API, plus the scheduling and engagement bookkeeping around it.

pub mod facebook;
pub mod instagram;
pub mod manager;

use std::{future::Future, path::Path};

use chrono::Utc;
use serde::de::DeserializeOwned;

pub use clipcast_store::{EngagementSnapshot as Engagement, Platform};
pub use facebook::FacebookClient;
pub use instagram::InstagramClient;
pub use manager::{DispatchReport, SocialMediaManager};

pub(crate) const GRAPH_API_URL: &str = "https://graph.facebook.com/v19.0";

#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub content: String,
    pub media_path: Option<String>,
}

impl PostDraft {
    pub fn new(content: impl Into<String>, media_path: Option<String>) -> Self {
        Self {
            content: content.into(),
            media_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPost {
    pub platform: Platform,
    pub post_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn of(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("mp4" | "mov" | "avi") => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("{0} client is not configured")]
    NotConfigured(Platform),
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Graph API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("{0} posts require media")]
    MediaRequired(Platform),
    #[error("Invalid media URL: {0}")]
    InvalidMediaUrl(String),
    #[error("Media container {id} ended with status {status}")]
    ContainerFailed { id: String, status: String },
    #[error("Media container {0} was not ready in time")]
    ContainerTimeout(String),
}

pub trait Publisher {
    const PLATFORM: Platform;

    fn publish(
        &self,
        draft: &PostDraft,
    ) -> impl Future<Output = Result<PublishedPost, SocialError>> + Send;

    fn engagement(
        &self,
        post_id: &str,
    ) -> impl Future<Output = Result<Engagement, SocialError>> + Send;
}

/// Engagement with every counter at zero, stamped now
pub fn empty_engagement(platform: Platform, post_id: &str) -> Engagement {
    Engagement {
        platform,
        post_id: post_id.to_string(),
        likes: 0,
        comments: 0,
        shares: 0,
        views: 0,
        timestamp: Utc::now(),
    }
}

/// Decodes a Graph API reply, turning non-2xx statuses into [`SocialError::Api`]
pub(crate) async fn graph_json<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, SocialError> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(SocialError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp.json::<T>().await?)
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct GraphId {
    pub id: String,
    /// Photo uploads also report the feed post they created
    #[serde(default)]
    pub post_id: Option<String>,
}
