use std::path::Path;

use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;

use crate::social::{
    graph_json, Engagement, GraphId, MediaKind, Platform, PostDraft, PublishedPost, Publisher,
    SocialError, GRAPH_API_URL,
};

const VIDEO_TITLE_CHARS: usize = 40;

/// Publishes to a Facebook page with a page access token
#[derive(Debug, Clone)]
pub struct FacebookClient {
    client: Client,
    access_token: String,
    page_id: String,
    base_url: String,
}

impl FacebookClient {
    pub fn new(access_token: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            page_id: page_id.into(),
            base_url: GRAPH_API_URL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self, edge: &str) -> String {
        format!("{}/{}/{edge}", self.base_url, self.page_id)
    }

    async fn post_text(&self, message: &str) -> Result<GraphId, SocialError> {
        let resp = self
            .client
            .post(self.endpoint("feed"))
            .form(&[("message", message), ("access_token", self.access_token.as_str())])
            .send()
            .await?;
        graph_json(resp).await
    }

    async fn post_media(&self, path: &Path, message: &str) -> Result<GraphId, SocialError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let source = Part::bytes(bytes).file_name(file_name);

        let (edge, form) = match MediaKind::of(path) {
            MediaKind::Video => (
                "videos",
                Form::new()
                    .text("title", video_title(message))
                    .text("description", message.to_string()),
            ),
            MediaKind::Image => ("photos", Form::new().text("message", message.to_string())),
        };
        let form = form
            .text("access_token", self.access_token.clone())
            .part("source", source);

        let resp = self
            .client
            .post(self.endpoint(edge))
            .multipart(form)
            .send()
            .await?;
        graph_json(resp).await
    }
}

/// Video titles are capped at 40 characters
pub fn video_title(content: &str) -> String {
    content.chars().take(VIDEO_TITLE_CHARS).collect()
}

#[derive(Debug, Default, Deserialize)]
struct PostStats {
    #[serde(default)]
    shares: Option<ShareCount>,
    #[serde(default)]
    comments: Option<SummaryEdge>,
    #[serde(default)]
    reactions: Option<SummaryEdge>,
}

#[derive(Debug, Deserialize)]
struct ShareCount {
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct SummaryEdge {
    #[serde(default)]
    summary: Summary,
}

#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    total_count: u64,
}

impl PostStats {
    fn into_engagement(self, post_id: &str) -> Engagement {
        let total = |edge: Option<SummaryEdge>| edge.map(|e| e.summary.total_count).unwrap_or(0);
        Engagement {
            platform: Platform::Facebook,
            post_id: post_id.to_string(),
            likes: total(self.reactions),
            comments: total(self.comments),
            shares: self.shares.map(|s| s.count).unwrap_or(0),
            views: 0,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl Publisher for FacebookClient {
    const PLATFORM: Platform = Platform::Facebook;

    #[tracing::instrument(skip_all, fields(page_id = %self.page_id))]
    async fn publish(&self, draft: &PostDraft) -> Result<PublishedPost, SocialError> {
        let created = match &draft.media_path {
            Some(path) => self.post_media(Path::new(path), &draft.content).await,
            None => self.post_text(&draft.content).await,
        }
        .inspect_err(|e| tracing::error!(error = ?e, "Error posting to Facebook"))?;

        tracing::info!(id = %created.id, "Successfully posted to Facebook");
        Ok(PublishedPost {
            platform: Self::PLATFORM,
            post_id: created.post_id.unwrap_or(created.id),
        })
    }

    async fn engagement(&self, post_id: &str) -> Result<Engagement, SocialError> {
        let resp = self
            .client
            .get(format!("{}/{post_id}", self.base_url))
            .query(&[
                ("fields", "shares,comments.summary(true),reactions.summary(true)"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;
        let stats = graph_json::<PostStats>(resp).await?;
        Ok(stats.into_engagement(post_id))
    }
}
