use std::{path::Path, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::social::{
    graph_json, Engagement, GraphId, MediaKind, Platform, PostDraft, PublishedPost, Publisher,
    SocialError, GRAPH_API_URL,
};

const MAX_STATUS_POLLS: usize = 10;

/// Publishes to an Instagram business account.
///
/// The Graph API only accepts media by public URL, so local files must be
/// reachable under `media_base_url` by their file name.
#[derive(Debug, Clone)]
pub struct InstagramClient {
    client: Client,
    access_token: String,
    user_id: String,
    media_base_url: Option<String>,
    base_url: String,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct ContainerStatus {
    #[serde(default)]
    status_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaCounts {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    comments_count: u64,
}

#[derive(Debug, Deserialize)]
struct Insights {
    #[serde(default)]
    data: Vec<Insight>,
}

#[derive(Debug, Deserialize)]
struct Insight {
    name: String,
    #[serde(default)]
    values: Vec<InsightValue>,
}

#[derive(Debug, Deserialize)]
struct InsightValue {
    #[serde(default)]
    value: u64,
}

impl Insights {
    fn metric(&self, name: &str) -> u64 {
        self.data
            .iter()
            .find(|i| i.name == name)
            .and_then(|i| i.values.first())
            .map(|v| v.value)
            .unwrap_or(0)
    }
}

impl InstagramClient {
    pub fn new(
        access_token: impl Into<String>,
        user_id: impl Into<String>,
        media_base_url: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            user_id: user_id.into(),
            media_base_url,
            base_url: GRAPH_API_URL.into(),
            poll_interval: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn create_container(
        &self,
        caption: &str,
        media_url: &str,
        kind: MediaKind,
    ) -> Result<String, SocialError> {
        let mut form = vec![
            ("caption", caption),
            ("access_token", self.access_token.as_str()),
        ];
        match kind {
            MediaKind::Image => form.push(("image_url", media_url)),
            MediaKind::Video => {
                form.push(("video_url", media_url));
                form.push(("media_type", "REELS"));
            }
        }

        let resp = self
            .client
            .post(format!("{}/{}/media", self.base_url, self.user_id))
            .form(&form)
            .send()
            .await?;
        Ok(graph_json::<GraphId>(resp).await?.id)
    }

    /// Video containers are processed asynchronously and cannot be
    /// published until they report `FINISHED`
    async fn wait_until_finished(&self, container_id: &str) -> Result<(), SocialError> {
        for _ in 0..MAX_STATUS_POLLS {
            let resp = self
                .client
                .get(format!("{}/{container_id}", self.base_url))
                .query(&[
                    ("fields", "status_code"),
                    ("access_token", self.access_token.as_str()),
                ])
                .send()
                .await?;
            let status = graph_json::<ContainerStatus>(resp).await?.status_code;

            match status.as_deref() {
                Some("FINISHED") => return Ok(()),
                Some(s @ ("ERROR" | "EXPIRED")) => {
                    return Err(SocialError::ContainerFailed {
                        id: container_id.to_string(),
                        status: s.to_string(),
                    })
                }
                other => tracing::debug!(status = ?other, "Media container still processing"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(SocialError::ContainerTimeout(container_id.to_string()))
    }

    async fn publish_container(&self, container_id: &str) -> Result<String, SocialError> {
        let resp = self
            .client
            .post(format!("{}/{}/media_publish", self.base_url, self.user_id))
            .form(&[
                ("creation_id", container_id),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;
        Ok(graph_json::<GraphId>(resp).await?.id)
    }

    async fn views(&self, media_id: &str) -> Result<u64, SocialError> {
        let resp = self
            .client
            .get(format!("{}/{media_id}/insights", self.base_url))
            .query(&[
                ("metric", "plays"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;
        Ok(graph_json::<Insights>(resp).await?.metric("plays"))
    }
}

/// Public URL of a local file: its file name joined onto `base`
pub fn public_media_url(base: &str, path: &Path) -> Result<String, SocialError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SocialError::InvalidMediaUrl(path.display().to_string()))?;

    let mut url = Url::parse(base).map_err(|e| SocialError::InvalidMediaUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| SocialError::InvalidMediaUrl(base.to_string()))?
        .pop_if_empty()
        .push(file_name);
    Ok(url.to_string())
}

impl Publisher for InstagramClient {
    const PLATFORM: Platform = Platform::Instagram;

    #[tracing::instrument(skip_all, fields(user_id = %self.user_id))]
    async fn publish(&self, draft: &PostDraft) -> Result<PublishedPost, SocialError> {
        let path = draft
            .media_path
            .as_deref()
            .map(Path::new)
            .ok_or(SocialError::MediaRequired(Self::PLATFORM))?;
        let base = self
            .media_base_url
            .as_deref()
            .ok_or_else(|| SocialError::InvalidMediaUrl("INSTAGRAM_MEDIA_BASE_URL is not set".into()))?;

        let kind = MediaKind::of(path);
        let media_url = public_media_url(base, path)?;

        let post_id = async {
            let container_id = self.create_container(&draft.content, &media_url, kind).await?;
            if kind == MediaKind::Video {
                self.wait_until_finished(&container_id).await?;
            }
            self.publish_container(&container_id).await
        }
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Error posting to Instagram"))?;

        tracing::info!(id = %post_id, "Successfully posted to Instagram");
        Ok(PublishedPost {
            platform: Self::PLATFORM,
            post_id,
        })
    }

    async fn engagement(&self, post_id: &str) -> Result<Engagement, SocialError> {
        let resp = self
            .client
            .get(format!("{}/{post_id}", self.base_url))
            .query(&[
                ("fields", "like_count,comments_count"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;
        let counts = graph_json::<MediaCounts>(resp).await?;

        // images have no plays insight
        let views = self
            .views(post_id)
            .await
            .inspect_err(|e| tracing::warn!(error = ?e, "Plays insight unavailable"))
            .unwrap_or(0);

        Ok(Engagement {
            platform: Self::PLATFORM,
            post_id: post_id.to_string(),
            likes: counts.like_count,
            comments: counts.comments_count,
            shares: 0,
            views,
            timestamp: chrono::Utc::now(),
        })
    }
}
