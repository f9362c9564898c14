use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clipcast_store::{DataStore, DispatchUpdate, PostStatus, ScheduledPost};

use crate::social::{
    empty_engagement, Engagement, Platform, PostDraft, PublishedPost, Publisher, SocialError,
};

/// Routes posts to the configured platform clients and keeps the store in
/// step with what was published
pub struct SocialMediaManager<Fb, Ig, D> {
    facebook: Option<Fb>,
    instagram: Option<Ig>,
    store: D,
    output_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    pub posted: Vec<(i64, PublishedPost)>,
    pub failed: Vec<(i64, String)>,
}

impl<Fb, Ig, D> SocialMediaManager<Fb, Ig, D>
where
    Fb: Publisher + Send + Sync,
    Ig: Publisher + Send + Sync,
    D: DataStore + Send + Sync,
{
    pub fn new(store: D, output_path: impl Into<PathBuf>) -> Self {
        Self {
            facebook: None,
            instagram: None,
            store,
            output_path: output_path.into(),
        }
    }

    pub fn with_facebook(mut self, client: Option<Fb>) -> Self {
        self.facebook = client;
        self
    }

    pub fn with_instagram(mut self, client: Option<Ig>) -> Self {
        self.instagram = client;
        self
    }

    pub fn is_configured(&self, platform: Platform) -> bool {
        match platform {
            Platform::Facebook => self.facebook.is_some(),
            Platform::Instagram => self.instagram.is_some(),
        }
    }

    #[tracing::instrument(skip(self, draft), fields(has_media = draft.media_path.is_some()))]
    pub async fn post(
        &self,
        platform: Platform,
        draft: &PostDraft,
    ) -> Result<PublishedPost, SocialError> {
        match platform {
            Platform::Facebook => match &self.facebook {
                Some(client) => client.publish(draft).await,
                None => Err(SocialError::NotConfigured(platform)),
            },
            Platform::Instagram => match &self.instagram {
                Some(client) => client.publish(draft).await,
                None => Err(SocialError::NotConfigured(platform)),
            },
        }
        .inspect_err(|e| tracing::warn!(error = %e, "Post was not published"))
    }

    async fn fetch_engagement(
        &self,
        platform: Platform,
        post_id: &str,
    ) -> Result<Engagement, SocialError> {
        match platform {
            Platform::Facebook => match &self.facebook {
                Some(client) => client.engagement(post_id).await,
                None => Err(SocialError::NotConfigured(platform)),
            },
            Platform::Instagram => match &self.instagram {
                Some(client) => client.engagement(post_id).await,
                None => Err(SocialError::NotConfigured(platform)),
            },
        }
    }

    /// Spaces `items` `interval_hours` apart from `start`, persists them and
    /// exports the schedule to `schedules/schedule_<unix>.json`
    #[tracing::instrument(skip(self, items), fields(count = items.len()))]
    pub async fn schedule_posts(
        &self,
        platform: Platform,
        items: Vec<(String, Option<String>)>,
        start: DateTime<Utc>,
        interval_hours: u32,
    ) -> anyhow::Result<Vec<ScheduledPost>> {
        let step = i64::from(interval_hours);
        let posts = items
            .into_iter()
            .enumerate()
            .map(|(i, (content, media_path))| -> anyhow::Result<ScheduledPost> {
                let at = (i as i64)
                    .checked_mul(step)
                    .and_then(Duration::try_hours)
                    .and_then(|offset| start.checked_add_signed(offset))
                    .with_context(|| {
                        format!("Post {i} at {interval_hours}h intervals is out of range")
                    })?;
                Ok(ScheduledPost::new(platform, content, media_path, at))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let scheduled = self
            .store
            .insert_scheduled_posts(&posts)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to persist scheduled posts"))
            .context("Failed to persist scheduled posts")?;

        let path = export_schedule(&self.output_path, &scheduled, Utc::now())?;
        tracing::info!(count = scheduled.len(), path = %path.display(), "Created schedule");

        Ok(scheduled)
    }

    /// Current engagement for a published post. Failures are logged and
    /// reported as zeros; successful reads are recorded in the store.
    #[tracing::instrument(skip(self))]
    pub async fn monitor_engagement(&self, platform: Platform, post_id: &str) -> Engagement {
        match self.fetch_engagement(platform, post_id).await {
            Ok(engagement) => {
                tracing::info!("Retrieved engagement metrics");
                if let Err(e) = self.store.record_engagement(&engagement).await {
                    tracing::error!(error = ?e, "Failed to record engagement");
                }
                engagement
            }
            Err(e) => {
                tracing::error!(error = ?e, "Error monitoring engagement");
                empty_engagement(platform, post_id)
            }
        }
    }

    /// Publishes every scheduled post that is due, oldest first, and marks
    /// each as posted or failed.
    ///
    /// Each post is claimed as publishing before it is sent. A post whose
    /// claim cannot be stored is skipped; a post whose final status cannot
    /// be stored stays publishing and is never sent again.
    #[tracing::instrument(skip(self))]
    pub async fn dispatch_due_posts(&self, now: DateTime<Utc>) -> anyhow::Result<DispatchReport> {
        let due = self
            .store
            .due_posts(now)
            .await
            .context("Failed to load due posts")?;

        let mut report = DispatchReport::default();
        for post in due {
            let Some(id) = post.id else {
                tracing::warn!("Skipping scheduled post without an id");
                continue;
            };

            let claim = DispatchUpdate {
                id,
                status: PostStatus::Publishing,
                remote_post_id: None,
                last_error: None,
            };
            if let Err(e) = self.store.update_post_status(&claim).await {
                tracing::error!(error = ?e, id, "Failed to claim scheduled post");
                report.failed.push((id, format!("Failed to claim post: {e}")));
                continue;
            }

            let draft = PostDraft::new(post.content, post.media_path);
            let update = match self.post(post.platform, &draft).await {
                Ok(published) => {
                    let update = DispatchUpdate {
                        id,
                        status: PostStatus::Posted,
                        remote_post_id: Some(published.post_id.clone()),
                        last_error: None,
                    };
                    report.posted.push((id, published));
                    update
                }
                Err(e) => {
                    report.failed.push((id, e.to_string()));
                    DispatchUpdate {
                        id,
                        status: PostStatus::Failed,
                        remote_post_id: None,
                        last_error: Some(e.to_string()),
                    }
                }
            };

            if let Err(e) = self.store.update_post_status(&update).await {
                tracing::error!(
                    error = ?e,
                    id,
                    status = %update.status,
                    "Failed to record dispatch outcome; post left as publishing"
                );
            }
        }

        tracing::info!(
            posted = report.posted.len(),
            failed = report.failed.len(),
            "Dispatched due posts"
        );
        Ok(report)
    }
}

fn export_schedule(
    output_path: &Path,
    posts: &[ScheduledPost],
    now: DateTime<Utc>,
) -> anyhow::Result<PathBuf> {
    let dir = output_path.join("schedules");
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!("schedule_{}.json", now.timestamp()));
    std::fs::write(&path, serde_json::to_vec_pretty(posts)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
