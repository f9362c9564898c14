use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tokio::{io::AsyncWriteExt, sync::Mutex};

use crate::{
    datastore::{DataStore, DispatchUpdate},
    EngagementSnapshot, ScheduledPost, VideoRecord,
};

/// JSON-on-disk store rooted at `<root>/store`
///
/// Layout:
/// - `videos/<video_id>.json`, one record per video
/// - `scheduled_posts.json`, every scheduled post
/// - `engagement.jsonl`, one snapshot per line
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    // serialises read-modify-write cycles on scheduled_posts.json
    posts_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub async fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into().join("store");
        tokio::fs::create_dir_all(root.join("videos"))
            .await
            .with_context(|| format!("Failed to create store directory {}", root.display()))?;

        Ok(Self {
            root,
            posts_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn video_path(&self, video_id: &str) -> PathBuf {
        self.root.join("videos").join(format!("{video_id}.json"))
    }

    fn posts_path(&self) -> PathBuf {
        self.root.join("scheduled_posts.json")
    }

    async fn read_posts(&self) -> anyhow::Result<Vec<ScheduledPost>> {
        match tokio::fs::read(self.posts_path()).await {
            Ok(bytes) => serde_json::from_slice(&bytes).context("Corrupt scheduled_posts.json"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).context("Failed to read scheduled_posts.json"),
        }
    }

    async fn write_posts(&self, posts: &[ScheduledPost]) -> anyhow::Result<()> {
        let tmp = self.posts_path().with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(posts)?).await?;
        tokio::fs::rename(&tmp, self.posts_path())
            .await
            .context("Failed to replace scheduled_posts.json")?;
        Ok(())
    }
}

impl DataStore for FileStore {
    async fn get_existing_video_ids(&self, video_ids: &[&str]) -> anyhow::Result<HashSet<String>> {
        let mut existing = HashSet::new();
        for id in video_ids {
            if tokio::fs::try_exists(self.video_path(id)).await? {
                existing.insert(id.to_string());
            }
        }
        Ok(existing)
    }

    async fn upsert_video(&self, video: &VideoRecord) -> anyhow::Result<()> {
        let merged = match self.get_video(&video.video_id).await? {
            Some(previous) => VideoRecord {
                video_path: video.video_path.clone().or(previous.video_path),
                audio_path: video.audio_path.clone().or(previous.audio_path),
                has_transcript: video.has_transcript || previous.has_transcript,
                ..video.clone()
            },
            None => video.clone(),
        };

        tokio::fs::write(
            self.video_path(&video.video_id),
            serde_json::to_vec_pretty(&merged)?,
        )
        .await
        .inspect_err(|e| tracing::error!(error = ?e, video_id = %video.video_id, "Failed to write video record"))
        .context("Failed to write video record")?;

        Ok(())
    }

    async fn get_video(&self, video_id: &str) -> anyhow::Result<Option<VideoRecord>> {
        match tokio::fs::read(self.video_path(video_id)).await {
            Ok(bytes) => Ok(Some(
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("Corrupt video record for {video_id}"))?,
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read video record"),
        }
    }

    async fn insert_scheduled_posts(
        &self,
        posts: &[ScheduledPost],
    ) -> anyhow::Result<Vec<ScheduledPost>> {
        let _guard = self.posts_lock.lock().await;

        let mut all = self.read_posts().await?;
        let mut next_id = all.iter().filter_map(|p| p.id).max().unwrap_or(0) + 1;

        let inserted = posts
            .iter()
            .map(|post| {
                let post = ScheduledPost {
                    id: Some(next_id),
                    ..post.clone()
                };
                next_id += 1;
                post
            })
            .collect::<Vec<_>>();

        all.extend(inserted.iter().cloned());
        self.write_posts(&all).await?;

        Ok(inserted)
    }

    async fn due_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledPost>> {
        let _guard = self.posts_lock.lock().await;

        Ok(self
            .read_posts()
            .await?
            .into_iter()
            .filter(|p| p.is_due(now))
            .sorted_by_key(|p| (p.scheduled_time, p.id))
            .collect())
    }

    async fn update_post_status(&self, update: &DispatchUpdate) -> anyhow::Result<()> {
        let _guard = self.posts_lock.lock().await;

        let mut all = self.read_posts().await?;
        let post = all
            .iter_mut()
            .find(|p| p.id == Some(update.id))
            .ok_or_else(|| anyhow::anyhow!("No scheduled post with id {}", update.id))?;

        post.status = update.status;
        post.remote_post_id = update.remote_post_id.clone();
        post.last_error = update.last_error.clone();

        self.write_posts(&all).await
    }

    async fn record_engagement(&self, snapshot: &EngagementSnapshot) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join("engagement.jsonl"))
            .await
            .context("Failed to open engagement log")?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
