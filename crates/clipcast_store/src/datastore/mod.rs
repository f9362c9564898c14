use std::{collections::HashSet, future::Future};

use chrono::{DateTime, Utc};

use crate::{EngagementSnapshot, PostStatus, ScheduledPost, VideoRecord};

pub mod file;
pub mod postgres;

/// Outcome of publishing one scheduled post
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchUpdate {
    pub id: i64,
    pub status: PostStatus,
    pub remote_post_id: Option<String>,
    pub last_error: Option<String>,
}

pub trait DataStore {
    fn get_existing_video_ids(
        &self,
        video_ids: &[&str],
    ) -> impl Future<Output = anyhow::Result<HashSet<String>>> + Send;

    fn upsert_video(&self, video: &VideoRecord) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn get_video(
        &self,
        video_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<VideoRecord>>> + Send;

    /// Persists `posts` and returns them with their assigned ids
    fn insert_scheduled_posts(
        &self,
        posts: &[ScheduledPost],
    ) -> impl Future<Output = anyhow::Result<Vec<ScheduledPost>>> + Send;

    /// Scheduled posts whose time has come, oldest first
    fn due_posts(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<Vec<ScheduledPost>>> + Send;

    fn update_post_status(
        &self,
        update: &DispatchUpdate,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn record_engagement(
        &self,
        snapshot: &EngagementSnapshot,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn get_existing_video_ids(&self, video_ids: &[&str]) -> anyhow::Result<HashSet<String>> {
        (**self).get_existing_video_ids(video_ids).await
    }

    async fn upsert_video(&self, video: &VideoRecord) -> anyhow::Result<()> {
        (**self).upsert_video(video).await
    }

    async fn get_video(&self, video_id: &str) -> anyhow::Result<Option<VideoRecord>> {
        (**self).get_video(video_id).await
    }

    async fn insert_scheduled_posts(
        &self,
        posts: &[ScheduledPost],
    ) -> anyhow::Result<Vec<ScheduledPost>> {
        (**self).insert_scheduled_posts(posts).await
    }

    async fn due_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledPost>> {
        (**self).due_posts(now).await
    }

    async fn update_post_status(&self, update: &DispatchUpdate) -> anyhow::Result<()> {
        (**self).update_post_status(update).await
    }

    async fn record_engagement(&self, snapshot: &EngagementSnapshot) -> anyhow::Result<()> {
        (**self).record_engagement(snapshot).await
    }
}

/// Store selected at startup: Postgres when a database URL is configured,
/// the file store otherwise
#[derive(Debug, Clone)]
pub enum AnyStore {
    Postgres(postgres::PgDataStore),
    File(file::FileStore),
}

impl AnyStore {
    pub async fn connect(
        database_url: Option<&str>,
        file_root: impl Into<std::path::PathBuf>,
    ) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(AnyStore::Postgres(postgres::PgDataStore::init(url).await?)),
            None => Ok(AnyStore::File(file::FileStore::open(file_root).await?)),
        }
    }
}

impl DataStore for AnyStore {
    async fn get_existing_video_ids(&self, video_ids: &[&str]) -> anyhow::Result<HashSet<String>> {
        match self {
            AnyStore::Postgres(s) => s.get_existing_video_ids(video_ids).await,
            AnyStore::File(s) => s.get_existing_video_ids(video_ids).await,
        }
    }

    async fn upsert_video(&self, video: &VideoRecord) -> anyhow::Result<()> {
        match self {
            AnyStore::Postgres(s) => s.upsert_video(video).await,
            AnyStore::File(s) => s.upsert_video(video).await,
        }
    }

    async fn get_video(&self, video_id: &str) -> anyhow::Result<Option<VideoRecord>> {
        match self {
            AnyStore::Postgres(s) => s.get_video(video_id).await,
            AnyStore::File(s) => s.get_video(video_id).await,
        }
    }

    async fn insert_scheduled_posts(
        &self,
        posts: &[ScheduledPost],
    ) -> anyhow::Result<Vec<ScheduledPost>> {
        match self {
            AnyStore::Postgres(s) => s.insert_scheduled_posts(posts).await,
            AnyStore::File(s) => s.insert_scheduled_posts(posts).await,
        }
    }

    async fn due_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledPost>> {
        match self {
            AnyStore::Postgres(s) => s.due_posts(now).await,
            AnyStore::File(s) => s.due_posts(now).await,
        }
    }

    async fn update_post_status(&self, update: &DispatchUpdate) -> anyhow::Result<()> {
        match self {
            AnyStore::Postgres(s) => s.update_post_status(update).await,
            AnyStore::File(s) => s.update_post_status(update).await,
        }
    }

    async fn record_engagement(&self, snapshot: &EngagementSnapshot) -> anyhow::Result<()> {
        match self {
            AnyStore::Postgres(s) => s.record_engagement(snapshot).await,
            AnyStore::File(s) => s.record_engagement(snapshot).await,
        }
    }
}
