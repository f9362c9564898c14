use std::collections::HashSet;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::{
    datastore::{DataStore, DispatchUpdate},
    EngagementSnapshot, ScheduledPost, VideoRecord,
};

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
}

impl PgDataStore {
    /// Establish connection to database and bring the schema up to date
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to postgres database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(PgDataStore { pool })
    }
}

#[derive(sqlx::FromRow)]
struct VideoRow {
    video_id: String,
    title: String,
    channel_title: Option<String>,
    channel_id: Option<String>,
    published_at: Option<String>,
    view_count: Option<i64>,
    video_path: Option<String>,
    audio_path: Option<String>,
    has_transcript: bool,
    processed_at: DateTime<Utc>,
    info_json: serde_json::Value,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            video_id: row.video_id,
            title: row.title,
            channel_title: row.channel_title,
            channel_id: row.channel_id,
            published_at: row.published_at,
            view_count: row.view_count.and_then(|v| u64::try_from(v).ok()),
            video_path: row.video_path,
            audio_path: row.audio_path,
            has_transcript: row.has_transcript,
            processed_at: row.processed_at,
            info_json: row.info_json,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduledPostRow {
    id: i64,
    platform: String,
    content: String,
    media_path: Option<String>,
    scheduled_time: DateTime<Utc>,
    status: String,
    remote_post_id: Option<String>,
    last_error: Option<String>,
}

impl TryFrom<ScheduledPostRow> for ScheduledPost {
    type Error = anyhow::Error;

    fn try_from(row: ScheduledPostRow) -> Result<Self, Self::Error> {
        Ok(ScheduledPost {
            id: Some(row.id),
            platform: row.platform.parse()?,
            content: row.content,
            media_path: row.media_path,
            scheduled_time: row.scheduled_time,
            status: row.status.parse()?,
            remote_post_id: row.remote_post_id,
            last_error: row.last_error,
        })
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl DataStore for PgDataStore {
    async fn get_existing_video_ids(&self, video_ids: &[&str]) -> anyhow::Result<HashSet<String>> {
        #[derive(sqlx::FromRow)]
        struct VideoId {
            video_id: String,
        }

        let videos =
            sqlx::query_as::<_, VideoId>("SELECT video_id FROM videos WHERE video_id = ANY($1)")
                .bind(video_ids)
                .fetch_all(&self.pool)
                .await
                .inspect_err(|e| {
                    tracing::error!(error = ?e, "Failed to fetch existing videos");
                })
                .context("Failed to fetch existing videos")?;

        Ok(videos.into_iter().map(|v| v.video_id).collect())
    }

    async fn upsert_video(&self, video: &VideoRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO videos (video_id, title, channel_title, channel_id, published_at, view_count,
                                video_path, audio_path, has_transcript, processed_at, info_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (video_id) DO UPDATE SET
                title = EXCLUDED.title,
                channel_title = EXCLUDED.channel_title,
                channel_id = EXCLUDED.channel_id,
                published_at = EXCLUDED.published_at,
                view_count = EXCLUDED.view_count,
                video_path = COALESCE(EXCLUDED.video_path, videos.video_path),
                audio_path = COALESCE(EXCLUDED.audio_path, videos.audio_path),
                has_transcript = EXCLUDED.has_transcript OR videos.has_transcript,
                processed_at = EXCLUDED.processed_at,
                info_json = EXCLUDED.info_json
            "#,
        )
        .bind(&video.video_id)
        .bind(&video.title)
        .bind(&video.channel_title)
        .bind(&video.channel_id)
        .bind(&video.published_at)
        .bind(video.view_count.map(to_i64))
        .bind(&video.video_path)
        .bind(&video.audio_path)
        .bind(video.has_transcript)
        .bind(video.processed_at)
        .bind(&video.info_json)
        .execute(&self.pool)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                video_id = %video.video_id,
                "Failed to upsert video"
            )
        })
        .context("Failed to upsert video")?;

        Ok(())
    }

    async fn get_video(&self, video_id: &str) -> anyhow::Result<Option<VideoRecord>> {
        let row = sqlx::query_as::<_, VideoRow>("SELECT * FROM videos WHERE video_id = $1")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch video")?;

        Ok(row.map(VideoRecord::from))
    }

    async fn insert_scheduled_posts(
        &self,
        posts: &[ScheduledPost],
    ) -> anyhow::Result<Vec<ScheduledPost>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(posts.len());

        for post in posts {
            let (id,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO scheduled_posts (platform, content, media_path, scheduled_time, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(post.platform.as_str())
            .bind(&post.content)
            .bind(&post.media_path)
            .bind(post.scheduled_time)
            .bind(post.status.as_str())
            .fetch_one(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to insert scheduled post"))
            .context("Failed to insert scheduled post")?;

            inserted.push(ScheduledPost {
                id: Some(id),
                ..post.clone()
            });
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn due_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledPost>> {
        let rows = sqlx::query_as::<_, ScheduledPostRow>(
            r#"
            SELECT * FROM scheduled_posts
            WHERE status = 'scheduled' AND scheduled_time <= $1
            ORDER BY scheduled_time ASC, id ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch due posts")?;

        rows.into_iter().map(ScheduledPost::try_from).collect()
    }

    async fn update_post_status(&self, update: &DispatchUpdate) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE scheduled_posts SET status = $2, remote_post_id = $3, last_error = $4 WHERE id = $1",
        )
        .bind(update.id)
        .bind(update.status.as_str())
        .bind(&update.remote_post_id)
        .bind(&update.last_error)
        .execute(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, id = update.id, "Failed to update post"))
        .context("Failed to update scheduled post")?;

        Ok(())
    }

    async fn record_engagement(&self, snapshot: &EngagementSnapshot) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO engagement_snapshots (platform, post_id, likes, comments, shares, views, captured_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(snapshot.platform.as_str())
        .bind(&snapshot.post_id)
        .bind(to_i64(snapshot.likes))
        .bind(to_i64(snapshot.comments))
        .bind(to_i64(snapshot.shares))
        .bind(to_i64(snapshot.views))
        .bind(snapshot.timestamp)
        .execute(&self.pool)
        .await
        .context("Failed to record engagement")?;

        Ok(())
    }
}
