use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use clipcast_store::{
    DataStore, DispatchUpdate, EngagementSnapshot, ScheduledPost, VideoRecord,
};

#[derive(Clone, Default)]
pub struct MockDataStore {
    pub existing_ids: HashSet<String>,
    pub inserted: Arc<Mutex<Vec<VideoRecord>>>,
    pub posts: Arc<Mutex<Vec<ScheduledPost>>>,
    pub updates: Arc<Mutex<Vec<DispatchUpdate>>>,
    pub engagement: Arc<Mutex<Vec<EngagementSnapshot>>>,
    pub fail_with: Option<String>,
}

impl MockDataStore {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn with_existing(ids: &[&str]) -> Self {
        Self {
            existing_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        match &self.fail_with {
            Some(msg) => Err(anyhow::anyhow!("{}", msg)),
            None => Ok(()),
        }
    }
}

impl DataStore for MockDataStore {
    async fn get_existing_video_ids(&self, video_ids: &[&str]) -> anyhow::Result<HashSet<String>> {
        Ok(video_ids
            .iter()
            .filter(|id| self.existing_ids.contains(**id))
            .map(|id| id.to_string())
            .collect())
    }

    async fn upsert_video(&self, video: &VideoRecord) -> anyhow::Result<()> {
        self.check()?;
        let mut inserted = self.inserted.lock().unwrap();
        inserted.retain(|v| v.video_id != video.video_id);
        inserted.push(video.clone());
        Ok(())
    }

    async fn get_video(&self, video_id: &str) -> anyhow::Result<Option<VideoRecord>> {
        Ok(self
            .inserted
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.video_id == video_id)
            .cloned())
    }

    async fn insert_scheduled_posts(
        &self,
        posts: &[ScheduledPost],
    ) -> anyhow::Result<Vec<ScheduledPost>> {
        self.check()?;
        let mut stored = self.posts.lock().unwrap();
        let mut saved = Vec::with_capacity(posts.len());
        for post in posts {
            let mut post = post.clone();
            post.id = Some(stored.len() as i64 + 1);
            stored.push(post.clone());
            saved.push(post);
        }
        Ok(saved)
    }

    async fn due_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ScheduledPost>> {
        self.check()?;
        let mut due = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_due(now))
            .cloned()
            .collect::<Vec<_>>();
        due.sort_by_key(|p| p.scheduled_time);
        Ok(due)
    }

    async fn update_post_status(&self, update: &DispatchUpdate) -> anyhow::Result<()> {
        self.check()?;
        if let Some(post) = self
            .posts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == Some(update.id))
        {
            post.status = update.status;
            post.remote_post_id = update.remote_post_id.clone();
            post.last_error = update.last_error.clone();
        }
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn record_engagement(&self, snapshot: &EngagementSnapshot) -> anyhow::Result<()> {
        self.check()?;
        self.engagement.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}
