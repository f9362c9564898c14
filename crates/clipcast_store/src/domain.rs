use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A video that went through the scraping step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub channel_title: Option<String>,
    pub channel_id: Option<String>,
    pub published_at: Option<String>,
    pub view_count: Option<u64>,
    pub video_path: Option<String>,
    pub audio_path: Option<String>,
    pub has_transcript: bool,
    pub processed_at: DateTime<Utc>,
    /// Full video metadata as fetched, kept for repurposing
    pub info_json: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" | "fb" => Ok(Platform::Facebook),
            "instagram" | "ig" => Ok(Platform::Instagram),
            other => anyhow::bail!("Unknown platform: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    /// Claimed by a dispatcher; no longer due
    Publishing,
    Posted,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Scheduled => "scheduled",
            PostStatus::Publishing => "publishing",
            PostStatus::Posted => "posted",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(PostStatus::Scheduled),
            "publishing" => Ok(PostStatus::Publishing),
            "posted" => Ok(PostStatus::Posted),
            "failed" => Ok(PostStatus::Failed),
            other => anyhow::bail!("Unknown post status: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPost {
    /// Assigned by the store on insert
    pub id: Option<i64>,
    pub platform: Platform,
    pub content: String,
    pub media_path: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub status: PostStatus,
    pub remote_post_id: Option<String>,
    pub last_error: Option<String>,
}

impl ScheduledPost {
    pub fn new(
        platform: Platform,
        content: impl Into<String>,
        media_path: Option<String>,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            platform,
            content: content.into(),
            media_path,
            scheduled_time,
            status: PostStatus::Scheduled,
            remote_post_id: None,
            last_error: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled && self.scheduled_time <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub platform: Platform,
    pub post_id: String,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn platform_round_trips_through_strings() {
        assert_eq!("Facebook".parse::<Platform>().unwrap(), Platform::Facebook);
        assert_eq!("ig".parse::<Platform>().unwrap(), Platform::Instagram);
        assert!("tiktok".parse::<Platform>().is_err());
        assert_eq!(Platform::Instagram.to_string(), "instagram");
    }

    #[test]
    fn only_scheduled_posts_in_the_past_are_due() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut post = ScheduledPost::new(Platform::Facebook, "hello", None, at);

        assert!(post.is_due(at));
        assert!(!post.is_due(at - chrono::Duration::seconds(1)));

        post.status = PostStatus::Posted;
        assert!(!post.is_due(at));

        post.status = PostStatus::Publishing;
        assert!(!post.is_due(at));
        assert_eq!("publishing".parse::<PostStatus>().unwrap(), PostStatus::Publishing);
        assert_eq!(PostStatus::Publishing.to_string(), "publishing");
    }
}
