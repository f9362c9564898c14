use std::sync::{Arc, Mutex};

use clipcast::social::{
    empty_engagement, Engagement, Platform, PostDraft, PublishedPost, Publisher, SocialError,
};

/// A Facebook page that accepts every post, except those whose content
/// contains `reject`
#[derive(Clone, Default)]
pub struct MockPublisher {
    pub calls: Arc<Mutex<Vec<PostDraft>>>,
    pub reject: Option<String>,
    pub likes: u64,
}

impl MockPublisher {
    pub fn failing(msg: &str) -> Self {
        Self {
            reject: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Publisher for MockPublisher {
    const PLATFORM: Platform = Platform::Facebook;

    async fn publish(&self, draft: &PostDraft) -> Result<PublishedPost, SocialError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(draft.clone());

        if let Some(ref msg) = self.reject {
            if draft.content.contains(msg.as_str()) {
                return Err(SocialError::Api {
                    status: 400,
                    message: msg.clone(),
                });
            }
        }

        Ok(PublishedPost {
            platform: Self::PLATFORM,
            post_id: format!("page_{}", calls.len()),
        })
    }

    async fn engagement(&self, post_id: &str) -> Result<Engagement, SocialError> {
        Ok(Engagement {
            likes: self.likes,
            ..empty_engagement(Self::PLATFORM, post_id)
        })
    }
}
