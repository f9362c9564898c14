use std::sync::{Arc, Mutex};

use clipcast::yt::PageFetcher;

const WATCH_HTML: &str = include_str!("../fixtures/watch.html");
const CHANNEL_VIDEOS_HTML: &str = include_str!("../fixtures/channel_videos.html");
const TIMEDTEXT_JSON: &str = include_str!("../fixtures/timedtext.json");
const FIXTURE_VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Serves the HTML fixtures by URL shape. Watch pages are rewritten to the
/// requested video id.
#[derive(Clone)]
pub struct MockPageFetcher {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub captions: bool,
    pub fail_with: Option<String>,
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            captions: true,
            fail_with: None,
        }
    }
}

impl MockPageFetcher {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn without_captions() -> Self {
        Self {
            captions: false,
            ..Default::default()
        }
    }
}

fn query_video_id(url: &str) -> Option<&str> {
    url.split_once("v=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
}

impl PageFetcher for MockPageFetcher {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }

        if url.contains("/api/timedtext") {
            return if self.captions {
                Ok(TIMEDTEXT_JSON.to_string())
            } else {
                Err(anyhow::anyhow!("404 Not Found: {}", url))
            };
        }
        if url.contains("/watch?") {
            let video_id = query_video_id(url).unwrap_or(FIXTURE_VIDEO_ID);
            return Ok(WATCH_HTML.replace(FIXTURE_VIDEO_ID, video_id));
        }
        if url.ends_with("/videos") {
            return Ok(CHANNEL_VIDEOS_HTML.to_string());
        }

        Err(anyhow::anyhow!("No fixture for {}", url))
    }
}
