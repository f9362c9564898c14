//! # Yt Parser
//!
//! Extracts the JSON blobs YouTube embeds in its HTML pages (`ytInitialData`
//! and `ytInitialPlayerResponse`) and maps them into the crate's video and
//! channel types.

use std::{collections::HashSet, ops::Deref, sync::LazyLock};

use serde::de::DeserializeOwned;
use serde_json::Value;

use regex::Regex;

use crate::{
    error::Error,
    types::{CaptionTrack, PlayerResponse, VideoRenderer},
    yt::{ChannelInfo, VideoInfo, VideoSummary},
};

static YT_INTIALDATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r#"(?s)<script[^>]*>\s*(?:var\s+ytInitialData|window\["ytInitialData"\])\s*=\s*(\{.*?\});\s*</script>"#,
    )
    .unwrap()
});

static YT_PLAYER_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?s)ytInitialPlayerResponse\s*=\s*(\{.*?\});\s*(?:var\s|</script>|if\s*\()",
    )
    .unwrap()
});

const VIDEO_RENDERER_KEYS: [&str; 3] = [
    "videoRenderer",
    "gridVideoRenderer",
    "compactVideoRenderer",
];

pub struct YtHtmlDocument(String);

impl Deref for YtHtmlDocument {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl YtHtmlDocument {
    pub fn new(doc: String) -> Self {
        YtHtmlDocument(doc)
    }

    fn extract<T>(&self, re: &Regex, error: &'static str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        re.captures(self)
            .and_then(|cap| cap.get(1))
            .and_then(|m| serde_json::from_str(m.as_str()).ok())
            .ok_or(Error::ParseError(error))
    }

    /// `ytInitialData` from the page's script tag
    pub fn initial_data<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.extract(
            &YT_INTIALDATA_RE,
            "Failed to extract ytInitialData from the page's script tag",
        )
    }

    /// `ytInitialPlayerResponse`, present on watch pages only
    pub fn player_response<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.extract(
            &YT_PLAYER_RESPONSE_RE,
            "Failed to extract ytInitialPlayerResponse from the page",
        )
    }
}

impl From<String> for YtHtmlDocument {
    fn from(value: String) -> Self {
        YtHtmlDocument(value)
    }
}

/// Collects every object stored under `key`, depth first in document order
pub fn find_objects<'a>(json: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect_objects(json, key, &mut found);
    found
}

fn collect_objects<'a>(json: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match json {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key && v.is_object() {
                    found.push(v);
                }
                collect_objects(v, key, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_objects(item, key, found);
            }
        }
        _ => {}
    }
}

/// Builds a [`VideoInfo`] from a watch page's player response, using the
/// initial data for the channel name and date when the player lacks them.
#[tracing::instrument(skip_all)]
pub fn parse_watch_page(player: &Value, initial: Option<&Value>) -> Result<VideoInfo, Error> {
    let player = serde_json::from_value::<PlayerResponse>(player.clone())?;
    let details = player.video_details.ok_or(Error::ParseError(
        "No value found for ytInitialPlayerResponse['videoDetails']",
    ))?;

    let published_at = player
        .microformat
        .and_then(|m| m.player_microformat_renderer)
        .and_then(|r| r.publish_date)
        .or_else(|| {
            initial
                .and_then(|json| find_objects(json, "videoPrimaryInfoRenderer").first().copied())
                .and_then(|r| r["dateText"]["simpleText"].as_str())
                .map(String::from)
        });

    let channel_title = details.author.or_else(|| {
        initial
            .and_then(|json| find_objects(json, "videoOwnerRenderer").first().copied())
            .and_then(|r| r["title"]["runs"][0]["text"].as_str())
            .map(String::from)
    });

    Ok(VideoInfo {
        thumbnail_url: Some(format!(
            "https://i.ytimg.com/vi/{}/hqdefault.jpg",
            details.video_id
        )),
        id: details.video_id,
        title: details.title,
        description: details.short_description,
        published_at,
        channel_title,
        channel_id: details.channel_id,
        duration_secs: details.length_seconds,
        view_count: details.view_count,
        like_count: None,
        comment_count: None,
        tags: details.keywords,
        scraped: true,
    })
}

/// Caption tracks listed in a watch page's player response
pub fn parse_caption_tracks(player: &Value) -> Vec<CaptionTrack> {
    player["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
        .as_array()
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|t| serde_json::from_value::<CaptionTrack>(t.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Every video listed on a page (search, channel grid, watch-page sidebar),
/// de-duplicated by id
#[tracing::instrument(skip_all)]
pub fn parse_video_summaries(initial: &Value) -> Vec<VideoSummary> {
    let mut seen = HashSet::new();
    let mut summaries = Vec::new();

    let mut renderers = Vec::new();
    collect_renderers(initial, &mut renderers);

    for raw in renderers {
        let Ok(renderer) = serde_json::from_value::<VideoRenderer>(raw.clone()) else {
            continue;
        };
        if !seen.insert(renderer.video_id.clone()) {
            continue;
        }

        let byline = renderer.byline();
        let channel_id = byline
            .and_then(|b| b.runs.first())
            .and_then(|run| run.navigation_endpoint.as_ref())
            .and_then(|nav| nav.browse_endpoint.as_ref())
            .map(|browse| browse.browse_id.clone());
        let channel_title = byline.map(|b| b.text()).filter(|t| !t.is_empty());

        summaries.push(VideoSummary {
            title: renderer.title.text(),
            video_id: renderer.video_id,
            channel_id,
            channel_title,
        });
    }

    summaries
}

/// Renderers of any listed kind, in document order
fn collect_renderers<'a>(json: &'a Value, found: &mut Vec<&'a Value>) {
    match json {
        Value::Object(map) => {
            for (k, v) in map {
                if VIDEO_RENDERER_KEYS.contains(&k.as_str()) && v.is_object() {
                    found.push(v);
                }
                collect_renderers(v, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_renderers(item, found);
            }
        }
        _ => {}
    }
}

/// Channel title and description from a channel page's initial data
pub fn parse_channel_page(channel_id: &str, initial: &Value) -> Result<ChannelInfo, Error> {
    let metadata = &initial["metadata"]["channelMetadataRenderer"];
    let title = metadata["title"].as_str().ok_or(Error::ParseError(
        "No value found for ytInitialData['metadata']['channelMetadataRenderer']['title']",
    ))?;

    Ok(ChannelInfo {
        id: metadata["externalId"]
            .as_str()
            .unwrap_or(channel_id)
            .to_string(),
        title: title.to_string(),
        description: metadata["description"].as_str().unwrap_or_default().to_string(),
        uploads_playlist_id: None,
    })
}
