//! Wire types for YouTube: Data API v3 responses and the JSON blobs embedded
//! in watch pages.

use serde::{Deserialize, Deserializer};

/// The Data API encodes counters as strings
fn string_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => s.parse().ok(),
        Some(Raw::Num(n)) => Some(n),
        None => None,
    })
}

#[derive(Debug, Deserialize)]
pub struct ApiList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideo {
    pub id: String,
    pub snippet: ApiVideoSnippet,
    pub content_details: Option<ApiContentDetails>,
    pub statistics: Option<ApiStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub published_at: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    #[serde(default)]
    pub thumbnails: ApiThumbnails,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiThumbnails {
    pub high: Option<ApiThumbnail>,
    pub medium: Option<ApiThumbnail>,
    pub default: Option<ApiThumbnail>,
}

impl ApiThumbnails {
    pub fn best(&self) -> Option<&str> {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiThumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiContentDetails {
    /// ISO-8601 duration, e.g. `PT4M13S`
    pub duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatistics {
    #[serde(default, deserialize_with = "string_u64")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "string_u64")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "string_u64")]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChannel {
    pub id: String,
    pub snippet: ApiChannelSnippet,
    pub content_details: Option<ApiChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ApiChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChannelContentDetails {
    pub related_playlists: ApiRelatedPlaylists,
}

#[derive(Debug, Deserialize)]
pub struct ApiRelatedPlaylists {
    pub uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPlaylistItem {
    pub snippet: ApiPlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlaylistSnippet {
    pub title: String,
    pub resource_id: ApiResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchResult {
    pub id: ApiResourceId,
    pub snippet: ApiSearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchSnippet {
    pub channel_id: String,
    pub channel_title: String,
    #[serde(default)]
    pub title: String,
}

// --- watch page ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub video_details: Option<VideoDetails>,
    pub microformat: Option<Microformat>,
    pub captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    pub author: Option<String>,
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "string_u64")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "string_u64")]
    pub length_seconds: Option<u64>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Microformat {
    pub player_microformat_renderer: Option<PlayerMicroformatRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMicroformatRenderer {
    pub publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captions {
    pub player_captions_tracklist_renderer: Option<CaptionTracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTracklist {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `asr` for auto-generated tracks
    pub kind: Option<String>,
    #[serde(default)]
    pub is_translatable: bool,
}

impl CaptionTrack {
    pub fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// `fmt=json3` timed text
#[derive(Debug, Deserialize)]
pub struct TimedText {
    #[serde(default)]
    pub events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedTextEvent {
    #[serde(default)]
    pub t_start_ms: u64,
    #[serde(default)]
    pub d_duration_ms: u64,
    #[serde(default)]
    pub segs: Vec<TimedTextSegment>,
}

#[derive(Debug, Deserialize)]
pub struct TimedTextSegment {
    #[serde(default)]
    pub utf8: String,
}

/// Text nodes come as either `{"simpleText": ..}` or `{"runs": [{"text": ..}]}`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub simple_text: Option<String>,
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

impl TextNode {
    pub fn text(&self) -> String {
        match &self.simple_text {
            Some(text) => text.clone(),
            None => self.runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEndpoint {
    pub browse_endpoint: Option<BrowseEndpoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEndpoint {
    pub browse_id: String,
}

/// Shared shape of `videoRenderer`, `gridVideoRenderer` and `compactVideoRenderer`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRenderer {
    pub video_id: String,
    #[serde(default)]
    pub title: TextNode,
    pub owner_text: Option<TextNode>,
    pub short_byline_text: Option<TextNode>,
    pub long_byline_text: Option<TextNode>,
}

impl VideoRenderer {
    pub fn byline(&self) -> Option<&TextNode> {
        self.owner_text
            .as_ref()
            .or(self.long_byline_text.as_ref())
            .or(self.short_byline_text.as_ref())
    }
}
