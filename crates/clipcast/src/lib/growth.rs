//! Channel growth helpers: similar channels, trending keywords and video
//! ideas.
//!
//! Every operation degrades to an empty list on failure; the reason is
//! logged.

use std::{collections::HashMap, sync::LazyLock};

use chrono::Datelike;
use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::{
    llm::{
        generator::{GenerationRequest, TextGenerator},
        prompts,
    },
    yt::{client::YouTubeClient, PageFetcher, VideoSummary},
};

const SOURCE_VIDEOS: usize = 3;
const RELATED_PER_VIDEO: usize = 10;
const RECENT_TITLES: usize = 5;
const TOP_KEYWORDS: usize = 20;
const TEMPLATE_KEYWORDS: usize = 5;

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,15}\b").expect("Invalid keyword regex"));
static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\-\.\*\)\s]+").expect("Invalid list marker regex"));

const STOP_WORDS: [&str; 12] = [
    "the", "and", "you", "that", "have", "for", "this", "with", "not", "are", "from", "your",
];

const IDEA_TEMPLATES: [&str; 10] = [
    "How to [keyword] in [year]",
    "Top 10 [keyword] Tips You Need to Know",
    "Why [keyword] Is Changing Everything",
    "The Ultimate Guide to [keyword]",
    "I Tried [keyword] for a Week, Here's What Happened",
    "[keyword] vs [keyword2]: Which Is Better?",
    "How [keyword] Is Disrupting [industry]",
    "[keyword] Mistakes Everyone Makes",
    "The Truth About [keyword] Nobody Tells You",
    "Beginners Guide to [keyword]",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarChannel {
    pub id: String,
    pub title: String,
    /// How many related videos pointed at this channel
    pub count: usize,
}

pub struct ChannelGrowth<F: PageFetcher, G> {
    client: YouTubeClient<F>,
    generator: Option<G>,
}

impl<F, G> ChannelGrowth<F, G>
where
    F: PageFetcher,
    G: TextGenerator + Send + Sync,
{
    pub fn new(client: YouTubeClient<F>) -> Self {
        Self {
            client,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Option<G>) -> Self {
        self.generator = generator;
        self
    }

    /// Channels that show up most often next to this channel's recent videos
    #[tracing::instrument(skip(self))]
    pub async fn find_similar_channels(&self, channel_id: &str, max: usize) -> Vec<SimilarChannel> {
        self.try_find_similar_channels(channel_id, max)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Error finding similar channels"))
            .unwrap_or_default()
    }

    async fn try_find_similar_channels(
        &self,
        channel_id: &str,
        max: usize,
    ) -> anyhow::Result<Vec<SimilarChannel>> {
        let video_ids = self
            .client
            .channel_video_ids(channel_id, SOURCE_VIDEOS)
            .await?;

        let lookups = futures::future::join_all(
            video_ids
                .iter()
                .map(|video_id| self.client.related_videos(video_id, RELATED_PER_VIDEO)),
        )
        .await;

        let mut related = Vec::new();
        for (video_id, lookup) in video_ids.iter().zip(lookups) {
            match lookup {
                Ok(videos) => related.extend(videos),
                Err(e) => tracing::warn!(error = ?e, %video_id, "Skipping related videos"),
            }
        }

        let ranked = rank_channels(&related, channel_id, max);
        tracing::info!(count = ranked.len(), "Found similar channels");
        Ok(ranked)
    }

    /// The most frequent words across trending titles, descriptions and tags
    #[tracing::instrument(skip(self))]
    pub async fn analyze_trending_keywords(&self, category: Option<&str>) -> Vec<String> {
        match self.client.trending_texts(category).await {
            Ok(texts) => extract_keywords(&texts),
            Err(e) => {
                tracing::error!(error = ?e, "Error analyzing trending keywords");
                Vec::new()
            }
        }
    }

    #[tracing::instrument(skip(self, keywords), fields(keywords = keywords.len()))]
    pub async fn suggest_video_ideas(&self, channel_id: &str, keywords: &[String]) -> Vec<String> {
        let Some(generator) = &self.generator else {
            return template_ideas(keywords, chrono::Utc::now().year());
        };

        let request = self.ideas_request(channel_id, keywords).await;
        match generator.generate(request).await {
            Ok(generated) => parse_idea_lines(&generated.text),
            Err(e) => {
                tracing::error!(error = ?e, "Error suggesting video ideas");
                Vec::new()
            }
        }
    }

    async fn ideas_request(&self, channel_id: &str, keywords: &[String]) -> GenerationRequest {
        let (title, description) = match self.client.get_channel_info(channel_id).await {
            Ok(channel) => (channel.title, channel.description),
            Err(e) => {
                tracing::warn!(error = ?e, "Channel info unavailable for ideas prompt");
                (String::new(), String::new())
            }
        };
        let recent = self
            .client
            .recent_videos(channel_id, RECENT_TITLES)
            .await
            .inspect_err(|e| tracing::warn!(error = ?e, "Recent videos unavailable for ideas prompt"))
            .unwrap_or_default();

        let title = if title.is_empty() { "my channel".to_string() } else { title };
        let description = if description.is_empty() {
            "No description available".to_string()
        } else {
            description
        };
        let recent_titles = if recent.is_empty() {
            "No recent videos available".to_string()
        } else {
            recent.iter().map(|v| v.title.as_str()).join(", ")
        };

        GenerationRequest::new(
            prompts::IDEAS_SYSTEM,
            format!(
                "I need video ideas for a YouTube channel called \"{title}\".\n\n\
                 Channel description: {description}\n\n\
                 Recent video titles:\n{recent_titles}\n\n\
                 Trending keywords on YouTube: {}\n\n\
                 Please suggest 10 engaging video title ideas that would work well for this channel \
                 and incorporate some of the trending keywords where appropriate.",
                keywords.join(", ")
            ),
        )
    }
}

/// Counts channels across `related`, leaving out `exclude`. Ties keep the
/// order in which channels were first seen.
pub fn rank_channels(related: &[VideoSummary], exclude: &str, max: usize) -> Vec<SimilarChannel> {
    let mut channels: Vec<SimilarChannel> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for video in related {
        let Some(id) = video.channel_id.as_deref() else {
            continue;
        };
        if id == exclude {
            continue;
        }
        match index.get(id) {
            Some(&i) => channels[i].count += 1,
            None => {
                index.insert(id, channels.len());
                channels.push(SimilarChannel {
                    id: id.to_string(),
                    title: video.channel_title.clone().unwrap_or_default(),
                    count: 1,
                });
            }
        }
    }

    channels.sort_by(|a, b| b.count.cmp(&a.count));
    channels.truncate(max);
    channels
}

/// Top words by frequency; ties keep first-occurrence order
pub fn extract_keywords(texts: &[String]) -> Vec<String> {
    let text = texts.join(" ").to_lowercase();

    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for word in KEYWORD_RE
        .find_iter(&text)
        .map(|m| m.as_str())
        .filter(|w| !STOP_WORDS.contains(w))
    {
        match index.get(word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word, counts.len());
                counts.push((word, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Ideas from a model reply: list lines with their markers stripped
pub fn parse_idea_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with('-')
                || line.starts_with('*')
                || line.starts_with(|c: char| c.is_ascii_digit())
        })
        .map(|line| LIST_MARKER_RE.replace(line, "").trim().to_string())
        .filter(|idea| !idea.is_empty())
        .collect()
}

/// Fills the fixed title templates with up to five keywords
pub fn template_ideas(keywords: &[String], year: i32) -> Vec<String> {
    let year = year.to_string();
    let mut ideas = Vec::new();

    for template in IDEA_TEMPLATES {
        if template.contains("[keyword2]") {
            if let [first, second, ..] = keywords {
                ideas.push(
                    template
                        .replace("[keyword2]", second)
                        .replace("[keyword]", first),
                );
            }
            continue;
        }

        for keyword in keywords.iter().take(TEMPLATE_KEYWORDS) {
            ideas.push(
                template
                    .replace("[keyword]", keyword)
                    .replace("[industry]", "the industry")
                    .replace("[year]", &year),
            );
        }
    }

    ideas
}
