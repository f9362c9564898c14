use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context;
use clipcast_media::VideoProcessor;
use serde_json::Value;

use crate::{
    content::{
        text::{transcript_text, truncate_chars},
        ContentRepurposer,
    },
    llm::{
        generator::{GenerationRequest, TextGenerator},
        prompts,
    },
    yt::{TranscriptEntry, VideoInfo},
};

const SUMMARY_CHARS: usize = 500;
const MAX_HASHTAGS: usize = 5;

impl<G, V> ContentRepurposer<G, V>
where
    G: TextGenerator + Send + Sync,
    V: VideoProcessor + Send + Sync,
{
    /// Writes one `posts/<id>/<id>_<key>.txt` file per post and returns the
    /// paths keyed by post name (`instagram_1`, `facebook_2`, ...)
    #[tracing::instrument(skip_all, fields(video_id = %info.id))]
    pub async fn create_social_media_posts(
        &self,
        info: &VideoInfo,
        transcript: &[TranscriptEntry],
    ) -> anyhow::Result<BTreeMap<String, PathBuf>> {
        let mut posts = BTreeMap::new();

        if let Some(generator) = &self.generator {
            let summary = truncate_chars(&transcript_text(transcript), SUMMARY_CHARS);
            match generator.generate(social_request(info, &summary)).await {
                Ok(generated) => posts = parse_generated_posts(&generated.text),
                Err(e) => tracing::error!(error = ?e, "Error generating social media posts"),
            }
        }

        if posts.is_empty() {
            posts = template_posts(info);
        }

        let dir = self.artifact_dir("posts", &info.id)?;
        let mut paths = BTreeMap::new();
        for (key, content) in posts {
            let path = dir.join(format!("{}_{key}.txt", info.id));
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            paths.insert(key, path);
        }

        tracing::info!(count = paths.len(), dir = %dir.display(), "Social media posts created");
        Ok(paths)
    }
}

pub fn social_request(info: &VideoInfo, summary: &str) -> GenerationRequest {
    GenerationRequest::new(
        prompts::SOCIAL_SYSTEM,
        format!(
            "Create 3 different social media posts for Instagram and Facebook based on this \
             YouTube video titled '{}'. Here's a summary of the content: {summary}",
            info.title
        ),
    )
}

/// Reads posts from a model reply: a fenced ```json block, the whole reply
/// as JSON, or failing both `key: value` lines naming a platform
pub fn parse_generated_posts(reply: &str) -> BTreeMap<String, String> {
    let json_text = match reply.split_once("```json") {
        Some((_, rest)) => rest.split("```").next().unwrap_or(rest),
        None => reply,
    };

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(json_text.trim()) {
        return map
            .into_iter()
            .filter_map(|(key, value)| {
                let key = post_key(&key)?;
                match value {
                    Value::String(s) => Some((key, s)),
                    Value::Null => None,
                    other => Some((key, other.to_string())),
                }
            })
            .collect();
    }

    reply
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("instagram_") || lower.contains("facebook_")
        })
        .filter_map(|line| line.split_once(':'))
        .filter_map(|(key, value)| Some((post_key(key)?, value.trim().to_string())))
        .collect()
}

/// Post keys name files, so only `[a-z0-9_]` survives
fn post_key(raw: &str) -> Option<String> {
    let key = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>();
    (!key.is_empty()).then_some(key)
}

/// Posts built from the title alone
pub fn template_posts(info: &VideoInfo) -> BTreeMap<String, String> {
    let title = &info.title;
    let words = title.split_whitespace().collect::<Vec<_>>();
    let hashtags = words
        .iter()
        .filter(|w| w.chars().count() > 3)
        .take(MAX_HASHTAGS)
        .map(|w| format!("#{}", w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ");
    let opening = words.iter().take(3).copied().collect::<Vec<_>>().join(" ");

    BTreeMap::from([
        (
            "instagram_1".to_string(),
            format!("New post alert! 🚨 Check out this amazing content about {title}. {hashtags}"),
        ),
        (
            "instagram_2".to_string(),
            format!("Did you know about {opening}...? Watch our latest video to learn more! {hashtags}"),
        ),
        (
            "instagram_3".to_string(),
            format!("Content you don't want to miss! 👀 {title} {hashtags}"),
        ),
        (
            "facebook_1".to_string(),
            format!("We just uploaded a new video about {title}. Click the link in bio to watch the full video!"),
        ),
        (
            "facebook_2".to_string(),
            format!("Interesting facts about {opening}... Learn more in our latest upload!"),
        ),
        (
            "facebook_3".to_string(),
            format!("Don't miss out on our latest content: {title}. Share with someone who needs to see this!"),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::test_support::{FakeVideo, FixedGenerator};

    #[test]
    fn fenced_json_block_is_preferred() {
        let reply = "Sure! Here you go:\n```json\n{\"instagram_1\": \"Hi #diy\", \"facebook_1\": \"Hello\"}\n```\nEnjoy.";
        let posts = parse_generated_posts(reply);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts["instagram_1"], "Hi #diy");
    }

    #[test]
    fn bare_json_reply_is_parsed() {
        let posts = parse_generated_posts(r#"{"facebook_2": "Two", "instagram_3": "Three"}"#);
        assert_eq!(posts["facebook_2"], "Two");
        assert_eq!(posts["instagram_3"], "Three");
    }

    #[test]
    fn key_value_lines_are_the_last_resort() {
        let reply = "Instagram_1: Look at this: a shed!\nsomething else: ignored\nFacebook 1: nope\nfacebook_2 : Second";
        let posts = parse_generated_posts(reply);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts["instagram_1"], "Look at this: a shed!");
        assert_eq!(posts["facebook_2"], "Second");

        assert!(parse_generated_posts("no posts here").is_empty());
    }

    #[test]
    fn keys_cannot_escape_the_posts_directory() {
        let posts = parse_generated_posts(
            r#"{"../../etc/cron.d/x": "a", "a/b": "b", "./": "c", "**Instagram 1**": "d"}"#,
        );
        let keys = posts.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["ab", "etccrondx", "instagram_1"]);
    }

    #[test]
    fn templates_use_long_title_words_as_hashtags() {
        let info = VideoInfo {
            title: "How to Build a Garden Shed With Basic Power Tools".into(),
            ..Default::default()
        };
        let posts = template_posts(&info);

        assert_eq!(posts.len(), 6);
        assert!(posts["instagram_1"].ends_with("#build #garden #shed #with #basic"));
        assert!(posts["instagram_2"].starts_with("Did you know about How to Build...?"));
        assert!(posts["facebook_2"].starts_with("Interesting facts about How to Build..."));
        assert!(!posts["facebook_1"].contains('#'));
    }

    #[tokio::test]
    async fn posts_are_written_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let reply = r#"{"instagram_1": "Post one", "facebook_1": "Post two"}"#;
        let repurposer = ContentRepurposer::new(dir.path(), FakeVideo::default())
            .with_generator(Some(FixedGenerator(Ok(reply.into()))));
        let info = VideoInfo {
            id: "abc".into(),
            title: "Shed".into(),
            ..Default::default()
        };

        let paths = repurposer.create_social_media_posts(&info, &[]).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths["facebook_1"], dir.path().join("posts/abc/abc_facebook_1.txt"));
        assert_eq!(std::fs::read_to_string(&paths["instagram_1"]).unwrap(), "Post one");
    }

    #[tokio::test]
    async fn path_like_keys_stay_inside_the_posts_directory() {
        let dir = tempfile::tempdir().unwrap();
        let reply = r#"{"../escaped": "nope", "facebook_1": "fine"}"#;
        let repurposer = ContentRepurposer::new(dir.path(), FakeVideo::default())
            .with_generator(Some(FixedGenerator(Ok(reply.into()))));
        let info = VideoInfo {
            id: "abc".into(),
            title: "Shed".into(),
            ..Default::default()
        };

        let paths = repurposer.create_social_media_posts(&info, &[]).await.unwrap();
        let posts_dir = dir.path().join("posts/abc");
        assert!(paths.values().all(|p| p.parent() == Some(posts_dir.as_path())));
        assert!(!dir.path().join("posts/escaped.txt").exists());
        assert_eq!(paths["escaped"], posts_dir.join("abc_escaped.txt"));
    }

    #[tokio::test]
    async fn unusable_reply_falls_back_to_templates() {
        let dir = tempfile::tempdir().unwrap();
        let repurposer = ContentRepurposer::new(dir.path(), FakeVideo::default())
            .with_generator(Some(FixedGenerator(Ok("I cannot help with that.".into()))));
        let info = VideoInfo {
            id: "abc".into(),
            title: "Shed".into(),
            ..Default::default()
        };

        let paths = repurposer.create_social_media_posts(&info, &[]).await.unwrap();
        assert_eq!(paths.len(), 6);
    }
}
