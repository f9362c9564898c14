use std::path::PathBuf;

use anyhow::Context;
use clipcast_media::VideoProcessor;
use itertools::Itertools;

use crate::{
    content::{
        text::{split_sentences, transcript_text},
        ContentRepurposer,
    },
    llm::{
        generator::{GenerationRequest, TextGenerator},
        prompts, tokens,
    },
    yt::{TranscriptEntry, VideoInfo},
};

const SUMMARY_CHARS: usize = 500;
const SENTENCES_PER_PARAGRAPH: usize = 3;
const MAX_PARAGRAPHS: usize = 10;
const PROMPT_HEADROOM_TOKENS: usize = 1_000;

impl<G, V> ContentRepurposer<G, V>
where
    G: TextGenerator + Send + Sync,
    V: VideoProcessor + Send + Sync,
{
    /// Writes `blogs/<id>/<id>_blog.md`, generated by the model when one is
    /// configured and extracted from the transcript otherwise
    #[tracing::instrument(skip_all, fields(video_id = %info.id))]
    pub async fn create_blog_post(
        &self,
        info: &VideoInfo,
        transcript: &[TranscriptEntry],
    ) -> anyhow::Result<PathBuf> {
        let text = transcript_text(transcript);

        let generated = match &self.generator {
            Some(generator) => {
                let limit = G::CONTEXT_WINDOW_LIMIT.saturating_sub(PROMPT_HEADROOM_TOKENS);
                let request = blog_request(info, &tokens::truncate_to_tokens(&text, limit));
                generator
                    .generate(request)
                    .await
                    .inspect_err(|e| tracing::error!(error = ?e, "Error generating blog post"))
                    .ok()
                    .map(|g| g.text)
                    .filter(|t| !t.trim().is_empty())
            }
            None => None,
        };

        let content = generated.unwrap_or_else(|| extractive_blog(info, &text));

        let path = self
            .artifact_dir("blogs", &info.id)?
            .join(format!("{}_blog.md", info.id));
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(path = %path.display(), "Blog post created");
        Ok(path)
    }
}

pub fn blog_request(info: &VideoInfo, transcript: &str) -> GenerationRequest {
    GenerationRequest::new(
        prompts::BLOG_SYSTEM,
        format!(
            "Create a well-structured blog post based on this YouTube video titled '{}'. \
             Here's the transcript: {transcript}\n\n\
             Include an introduction, main points with headings, and a conclusion.",
            info.title
        ),
    )
}

/// Markdown post assembled from the transcript alone
pub fn extractive_blog(info: &VideoInfo, transcript: &str) -> String {
    let mut out = format!("# {}\n\n", info.title);
    out.push_str(&format!(
        "*Published by {} on {}*\n\n",
        info.channel_title.as_deref().unwrap_or("YouTube Channel"),
        info.published_at.as_deref().unwrap_or("Unknown Date"),
    ));

    let summary = transcript.chars().take(SUMMARY_CHARS).collect::<String>();
    out.push_str(&format!("## Introduction\n\n{summary}...\n\n"));

    out.push_str("## Main Content\n\n");
    let sentences = split_sentences(transcript);
    let paragraphs = sentences
        .chunks(SENTENCES_PER_PARAGRAPH)
        .map(|chunk| chunk.iter().join(" "))
        .take(MAX_PARAGRAPHS);
    for (i, paragraph) in paragraphs.enumerate() {
        if i % 3 == 0 {
            out.push_str(&format!("### Part {}\n\n", i / 3 + 1));
        }
        out.push_str(&paragraph);
        out.push_str("\n\n");
    }

    out.push_str("## Conclusion\n\n");
    out.push_str(&format!(
        "This article was created based on a YouTube video titled '{}'. \
         For more details, please watch the original video on YouTube.\n\n",
        info.title
    ));
    out
}
