//! Repurposing a scraped video into blog posts, social posts, short clips
//! and thumbnails.
//!
//! Every artifact is written under `<output>/<kind>/<video_id>/`.

pub mod blog;
pub mod shorts;
pub mod social;
pub mod text;
pub mod thumbnail;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clipcast_media::VideoProcessor;

use crate::{
    config::ResizeDims,
    llm::generator::TextGenerator,
    yt::TranscriptEntry,
};

pub struct ContentRepurposer<G, V> {
    output_path: PathBuf,
    generator: Option<G>,
    video: V,
    resize_dims: ResizeDims,
}

impl<G, V> ContentRepurposer<G, V>
where
    G: TextGenerator + Send + Sync,
    V: VideoProcessor + Send + Sync,
{
    pub fn new(output_path: impl Into<PathBuf>, video: V) -> Self {
        Self {
            output_path: output_path.into(),
            generator: None,
            video,
            resize_dims: ResizeDims::default(),
        }
    }

    pub fn with_generator(mut self, generator: Option<G>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_resize_dims(mut self, resize_dims: ResizeDims) -> Self {
        self.resize_dims = resize_dims;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// `<output>/<kind>/<video_id>`, created on demand
    fn artifact_dir(&self, kind: &str, video_id: &str) -> anyhow::Result<PathBuf> {
        let dir = self.output_path.join(kind).join(video_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }

    fn transcript_paths(&self, video_id: &str) -> (PathBuf, PathBuf) {
        let dir = self.output_path.join("transcripts");
        (
            dir.join(format!("{video_id}_transcript.txt")),
            dir.join(format!("{video_id}_transcript.json")),
        )
    }

    /// Writes `[MM:SS] text` lines, plus a JSON copy used when repurposing later
    #[tracing::instrument(skip(self, transcript), fields(entries = transcript.len()))]
    pub fn save_transcript(
        &self,
        video_id: &str,
        transcript: &[TranscriptEntry],
    ) -> anyhow::Result<PathBuf> {
        let (text_path, json_path) = self.transcript_paths(video_id);
        if let Some(dir) = text_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let lines = transcript
            .iter()
            .map(|entry| format!("[{}] {}\n", text::format_timestamp(entry.start), entry.text))
            .collect::<String>();

        std::fs::write(&text_path, lines)
            .with_context(|| format!("Failed to write {}", text_path.display()))?;
        std::fs::write(&json_path, serde_json::to_vec_pretty(transcript)?)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;

        tracing::info!(path = %text_path.display(), "Transcript saved");
        Ok(text_path)
    }

    /// Transcript saved by [`Self::save_transcript`]; empty when none was saved
    pub fn load_transcript(&self, video_id: &str) -> anyhow::Result<Vec<TranscriptEntry>> {
        let (_, json_path) = self.transcript_paths(video_id);
        match std::fs::read(&json_path) {
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("Malformed transcript file {}", json_path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", json_path.display())),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{test_support::*, *};

    #[test]
    fn transcript_is_saved_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let repurposer =
            ContentRepurposer::<FixedGenerator, _>::new(dir.path(), FakeVideo::default());
        let transcript = vec![
            TranscriptEntry {
                text: "Welcome back.".into(),
                start: 0.0,
                duration: 2.0,
            },
            TranscriptEntry {
                text: "Let's build.".into(),
                start: 65.2,
                duration: 3.0,
            },
        ];

        let path = repurposer.save_transcript("abc", &transcript).unwrap();
        assert_eq!(path, dir.path().join("transcripts/abc_transcript.txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[00:00] Welcome back.\n[01:05] Let's build.\n"
        );
        assert_eq!(repurposer.load_transcript("abc").unwrap(), transcript);
        assert!(repurposer.load_transcript("missing").unwrap().is_empty());
    }
}
