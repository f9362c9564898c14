use std::{fmt::Debug, future::Future, path::PathBuf};

use serde::Deserialize;

use crate::yt::TranscriptEntry;

pub trait Transcriber {
    const TRANSCRIBER_MODEL: &'static str;

    type Error: Debug;

    fn transcribe(
        &self,
        audio_input: AudioInput,
    ) -> impl Future<Output = Result<TranscribeResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub enum AudioInput {
    Chunked {
        chunk_duration_seconds: u16,
        chunks_dir_path: PathBuf,
        file_path: PathBuf,
    },
    File(PathBuf),
}

#[derive(Debug, Deserialize)]
pub struct TranscribeResponse {
    pub duration: f64,
    pub text: String,
    pub segments: Option<Vec<TranscribeSegment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscribeResponse {
    /// Segments as transcript entries; a response without segments becomes a
    /// single entry spanning the whole duration
    pub fn into_entries(self) -> Vec<TranscriptEntry> {
        match self.segments {
            Some(segments) if !segments.is_empty() => segments
                .into_iter()
                .filter_map(|seg| {
                    let text = seg.text.trim();
                    (!text.is_empty()).then(|| TranscriptEntry {
                        text: text.to_string(),
                        start: seg.start,
                        duration: (seg.end - seg.start).max(0.0),
                    })
                })
                .collect(),
            _ if self.text.trim().is_empty() => Vec::new(),
            _ => vec![TranscriptEntry {
                text: self.text.trim().to_string(),
                start: 0.0,
                duration: self.duration,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> TranscribeSegment {
        TranscribeSegment {
            start,
            end,
            text: text.into(),
        }
    }

    #[test]
    fn segments_become_entries() {
        let resp = TranscribeResponse {
            duration: 20.0,
            text: "Hello there. General remarks.".into(),
            segments: Some(vec![
                segment(0.0, 4.5, " Hello there. "),
                segment(4.5, 5.0, "  "),
                segment(5.0, 20.0, "General remarks."),
            ]),
        };

        let entries = resp.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Hello there.");
        assert_eq!(entries[0].duration, 4.5);
        assert_eq!(entries[1].start, 5.0);
        assert_eq!(entries[1].duration, 15.0);
    }

    #[test]
    fn text_only_response_is_one_entry() {
        let resp = TranscribeResponse {
            duration: 42.0,
            text: "Only text".into(),
            segments: None,
        };
        let entries = resp.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration, 42.0);

        let empty = TranscribeResponse {
            duration: 1.0,
            text: " ".into(),
            segments: Some(Vec::new()),
        };
        assert!(empty.into_entries().is_empty());
    }
}
