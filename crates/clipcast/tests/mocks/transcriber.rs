use std::sync::{Arc, Mutex};

use clipcast::{
    llm::transcriber::TranscribeSegment, AudioInput, TranscribeResponse, Transcriber,
};

#[derive(Clone)]
pub struct MockTranscriber {
    pub segments: Vec<(f64, f64, String)>,
    pub calls: Arc<Mutex<Vec<AudioInput>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriber {
    pub fn new(segments: &[(f64, f64, &str)]) -> Self {
        Self {
            segments: segments
                .iter()
                .map(|(start, end, text)| (*start, *end, text.to_string()))
                .collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            segments: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Transcriber for MockTranscriber {
    const TRANSCRIBER_MODEL: &'static str = "mock-whisper";
    type Error = anyhow::Error;

    async fn transcribe(&self, audio_input: AudioInput) -> Result<TranscribeResponse, Self::Error> {
        self.calls.lock().unwrap().push(audio_input);
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(TranscribeResponse {
            duration: self.segments.last().map(|s| s.1).unwrap_or_default(),
            text: self
                .segments
                .iter()
                .map(|s| s.2.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            segments: Some(
                self.segments
                    .iter()
                    .map(|(start, end, text)| TranscribeSegment {
                        start: *start,
                        end: *end,
                        text: text.clone(),
                    })
                    .collect(),
            ),
        })
    }
}
