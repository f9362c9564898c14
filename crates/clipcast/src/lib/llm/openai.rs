use std::path::{Path, PathBuf};

use clipcast_media::AudioProcessor;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};

use crate::llm::{
    generator::{GeneratedText, GenerationRequest, TextGenerator},
    transcriber::{AudioInput, TranscribeResponse, Transcriber},
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";
const TEMPERATURE: f32 = 0.7;

/// Whisper transcription and chat completions over the OpenAI HTTP API.
///
/// Requests are sent once; uploads are not safe to replay.
#[derive(Debug, Clone)]
pub struct OpenAIClient<F: AudioProcessor> {
    client: Client,
    api_key: String,
    ffmpeg: F,
    base_url: String,
    model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
    #[error("Empty completion returned by the model")]
    EmptyCompletion,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice, if it has any
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

async fn check_status(resp: Response) -> Result<Response, OpenAIError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(OpenAIError::Api {
        status: status.as_u16(),
        message,
    })
}

impl<F: AudioProcessor> OpenAIClient<F> {
    pub fn new(api_key: impl Into<String>, ffmpeg: F) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_COMPLETION_MODEL.into(),
            ffmpeg,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the chat completion model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Uploads one audio file to `/audio/transcriptions` and asks for
    /// segment timestamps. `prompt` carries context from the previous chunk.
    pub async fn send_transcribe_request(
        &self,
        audio_path: &Path,
        model_name: &str,
        prompt: Option<&str>,
    ) -> Result<TranscribeResponse, OpenAIError> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(audio_mime(audio_path))?;

        let mut form = multipart::Form::new()
            .text("model", model_name.to_string())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", part);
        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt.to_string());
        }

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Transcription request failed"))?;

        Ok(check_status(resp).await?.json().await?)
    }

    pub async fn send_completion_request(
        &self,
        model_name: &str,
        system_content: &str,
        user_content: &str,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = ChatRequest {
            model: model_name,
            temperature: TEMPERATURE,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_content,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Completion request failed"))?;

        Ok(check_status(resp).await?.json().await?)
    }

    /// Splits `file_path` into chunks unless `chunks_dir_path` already holds some
    fn ensure_chunks(
        &self,
        file_path: &Path,
        chunks_dir_path: &Path,
        chunk_duration_seconds: u16,
    ) -> Result<Vec<PathBuf>, OpenAIError> {
        let has_chunks = std::fs::read_dir(chunks_dir_path)
            .map(|mut entries| entries.any(|e| e.is_ok()))
            .unwrap_or(false);

        if !has_chunks {
            std::fs::create_dir_all(chunks_dir_path)?;
            let stem = file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| OpenAIError::Ffmpeg("Invalid file path".into()))?;

            tracing::info!(chunk_duration_seconds, "Splitting audio into chunks");
            self.ffmpeg
                .split_audio_to_chunks(
                    file_path,
                    chunk_duration_seconds,
                    chunks_dir_path.join(format!("{stem}_%03d.mp3")),
                )
                .inspect_err(|e| tracing::error!(error = %e, "Failed to split audio into chunks"))
                .map_err(|e| OpenAIError::Ffmpeg(e.to_string()))?;
        }

        let mut chunks = std::fs::read_dir(chunks_dir_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect::<Vec<_>>();
        chunks.sort();
        Ok(chunks)
    }
}

fn audio_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("webm") => "audio/webm",
        Some("ogg") => "audio/ogg",
        _ => "audio/mpeg",
    }
}

/// Joins per-chunk transcriptions, shifting each chunk's segments by its
/// position in the source audio
fn merge_chunks(responses: Vec<TranscribeResponse>, chunk_secs: f64) -> TranscribeResponse {
    let mut merged = TranscribeResponse {
        duration: 0.0,
        text: String::new(),
        segments: Some(Vec::new()),
    };

    for (i, response) in responses.into_iter().enumerate() {
        let offset = i as f64 * chunk_secs;
        merged.duration += response.duration;

        if !merged.text.is_empty() {
            merged.text.push(' ');
        }
        merged.text.push_str(response.text.trim());

        if let (Some(all), Some(segments)) = (merged.segments.as_mut(), response.segments) {
            all.extend(segments.into_iter().map(|mut seg| {
                seg.start += offset;
                seg.end += offset;
                seg
            }));
        }
    }

    merged
}

impl<F: AudioProcessor + Send + Sync> Transcriber for OpenAIClient<F> {
    const TRANSCRIBER_MODEL: &'static str = "whisper-1";
    type Error = OpenAIError;

    #[tracing::instrument(skip(self))]
    async fn transcribe(&self, input: AudioInput) -> Result<TranscribeResponse, Self::Error> {
        let (file_path, chunks_dir_path, chunk_duration_seconds) = match input {
            AudioInput::File(path) => {
                return self
                    .send_transcribe_request(&path, Self::TRANSCRIBER_MODEL, None)
                    .await;
            }
            AudioInput::Chunked {
                file_path,
                chunks_dir_path,
                chunk_duration_seconds,
            } => (file_path, chunks_dir_path, chunk_duration_seconds),
        };

        let chunks = self.ensure_chunks(&file_path, &chunks_dir_path, chunk_duration_seconds)?;

        let mut responses: Vec<TranscribeResponse> = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let prompt = responses.last().map(|r| r.text.as_str());
            tracing::info!(chunk = i + 1, total = chunks.len(), "Transcribing chunk");
            let response = self
                .send_transcribe_request(chunk, Self::TRANSCRIBER_MODEL, prompt)
                .await
                .inspect_err(|e| tracing::error!(error = %e, chunk = %chunk.display(), "Failed to transcribe chunk"))?;
            responses.push(response);
        }

        Ok(merge_chunks(responses, f64::from(chunk_duration_seconds)))
    }
}

impl<F: AudioProcessor + Send + Sync> TextGenerator for OpenAIClient<F> {
    const GENERATION_MODEL: &'static str = DEFAULT_COMPLETION_MODEL;
    type Error = OpenAIError;

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, Self::Error> {
        let response = self
            .send_completion_request(&self.model, &request.system, &request.user)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to generate content"))?;

        let text = response.into_text().ok_or(OpenAIError::EmptyCompletion)?;
        Ok(GeneratedText { text })
    }
}
