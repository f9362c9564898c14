pub mod config;
pub mod content;
mod error;
pub mod growth;
pub mod llm;
pub mod parser;
mod processor;
pub mod social;
pub mod stealth;
pub mod tracing;
pub mod types;
pub mod yt;

pub use error::Error;
pub use llm::openai;
pub use llm::{
    generator::{GeneratedText, GenerationRequest, TextGenerator},
    transcriber::{AudioInput, TranscribeResponse, Transcriber},
};
pub use processor::{
    builder::ContentPipelineBuilder, ContentPipeline, RepurposeOptions, RepurposeReport,
    ScrapeOptions, ScrapeReport, VideoMetadata,
};
