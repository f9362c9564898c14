use std::{fmt::Debug, future::Future};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    pub text: String,
}

pub trait TextGenerator {
    /// Prompt budget in tokens, leaving room for the completion
    const CONTEXT_WINDOW_LIMIT: usize = 16_385 - 4_096;
    const GENERATION_MODEL: &'static str;

    type Error: Debug;

    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<GeneratedText, Self::Error>> + Send;
}
