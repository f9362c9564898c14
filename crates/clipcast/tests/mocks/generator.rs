use std::sync::{Arc, Mutex};

use clipcast::{GeneratedText, GenerationRequest, TextGenerator};

#[derive(Clone)]
pub struct MockGenerator {
    pub reply: String,
    pub calls: Arc<Mutex<Vec<GenerationRequest>>>,
    pub fail_with: Option<String>,
}

impl MockGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            reply: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl TextGenerator for MockGenerator {
    const GENERATION_MODEL: &'static str = "mock-gpt";
    type Error = anyhow::Error;

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, Self::Error> {
        self.calls.lock().unwrap().push(request);
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(GeneratedText {
            text: self.reply.clone(),
        })
    }
}
