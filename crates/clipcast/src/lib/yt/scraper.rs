use std::sync::Arc;

use anyhow::Context;

use crate::{stealth::Stealth, yt::PageFetcher};

/// Fetches pages through a fresh stealth client per request so every
/// request gets its own user agent and proxy
pub struct Scraper {
    stealth: Arc<Stealth>,
}

impl Scraper {
    pub fn new(stealth: Arc<Stealth>) -> Self {
        Self { stealth }
    }
}

impl PageFetcher for Scraper {
    #[tracing::instrument(skip(self))]
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        self.stealth.pause().await;

        let client = self.stealth.http_client()?;
        let text = client
            .get(url)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to make http request"))
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .inspect_err(|e| tracing::warn!(status = ?e.status(), "Page request rejected"))?
            .text()
            .await?;

        Ok(text)
    }
}
