//! Request disguise for scraping: rotating user agents, rotating proxies and
//! randomised pacing between requests.

use std::{path::Path, sync::Mutex, time::Duration};

use anyhow::Context;
use clipcast_media::DownloadOptions;
use rand::{seq::SliceRandom, Rng};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::config::{Settings, MAX_DELAY_SECS};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

const MAX_RETRIES: u32 = 3;

#[derive(Debug)]
pub struct Stealth {
    user_agents: Vec<String>,
    proxies: Vec<String>,
    delay_min: f64,
    delay_max: f64,
    rotate_user_agents: bool,
    rotate_proxies: bool,
    current_proxy: Mutex<Option<String>>,
}

impl Stealth {
    pub fn new(settings: &Settings) -> Self {
        let proxies = if settings.proxy_rotation {
            load_proxies(&settings.proxy_list_path)
        } else {
            Vec::new()
        };
        tracing::info!(count = proxies.len(), "Loaded proxies");

        Self {
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            proxies,
            delay_min: bounded_delay(settings.delay_min),
            delay_max: bounded_delay(settings.delay_max),
            rotate_user_agents: settings.user_agent_rotation,
            rotate_proxies: settings.proxy_rotation,
            current_proxy: Mutex::new(None),
        }
    }

    /// No proxies, no delays, fixed user agent
    pub fn disabled() -> Self {
        Self {
            user_agents: vec![USER_AGENTS[0].to_string()],
            proxies: Vec::new(),
            delay_min: 0.0,
            delay_max: 0.0,
            rotate_user_agents: false,
            rotate_proxies: false,
            current_proxy: Mutex::new(None),
        }
    }

    pub fn with_proxies(mut self, proxies: Vec<String>) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    pub fn random_delay(&self) -> Duration {
        let secs = if self.delay_max > self.delay_min {
            rand::thread_rng().gen_range(self.delay_min..=self.delay_max)
        } else {
            self.delay_min
        };
        Duration::try_from_secs_f64(secs).unwrap_or_default()
    }

    pub async fn pause(&self) {
        let delay = self.random_delay();
        if !delay.is_zero() {
            tracing::debug!(?delay, "Pausing before request");
            tokio::time::sleep(delay).await;
        }
    }

    pub fn rotate_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(USER_AGENTS[0])
    }

    pub fn rotate_proxy(&self) -> Option<String> {
        if !self.rotate_proxies {
            return None;
        }
        let proxy = self.proxies.choose(&mut rand::thread_rng()).cloned()?;
        *self
            .current_proxy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(proxy.clone());
        Some(proxy)
    }

    pub fn current_proxy(&self) -> Option<String> {
        self.current_proxy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        if self.rotate_user_agents {
            if let Ok(ua) = HeaderValue::from_str(self.rotate_user_agent()) {
                headers.insert(header::USER_AGENT, ua);
            }
        }
        headers
    }

    /// Network options for the next yt-dlp invocation; rotates the proxy
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            proxy: self.rotate_proxy().map(|p| normalize_proxy(&p)),
            user_agent: self
                .rotate_user_agents
                .then(|| self.rotate_user_agent().to_string()),
        }
    }

    /// Builds a retrying HTTP client with rotated headers and proxy
    pub fn http_client(&self) -> anyhow::Result<ClientWithMiddleware> {
        let mut builder = reqwest::Client::builder()
            .default_headers(self.request_headers())
            .timeout(Duration::from_secs(30));

        if let Some(proxy) = self.rotate_proxy() {
            let proxy = reqwest::Proxy::all(normalize_proxy(&proxy))
                .with_context(|| format!("Invalid proxy address: {proxy}"))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);

        Ok(ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build())
    }
}

fn bounded_delay(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, MAX_DELAY_SECS)
    }
}

/// One proxy per line; blank lines are skipped, a missing file yields none
pub fn load_proxies(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No proxy list found");
            Vec::new()
        }
        Err(e) => {
            tracing::error!(error = ?e, path = %path.display(), "Error loading proxies");
            Vec::new()
        }
    }
}

/// Adds an `http://` scheme to bare `host:port` proxies
pub fn normalize_proxy(raw: &str) -> String {
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    }
}
