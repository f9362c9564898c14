//! Runtime settings.
//!
//! Values come from the CLI/environment first. A JSON settings file may then
//! override the non-secret fields; secrets are never read from or written to
//! that file.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credentials, kept out of serialized settings
#[derive(Clone, Default)]
pub struct Secrets {
    pub youtube_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub facebook_access_token: Option<String>,
    pub instagram_access_token: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Secrets")
            .field("youtube_api_key", &redact(&self.youtube_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("facebook_access_token", &redact(&self.facebook_access_token))
            .field("instagram_access_token", &redact(&self.instagram_access_token))
            .finish()
    }
}

/// Target frame sizes per platform surface, `(width, height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeDims {
    pub instagram_story: (u32, u32),
    pub instagram_post: (u32, u32),
    pub facebook_story: (u32, u32),
    pub facebook_post: (u32, u32),
}

impl Default for ResizeDims {
    fn default() -> Self {
        Self {
            instagram_story: (1080, 1920),
            instagram_post: (1080, 1080),
            facebook_story: (1080, 1920),
            facebook_post: (1200, 630),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(skip)]
    pub secrets: Secrets,

    pub download_path: PathBuf,
    pub output_path: PathBuf,
    pub proxy_list_path: PathBuf,
    pub cookies_path: Option<PathBuf>,
    pub blog_template_path: PathBuf,

    pub user_agent_rotation: bool,
    pub proxy_rotation: bool,
    /// seconds
    pub delay_min: f64,
    /// seconds
    pub delay_max: f64,

    pub resize_dims: ResizeDims,
    pub region_code: String,

    pub facebook_page_id: Option<String>,
    pub instagram_user_id: Option<String>,
    /// Public URL prefix under which the output directory is served
    pub instagram_media_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secrets: Secrets::default(),
            download_path: PathBuf::from("./downloads"),
            output_path: PathBuf::from("./output"),
            proxy_list_path: PathBuf::from("./proxies.txt"),
            cookies_path: None,
            blog_template_path: PathBuf::from("./templates/blog_template.html"),
            user_agent_rotation: true,
            proxy_rotation: true,
            delay_min: 3.0,
            delay_max: 10.0,
            resize_dims: ResizeDims::default(),
            region_code: "US".into(),
            facebook_page_id: None,
            instagram_user_id: None,
            instagram_media_base_url: None,
        }
    }
}

/// Subdirectories created under the output path
/// Upper bound for either request delay, in seconds
pub const MAX_DELAY_SECS: f64 = 3600.0;

pub const OUTPUT_KINDS: &[&str] = &[
    "blogs",
    "shorts",
    "posts",
    "audio",
    "transcripts",
    "metadata",
    "thumbnails",
    "schedules",
];

impl Settings {
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.download_path).with_context(|| {
            format!(
                "Failed to create download dir {}",
                self.download_path.display()
            )
        })?;
        for kind in OUTPUT_KINDS {
            let dir = self.output_path.join(kind);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output dir {}", dir.display()))?;
        }
        Ok(())
    }

    /// Writes the non-secret settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Merges a JSON settings file over the current values.
    ///
    /// A missing or malformed file leaves the settings untouched.
    pub fn load_overrides(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Config file not found. Using default config.");
                return;
            }
            Err(e) => {
                tracing::error!(error = ?e, path = %path.display(), "Failed to read config file. Using default config.");
                return;
            }
        };

        let patch = match serde_json::from_str::<Value>(&raw) {
            Ok(patch) => patch,
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Error parsing config file. Using default config.");
                return;
            }
        };

        if let Err(e) = self.update(patch) {
            tracing::error!(error = ?e, path = %path.display(), "Config file has invalid values. Using default config.");
        }
    }

    /// Applies a partial JSON object; unknown keys are ignored
    pub fn update(&mut self, patch: Value) -> anyhow::Result<()> {
        let Value::Object(patch) = patch else {
            anyhow::bail!("Settings patch must be a JSON object");
        };

        let mut current = serde_json::to_value(&*self)?;
        if let Value::Object(fields) = &mut current {
            for (key, value) in patch {
                if fields.contains_key(&key) {
                    fields.insert(key, value);
                } else {
                    tracing::debug!(%key, "Ignoring unknown settings key");
                }
            }
        }

        let secrets = self.secrets.clone();
        let mut updated: Settings =
            serde_json::from_value(current).context("Invalid settings values")?;
        updated.secrets = secrets;

        for (name, value) in [("delay_min", updated.delay_min), ("delay_max", updated.delay_max)] {
            if !(0.0..=MAX_DELAY_SECS).contains(&value) {
                anyhow::bail!("{name} ({value}) must be between 0 and {MAX_DELAY_SECS} seconds");
            }
        }
        if updated.delay_min > updated.delay_max {
            anyhow::bail!(
                "delay_min ({}) must not exceed delay_max ({})",
                updated.delay_min,
                updated.delay_max
            );
        }

        *self = updated;
        Ok(())
    }
}
