use std::fmt;

use crate::Tool;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{} not found; install it or set {}", .0, .0.env_override())]
    ToolNotFound(Tool),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: Tool,
        status: String,
        stderr: String,
    },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Coarse reason a download failed, derived from yt-dlp's stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFailure {
    Blocked,
    AgeRestricted,
    GeoRestricted,
    Unavailable,
    Other,
}

impl MediaError {
    pub fn classify(&self) -> DownloadFailure {
        let MediaError::CommandFailed { stderr, .. } = self else {
            return DownloadFailure::Other;
        };
        DownloadFailure::from_stderr(stderr)
    }
}

/// yt-dlp phrasings for region locks
const GEO_MARKERS: &[&str] = &[
    "available in your country",
    "geo restriction",
    "geo-restriction",
    "geo restricted",
    "geo-restricted",
    "georestricted",
    "geo-blocked",
    "geoblocked",
];

impl DownloadFailure {
    pub fn from_stderr(stderr: &str) -> Self {
        let s = stderr.to_lowercase();

        if s.contains("sign in to confirm your age") || s.contains("age-restricted") {
            return Self::AgeRestricted;
        }
        if GEO_MARKERS.iter().any(|marker| s.contains(marker)) {
            return Self::GeoRestricted;
        }
        if s.contains("429")
            || s.contains("not a bot")
            || s.contains("blocked")
            || s.contains("403")
        {
            return Self::Blocked;
        }
        if s.contains("video unavailable") || s.contains("private video") {
            return Self::Unavailable;
        }
        Self::Other
    }

    /// Extra guidance for the operator, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::AgeRestricted => Some(
                "This video may be age-restricted. Try logging in to YouTube and exporting cookies.txt.",
            ),
            Self::GeoRestricted => {
                Some("This video may be geographically restricted. Try using a VPN or proxy.")
            }
            Self::Blocked => {
                Some("YouTube is throttling requests from this address. Rotate proxies or wait.")
            }
            Self::Unavailable | Self::Other => None,
        }
    }
}

impl fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Blocked => "blocked",
            Self::AgeRestricted => "age-restricted",
            Self::GeoRestricted => "geo-restricted",
            Self::Unavailable => "unavailable",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}
