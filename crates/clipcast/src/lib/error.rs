#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(&'static str),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not extract video ID from URL: {0}")]
    InvalidVideoUrl(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
