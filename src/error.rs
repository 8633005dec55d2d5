use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostforgeError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Generation error: {0}")]
    Generation(String),
    #[error("Compositing error: {0}")]
    Compositing(String),
    #[error("Asset load error: {0}")]
    AssetLoad(String),
    #[error("Synthesis error: {0}")]
    Synthesis(String),
    #[error("Playback error: {0}")]
    Playback(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Response error: {0}")]
    Response(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, PostforgeError>;
