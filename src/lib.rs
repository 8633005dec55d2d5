pub mod backend;
pub mod compositor;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod playback;

pub use backend::GenerativeBackend;
pub use config::GeminiConfig;
pub use error::{PostforgeError, Result};
pub use gemini::{GeminiClient, ImageClient, SpeechClient, TextClient};
pub use models::{
    AspectRatio, GeneratedPost, ImageAsset, LogoPosition, PostRequest,
};
pub use orchestrator::Orchestrator;
pub use playback::SpeechPlayer;
