use async_trait::async_trait;

use crate::error::Result;
use crate::models::AspectRatio;

/// The three remote operations the core depends on.
///
/// `GeminiClient` is the production implementation; tests substitute mocks
/// through this seam.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Generate free-form text from a prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Derive an image-generation prompt from a descriptive request.
    ///
    /// Defaults to plain text generation; implementations may route this to
    /// a cheaper model.
    async fn derive_image_prompt(&self, prompt: &str) -> Result<String> {
        self.generate_text(prompt).await
    }

    /// Generate one image from a prompt, returned as base64-encoded PNG.
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String>;

    /// Synthesize speech for the given text, returned as base64-encoded
    /// 16-bit little-endian PCM at 24 kHz mono.
    async fn generate_speech(&self, text: &str) -> Result<String>;
}
