pub mod image_client;
pub mod speech_client;
pub mod text_client;

use async_trait::async_trait;

use crate::{
    backend::GenerativeBackend,
    config::GeminiConfig,
    error::{PostforgeError, Result},
    models::{AspectRatio, ImageGenerationRequest, SpeechSynthesisRequest, TextGenerationRequest},
};

pub use image_client::ImageClient;
pub use speech_client::SpeechClient;
pub use text_client::TextClient;

/// Client for a Gemini-style generative-AI REST API, aggregating one wire
/// client per modality.
#[derive(Clone)]
pub struct GeminiClient {
    text_client: TextClient,
    image_client: ImageClient,
    speech_client: SpeechClient,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PostforgeError::Config("Gemini API key is required".into()))?;

        let http = reqwest::Client::new();
        let base_url = config.base_url().to_string();

        Ok(Self {
            text_client: TextClient::new(
                http.clone(),
                base_url.clone(),
                api_key.clone(),
                config.text_model().to_string(),
            ),
            image_client: ImageClient::new(
                http.clone(),
                base_url.clone(),
                api_key.clone(),
                config.image_model().to_string(),
            ),
            speech_client: SpeechClient::new(
                http,
                base_url,
                api_key,
                config.speech_model().to_string(),
                config.voice().to_string(),
            ),
            config,
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn speech(&self) -> &SpeechClient {
        &self.speech_client
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.text_client
            .generate(TextGenerationRequest {
                prompt: prompt.to_string(),
                model_id: None,
                temperature: None,
            })
            .await
    }

    async fn derive_image_prompt(&self, prompt: &str) -> Result<String> {
        // Prompt derivation runs on the lighter model.
        self.text_client
            .generate(TextGenerationRequest {
                prompt: prompt.to_string(),
                model_id: Some(self.config.prompt_model().to_string()),
                temperature: None,
            })
            .await
    }

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String> {
        self.image_client
            .generate(ImageGenerationRequest {
                prompt: prompt.to_string(),
                aspect_ratio,
                model_id: None,
            })
            .await
    }

    async fn generate_speech(&self, text: &str) -> Result<String> {
        self.speech_client
            .synthesize(SpeechSynthesisRequest {
                text: text.to_string(),
                voice: None,
                model_id: None,
            })
            .await
    }
}
