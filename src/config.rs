use std::env;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_PROMPT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";

#[derive(Debug, Clone, Default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub prompt_model: Option<String>,
    pub image_model: Option<String>,
    pub speech_model: Option<String>,
    pub voice: Option<String>,
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        GeminiConfig {
            api_key: env::var("GEMINI_API_KEY").ok(),
            base_url: env::var("GEMINI_BASE_URL").ok(),
            text_model: env::var("GEMINI_TEXT_MODEL").ok(),
            prompt_model: env::var("GEMINI_PROMPT_MODEL").ok(),
            image_model: env::var("GEMINI_IMAGE_MODEL").ok(),
            speech_model: env::var("GEMINI_SPEECH_MODEL").ok(),
            voice: env::var("GEMINI_VOICE").ok(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = Some(model.into());
        self
    }

    pub fn with_prompt_model(mut self, model: impl Into<String>) -> Self {
        self.prompt_model = Some(model.into());
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }

    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = Some(model.into());
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL)
    }

    pub fn prompt_model(&self) -> &str {
        self.prompt_model.as_deref().unwrap_or(DEFAULT_PROMPT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn speech_model(&self) -> &str {
        self.speech_model.as_deref().unwrap_or(DEFAULT_SPEECH_MODEL)
    }

    pub fn voice(&self) -> &str {
        self.voice.as_deref().unwrap_or(DEFAULT_VOICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = GeminiConfig::new();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.text_model(), DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_model(), DEFAULT_IMAGE_MODEL);
        assert_eq!(config.voice(), DEFAULT_VOICE);
    }

    #[test]
    fn builders_override_defaults() {
        let config = GeminiConfig::new()
            .with_api_key("test-key")
            .with_base_url("http://localhost:8080")
            .with_text_model("gemini-exp")
            .with_voice("Puck");
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.text_model(), "gemini-exp");
        assert_eq!(config.voice(), "Puck");
        // untouched fields keep their defaults
        assert_eq!(config.prompt_model(), DEFAULT_PROMPT_MODEL);
    }
}
