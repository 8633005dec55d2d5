use serde_json::json;

use crate::{
    error::{PostforgeError, Result},
    models::{GenerateContentResponse, SpeechSynthesisRequest},
};

#[derive(Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
    default_voice: String,
}

impl SpeechClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        default_model: String,
        default_voice: String,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            default_model,
            default_voice,
        }
    }

    /// Synthesize speech for the given text. Returns base64-encoded signed
    /// 16-bit little-endian PCM at 24 kHz mono.
    pub async fn synthesize(&self, request: SpeechSynthesisRequest) -> Result<String> {
        let model_id = request.model_id.as_deref().unwrap_or(&self.default_model);
        let voice = request.voice.as_deref().unwrap_or(&self.default_voice);

        let payload = json!({
            "contents": [
                {
                    "parts": [
                        { "text": request.text }
                    ]
                }
            ],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice }
                    }
                }
            }
        });

        log::info!("Synthesizing speech with model: {} (voice {})", model_id, voice);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model_id
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                PostforgeError::Request(format!("speech synthesis request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Speech synthesis returned {}: {}", status, body);
            return Err(PostforgeError::Response(format!(
                "speech synthesis returned status {}",
                status
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PostforgeError::Response(e.to_string()))?;

        parsed
            .first_inline_data()
            .map(str::to_string)
            .ok_or_else(|| PostforgeError::Synthesis("no audio data received".into()))
    }
}
