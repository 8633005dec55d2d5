use serde_json::json;

use crate::{
    error::{PostforgeError, Result},
    models::{GenerateContentResponse, TextGenerationRequest},
};

#[derive(Clone)]
pub struct TextClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
}

impl TextClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        default_model: String,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            default_model,
        }
    }

    pub async fn generate(&self, request: TextGenerationRequest) -> Result<String> {
        let model_id = request.model_id.as_deref().unwrap_or(&self.default_model);

        let payload = json!({
            "contents": [
                {
                    "parts": [
                        { "text": request.prompt }
                    ]
                }
            ],
            "generationConfig": {
                "temperature": request.temperature.unwrap_or(0.7)
            }
        });

        log::info!("Invoking text model: {}", model_id);
        log::debug!(
            "Text generation payload: {}",
            serde_json::to_string(&payload)
                .map_err(|e| PostforgeError::Serialization(e.to_string()))?
        );

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
            .map_err(|e| PostforgeError::Request(format!("text generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Text generation returned {}: {}", status, body);
            return Err(PostforgeError::Response(format!(
                "text generation returned status {}",
                status
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PostforgeError::Response(e.to_string()))?;

        parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| PostforgeError::Response("no text candidates returned".into()))
    }
}
