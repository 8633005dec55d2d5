use serde_json::json;

use crate::{
    error::{PostforgeError, Result},
    models::{ImageGenerationRequest, PredictResponse},
};

#[derive(Clone)]
pub struct ImageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
}

impl ImageClient {
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

    /// Generate one PNG image, returned as its base64 encoding.
    pub async fn generate(&self, request: ImageGenerationRequest) -> Result<String> {
        let model_id = request.model_id.as_deref().unwrap_or(&self.default_model);

        let payload = json!({
            "instances": [
                { "prompt": request.prompt }
            ],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": request.aspect_ratio.as_str(),
                "outputMimeType": "image/png"
            }
        });

        log::info!(
            "Generating image with model: {} (aspect ratio {})",
            model_id,
            request.aspect_ratio.as_str()
        );

        let url = format!("{}/v1beta/models/{}:predict", self.base_url, model_id);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                PostforgeError::Request(format!("image generation request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Image generation returned {}: {}", status, body);
            return Err(PostforgeError::Response(format!(
                "image generation returned status {}",
                status
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| PostforgeError::Response(e.to_string()))?;

        parsed
            .first_image()
            .map(str::to_string)
            .ok_or_else(|| PostforgeError::Response("no image was generated".into()))
    }
}
