use serde::{Deserialize, Serialize};

use crate::models::post::AspectRatio;

#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub model_id: Option<String>,
}

/// Response shape of the `:predict` image endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "bytesBase64Encoded")]
    pub bytes_base64_encoded: Option<String>,
}

impl PredictResponse {
    pub fn first_image(&self) -> Option<&str> {
        self.predictions
            .iter()
            .find_map(|p| p.bytes_base64_encoded.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_prediction() {
        let response: PredictResponse =
            serde_json::from_str(r#"{"predictions":[{"bytesBase64Encoded":"aGk="}]}"#).unwrap();
        assert_eq!(response.first_image(), Some("aGk="));
    }

    #[test]
    fn empty_predictions_yield_nothing() {
        let response: PredictResponse = serde_json::from_str(r#"{"predictions":[]}"#).unwrap();
        assert_eq!(response.first_image(), None);
    }
}
