use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TextGenerationRequest {
    pub prompt: String,
    pub model_id: Option<String>,
    pub temperature: Option<f32>,
}

/// Response shape of the `generateContent` endpoint. The same envelope
/// carries text parts and inline binary parts (speech audio).
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
    #[serde(rename = "inlineData")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub data: String,
}

impl GenerateContentResponse {
    /// First text part of the first candidate, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.text.as_deref())
    }

    /// First inline data payload of the first candidate, if any.
    pub fn first_inline_data(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.inline_data.as_ref().map(|d| d.data.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_text_part() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_text(), Some("hello"));
        assert_eq!(response.first_inline_data(), None);
    }

    #[test]
    fn extracts_inline_data() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/pcm","data":"AAEC"}}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_inline_data(), Some("AAEC"));
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(response.first_text(), None);
        assert_eq!(response.first_inline_data(), None);
    }
}
