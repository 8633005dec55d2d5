use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{PostforgeError, Result};

/// Aspect ratios supported by the image generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Square,
    Wide,
    Tall,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
        }
    }
}

/// Corner anchor for the logo overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// An immutable, PNG-encoded image with on-demand pixel access.
///
/// Created either from remote generation (base64 payload) or from a local
/// upload (raw bytes). Compositing produces a new asset; inputs are never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data: Vec<u8>,
}

impl ImageAsset {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let data = BASE64
            .decode(encoded)
            .map_err(|e| PostforgeError::AssetLoad(format!("invalid base64 image data: {}", e)))?;
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Decode the encoded bytes into a pixel buffer.
    pub fn decode(&self) -> Result<image::DynamicImage> {
        image::load_from_memory(&self.data)
            .map_err(|e| PostforgeError::AssetLoad(format!("failed to decode image: {}", e)))
    }

    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let img = self.decode()?;
        Ok((img.width(), img.height()))
    }
}

/// One post-generation request, assembled by the presentation layer.
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub topic: String,
    pub audience: String,
    pub aspect_ratio: AspectRatio,
    pub image_description: Option<String>,
    pub image_text_overlay: Option<String>,
    pub logo: Option<ImageAsset>,
    pub logo_position: LogoPosition,
}

impl PostRequest {
    pub fn new(topic: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            audience: audience.into(),
            aspect_ratio: AspectRatio::Square,
            image_description: None,
            image_text_overlay: None,
            logo: None,
            logo_position: LogoPosition::BottomRight,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_image_description(mut self, description: impl Into<String>) -> Self {
        self.image_description = Some(description.into());
        self
    }

    pub fn with_image_text_overlay(mut self, overlay: impl Into<String>) -> Self {
        self.image_text_overlay = Some(overlay.into());
        self
    }

    pub fn with_logo(mut self, logo: ImageAsset, position: LogoPosition) -> Self {
        self.logo = Some(logo);
        self.logo_position = position;
        self
    }

    /// Topic and audience must both be non-blank before any remote call.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() || self.audience.trim().is_empty() {
            return Err(PostforgeError::Validation(
                "both a topic and a target audience are required".into(),
            ));
        }
        Ok(())
    }
}

/// The text + image pair produced by one orchestration run.
///
/// Built whole on success and replaced wholesale on the next request; a
/// failed run never yields a partially populated post.
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    pub request_id: u64,
    pub description: String,
    pub image: Option<ImageAsset>,
}

impl GeneratedPost {
    pub fn image_base64(&self) -> Option<String> {
        self.image.as_ref().map(|asset| asset.to_base64())
    }
}
