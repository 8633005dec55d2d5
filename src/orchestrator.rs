use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    backend::GenerativeBackend,
    compositor,
    error::{PostforgeError, Result},
    logger,
    models::{GeneratedPost, ImageAsset, PostRequest},
};

const DERIVED_PROMPT_PREFIX: &str =
    "A professional, visually appealing image for a LinkedIn post: ";

fn content_prompt(topic: &str, audience: &str) -> String {
    format!(
        "Generate a professional and engaging LinkedIn post.\n\n\
         **Topic:** {}\n\
         **Target Audience:** {}\n\n\
         The post should be:\n\
         - Written in a professional, yet approachable tone.\n\
         - Well-structured, possibly using bullet points or numbered lists for clarity.\n\
         - Include relevant, popular hashtags to increase reach.\n\
         - End with a call-to-action or a question to encourage engagement.\n\
         - Do not include any preamble like \"Here is a LinkedIn post:\". \
         Just provide the post content itself.",
        topic, audience
    )
}

fn derivation_prompt(topic: &str, audience: &str) -> String {
    format!(
        "Based on the following topic and target audience for a LinkedIn post, generate a \
         detailed and creative prompt for an AI image generator.\n\
         The prompt should describe a visually compelling image that is professional, symbolic, \
         and engaging for the specified audience.\n\
         Describe the desired style (e.g., minimalist, photorealistic, abstract), composition, \
         color palette, and mood.\n\
         The final output should be ONLY the prompt itself, without any extra text, labels, or \
         quotation marks.\n\n\
         **Topic:** \"{}\"\n\
         **Target Audience:** {}",
        topic, audience
    )
}

fn fallback_image_prompt(topic: &str, audience: &str) -> String {
    format!(
        "A professional, visually appealing image for a LinkedIn post about \"{}\" targeting {}. \
         The image should be symbolic and abstract, suitable for a corporate audience.",
        topic, audience
    )
}

fn overlay_instruction(overlay: &str) -> String {
    format!(
        " The image must prominently feature the text: \"{}\". The text should be stylish, \
         legible, and well-integrated into the image's composition.",
        overlay
    )
}

/// Sequences and joins the remote calls that produce one post.
pub struct Orchestrator {
    backend: Arc<dyn GenerativeBackend>,
    request_counter: AtomicU64,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            request_counter: AtomicU64::new(0),
        }
    }

    /// Generate one post: content text and image concurrently, then the
    /// logo overlay when one was supplied.
    ///
    /// All-or-nothing: if either remote call fails, no partial post is
    /// returned. Remote failures surface as `Generation` / `Compositing`
    /// with causes logged rather than exposed.
    pub async fn generate(&self, request: PostRequest) -> Result<GeneratedPost> {
        request.validate()?;

        let request_id = self.request_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let _timer = logger::timer("generate post");
        log::info!(
            "Starting generation run {} (topic: {:?}, audience: {:?})",
            request_id,
            request.topic,
            request.audience
        );

        let image_prompt = self.resolve_image_prompt(&request).await;
        let text_prompt = content_prompt(&request.topic, &request.audience);

        let description_fut = async {
            self.backend.generate_text(&text_prompt).await.map_err(|e| {
                log::error!("Post content generation failed: {}", e);
                PostforgeError::Generation("failed to generate post description".into())
            })
        };
        let image_fut = async {
            self.backend
                .generate_image(&image_prompt, request.aspect_ratio)
                .await
                .map_err(|e| {
                    log::error!("Image generation failed: {}", e);
                    PostforgeError::Generation("failed to generate post image".into())
                })
        };

        let (description, image_b64) = futures::try_join!(description_fut, image_fut)?;

        let base = ImageAsset::from_base64(&image_b64).map_err(|e| {
            log::error!("Generated image payload could not be decoded: {}", e);
            PostforgeError::Generation("failed to generate post image".into())
        })?;

        let image = match &request.logo {
            Some(logo) => compositor::composite(&base, logo, request.logo_position).map_err(|e| {
                log::error!("Logo compositing failed: {}", e);
                PostforgeError::Compositing(
                    "failed to apply the logo to the generated image".into(),
                )
            })?,
            None => base,
        };

        Ok(GeneratedPost {
            request_id,
            description,
            image: Some(image),
        })
    }

    /// True when a newer `generate` call has started since this post was
    /// requested, i.e. the post should no longer be displayed.
    pub fn is_stale(&self, post: &GeneratedPost) -> bool {
        post.request_id != self.request_counter.load(Ordering::SeqCst)
    }

    /// Resolve the image prompt. Never fails: a user-supplied description is
    /// used verbatim; a failed derivation call falls back to a deterministic
    /// local prompt.
    async fn resolve_image_prompt(&self, request: &PostRequest) -> String {
        let mut prompt = match request
            .image_description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
        {
            Some(description) => description.to_string(),
            None => {
                let derivation = derivation_prompt(&request.topic, &request.audience);
                match self.backend.derive_image_prompt(&derivation).await {
                    Ok(derived) => format!("{}{}", DERIVED_PROMPT_PREFIX, derived),
                    Err(e) => {
                        log::warn!("Image prompt derivation failed, using fallback: {}", e);
                        fallback_image_prompt(&request.topic, &request.audience)
                    }
                }
            }
        };

        if let Some(overlay) = request
            .image_text_overlay
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            prompt.push_str(&overlay_instruction(overlay));
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectRatio, LogoPosition};
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn png_base64(width: u32, height: u32) -> String {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([5, 5, 5, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        STANDARD.encode(out)
    }

    #[derive(Default)]
    struct MockBackend {
        text_calls: AtomicUsize,
        derive_calls: AtomicUsize,
        image_calls: AtomicUsize,
        fail_text: bool,
        fail_derive: bool,
        fail_image: bool,
        image_response: String,
        last_image_prompt: Mutex<Option<String>>,
        last_aspect_ratio: Mutex<Option<AspectRatio>>,
    }

    impl MockBackend {
        fn with_image(width: u32, height: u32) -> Self {
            Self {
                image_response: png_base64(width, height),
                ..Default::default()
            }
        }

        fn remote_calls(&self) -> usize {
            self.text_calls.load(Ordering::SeqCst)
                + self.derive_calls.load(Ordering::SeqCst)
                + self.image_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeBackend for MockBackend {
        async fn generate_text(&self, _prompt: &str) -> Result<String> {
            self.text_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_text {
                return Err(PostforgeError::Request("text endpoint down".into()));
            }
            Ok("a mock post description".to_string())
        }

        async fn derive_image_prompt(&self, _prompt: &str) -> Result<String> {
            self.derive_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_derive {
                return Err(PostforgeError::Request("prompt endpoint down".into()));
            }
            Ok("a derived scene of gears and light".to_string())
        }

        async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_image_prompt.lock().unwrap() = Some(prompt.to_string());
            *self.last_aspect_ratio.lock().unwrap() = Some(aspect_ratio);
            if self.fail_image {
                return Err(PostforgeError::Request("image endpoint down".into()));
            }
            Ok(self.image_response.clone())
        }

        async fn generate_speech(&self, _text: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn logo_asset() -> ImageAsset {
        let img = image::RgbaImage::from_pixel(40, 20, image::Rgba([255, 0, 0, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        ImageAsset::from_bytes(out)
    }

    #[tokio::test]
    async fn validation_fails_before_any_remote_call() {
        let backend = Arc::new(MockBackend::with_image(64, 64));
        let orchestrator = Orchestrator::new(backend.clone());

        let result = orchestrator.generate(PostRequest::new("", "engineers")).await;
        assert!(matches!(result, Err(PostforgeError::Validation(_))));
        assert_eq!(backend.remote_calls(), 0);

        let result = orchestrator.generate(PostRequest::new("rust", "  ")).await;
        assert!(matches!(result, Err(PostforgeError::Validation(_))));
        assert_eq!(backend.remote_calls(), 0);
    }

    #[tokio::test]
    async fn no_logo_returns_raw_generated_image() {
        let backend = Arc::new(MockBackend::with_image(64, 48));
        let orchestrator = Orchestrator::new(backend.clone());

        let post = orchestrator
            .generate(PostRequest::new("rust", "engineers"))
            .await
            .unwrap();

        assert_eq!(post.description, "a mock post description");
        let raw = ImageAsset::from_base64(&backend.image_response).unwrap();
        assert_eq!(post.image.unwrap(), raw);
    }

    #[tokio::test]
    async fn logo_compositing_preserves_base_dimensions() {
        let backend = Arc::new(MockBackend::with_image(300, 200));
        let orchestrator = Orchestrator::new(backend.clone());

        let request = PostRequest::new("rust", "engineers")
            .with_logo(logo_asset(), LogoPosition::BottomRight);
        let post = orchestrator.generate(request).await.unwrap();

        let image = post.image.unwrap();
        assert_eq!(image.dimensions().unwrap(), (300, 200));
        let raw = ImageAsset::from_base64(&backend.image_response).unwrap();
        assert_ne!(image, raw);
    }

    #[tokio::test]
    async fn corrupt_logo_fails_as_compositing_error() {
        let backend = Arc::new(MockBackend::with_image(100, 100));
        let orchestrator = Orchestrator::new(backend);

        let request = PostRequest::new("rust", "engineers").with_logo(
            ImageAsset::from_bytes(vec![0u8; 4]),
            LogoPosition::TopLeft,
        );
        let result = orchestrator.generate(request).await;
        assert!(matches!(result, Err(PostforgeError::Compositing(_))));
    }

    #[tokio::test]
    async fn user_description_skips_derivation() {
        let backend = Arc::new(MockBackend::with_image(64, 64));
        let orchestrator = Orchestrator::new(backend.clone());

        let request = PostRequest::new("rust", "engineers")
            .with_image_description("a hand-drawn crab on a laptop");
        orchestrator.generate(request).await.unwrap();

        assert_eq!(backend.derive_calls.load(Ordering::SeqCst), 0);
        let prompt = backend.last_image_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, "a hand-drawn crab on a laptop");
    }

    #[tokio::test]
    async fn derived_prompt_gets_context_prefix() {
        let backend = Arc::new(MockBackend::with_image(64, 64));
        let orchestrator = Orchestrator::new(backend.clone());

        orchestrator
            .generate(PostRequest::new("rust", "engineers"))
            .await
            .unwrap();

        let prompt = backend.last_image_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with(DERIVED_PROMPT_PREFIX));
        assert!(prompt.contains("gears and light"));
    }

    #[tokio::test]
    async fn derivation_failure_falls_back_to_local_prompt() {
        let backend = Arc::new(MockBackend {
            fail_derive: true,
            ..MockBackend::with_image(64, 64)
        });
        let orchestrator = Orchestrator::new(backend.clone());

        let post = orchestrator
            .generate(PostRequest::new("rust", "engineers"))
            .await
            .unwrap();
        assert!(post.image.is_some());

        let prompt = backend.last_image_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("\"rust\""));
        assert!(prompt.contains("targeting engineers"));
    }

    #[tokio::test]
    async fn overlay_text_is_appended_literally() {
        let backend = Arc::new(MockBackend::with_image(64, 64));
        let orchestrator = Orchestrator::new(backend.clone());

        let request = PostRequest::new("rust", "engineers")
            .with_image_description("a minimalist skyline")
            .with_image_text_overlay("Ship It");
        orchestrator.generate(request).await.unwrap();

        let prompt = backend.last_image_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("a minimalist skyline"));
        assert!(prompt.contains("prominently feature the text: \"Ship It\""));
    }

    #[tokio::test]
    async fn aspect_ratio_reaches_the_image_call() {
        let backend = Arc::new(MockBackend::with_image(64, 64));
        let orchestrator = Orchestrator::new(backend.clone());

        let request = PostRequest::new("rust", "engineers").with_aspect_ratio(AspectRatio::Wide);
        orchestrator.generate(request).await.unwrap();

        assert_eq!(
            *backend.last_aspect_ratio.lock().unwrap(),
            Some(AspectRatio::Wide)
        );
    }

    #[tokio::test]
    async fn text_failure_fails_the_whole_call() {
        let backend = Arc::new(MockBackend {
            fail_text: true,
            ..MockBackend::with_image(64, 64)
        });
        let orchestrator = Orchestrator::new(backend);

        let result = orchestrator
            .generate(PostRequest::new("rust", "engineers"))
            .await;
        assert!(matches!(result, Err(PostforgeError::Generation(_))));
    }

    #[tokio::test]
    async fn image_failure_fails_the_whole_call() {
        let backend = Arc::new(MockBackend {
            fail_image: true,
            ..MockBackend::with_image(64, 64)
        });
        let orchestrator = Orchestrator::new(backend);

        let result = orchestrator
            .generate(PostRequest::new("rust", "engineers"))
            .await;
        assert!(matches!(result, Err(PostforgeError::Generation(_))));
    }

    #[tokio::test]
    async fn newer_request_makes_older_post_stale() {
        let backend = Arc::new(MockBackend::with_image(64, 64));
        let orchestrator = Orchestrator::new(backend);

        let first = orchestrator
            .generate(PostRequest::new("rust", "engineers"))
            .await
            .unwrap();
        assert!(!orchestrator.is_stale(&first));

        let second = orchestrator
            .generate(PostRequest::new("go", "managers"))
            .await
            .unwrap();
        assert!(orchestrator.is_stale(&first));
        assert!(!orchestrator.is_stale(&second));
    }
}
