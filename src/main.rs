use std::env;
use std::fs;
use std::sync::Arc;

use postforge::{
    logger, AspectRatio, GeminiClient, GeminiConfig, GenerativeBackend, ImageAsset, LogoPosition,
    Orchestrator, PostRequest, SpeechPlayer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(
        logger::LoggerConfig::development().with_level(logger::LogLevel::Debug),
    )?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = GeminiConfig::from_env();
    if config.api_key.is_none() {
        log::error!("❌ GEMINI_API_KEY is not set");
    }

    log::info!("🔄 Creating Gemini client...");
    let client = GeminiClient::new(config)?;
    log::info!("✅ Gemini client initialized successfully");

    let backend: Arc<dyn GenerativeBackend> = Arc::new(client);
    let orchestrator = Orchestrator::new(backend.clone());

    let args: Vec<String> = env::args().collect();
    let topic = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "Why Rust is a great fit for backend services".to_string());
    let audience = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "software engineers".to_string());

    log::info!("🧪 Generating a post (topic: {:?}, audience: {:?})", topic, audience);

    let mut request = PostRequest::new(&topic, &audience).with_aspect_ratio(AspectRatio::Square);
    if let Some(path) = args.get(3) {
        log::info!("🖼️  Loading logo from {}", path);
        let bytes = fs::read(path)?;
        request = request.with_logo(ImageAsset::from_bytes(bytes), LogoPosition::BottomRight);
    }

    let post = match orchestrator.generate(request).await {
        Ok(post) => {
            log::info!("✅ Post generated (run {})", post.request_id);
            post
        }
        Err(e) => {
            log::error!("❌ Generation failed: {}", e);
            return Err(e.into());
        }
    };

    log::info!("📝 Description:\n{}", post.description);

    if let Some(image) = &post.image {
        let filename = format!("post_image_{}.png", chrono::Utc::now().timestamp());
        fs::write(&filename, image.as_bytes())?;
        log::info!("💾 Image saved to: {}", filename);
    }

    if env::var("POSTFORGE_SPEAK").map_or(false, |v| v == "true") {
        log::info!("🔊 Speaking the post description...");
        let player = SpeechPlayer::new(backend);
        match player.speak(&post.description).await {
            Ok(()) => {
                while player.is_playing() {
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
                log::info!("🔊 Playback finished");
            }
            Err(e) => log::error!("❌ Speech playback failed: {}", e),
        }
    }

    log::info!("🎉 Done!");
    Ok(())
}
