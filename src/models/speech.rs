use serde::Deserialize;

/// Sample rate of the PCM payload returned by the speech endpoint.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
/// The speech endpoint returns mono audio.
pub const SPEECH_CHANNELS: u16 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechSynthesisRequest {
    pub text: String,
    pub voice: Option<String>,
    pub model_id: Option<String>,
}
