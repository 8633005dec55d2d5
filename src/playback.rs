use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tokio::sync::oneshot;

use crate::{
    backend::GenerativeBackend,
    error::{PostforgeError, Result},
    models::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE},
};

/// Decode a base64 payload of signed 16-bit little-endian PCM samples into
/// normalized f32 samples.
pub fn decode_pcm16_base64(encoded: &str) -> Result<Vec<f32>> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| PostforgeError::Synthesis(format!("invalid base64 audio: {}", e)))?;
    if bytes.len() % 2 != 0 {
        return Err(PostforgeError::Synthesis(
            "PCM16 payload has an odd byte length".into(),
        ));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

/// Plays synthesized speech on the default output device.
///
/// At most one playback is active per player; the state machine is
/// Idle -> Playing on `speak`, Playing -> Idle on completion or any failure.
pub struct SpeechPlayer {
    backend: Arc<dyn GenerativeBackend>,
    playing: Arc<AtomicBool>,
}

impl SpeechPlayer {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Synthesize `text` and start playback. Returns once playback has
    /// started; the player returns to idle when the buffer finishes playing.
    pub async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(PostforgeError::Validation("nothing to speak".into()));
        }

        if self
            .playing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PostforgeError::Playback(
                "a playback is already active".into(),
            ));
        }

        match self.speak_inner(text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // never leave the player stuck in Playing
                self.playing.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn speak_inner(&self, text: &str) -> Result<()> {
        let payload = self.backend.generate_speech(text).await.map_err(|e| {
            log::error!("Speech synthesis failed: {}", e);
            PostforgeError::Synthesis("failed to generate speech".into())
        })?;
        if payload.is_empty() {
            return Err(PostforgeError::Synthesis("no audio data received".into()));
        }

        let samples = decode_pcm16_base64(&payload)?;
        log::info!(
            "Starting playback of {} samples at {} Hz",
            samples.len(),
            SPEECH_SAMPLE_RATE
        );

        let playing = self.playing.clone();
        let (init_tx, init_rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            // The output stream is not Send, so it is created and kept alive
            // on this thread for the whole playback.
            let init = OutputStream::try_default()
                .map_err(|e| {
                    PostforgeError::Playback(format!("failed to open output device: {}", e))
                })
                .and_then(|(stream, handle)| {
                    Sink::try_new(&handle)
                        .map(|sink| (stream, sink))
                        .map_err(|e| {
                            PostforgeError::Playback(format!("failed to create sink: {}", e))
                        })
                });

            match init {
                Ok((_stream, sink)) => {
                    sink.append(SamplesBuffer::new(
                        SPEECH_CHANNELS,
                        SPEECH_SAMPLE_RATE,
                        samples,
                    ));
                    let _ = init_tx.send(Ok(()));
                    sink.sleep_until_end();
                    playing.store(false, Ordering::SeqCst);
                    log::debug!("Playback finished");
                }
                Err(e) => {
                    playing.store(false, Ordering::SeqCst);
                    let _ = init_tx.send(Err(e));
                }
            }
        });

        init_rx
            .await
            .map_err(|_| PostforgeError::Playback("playback task exited before starting".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectRatio;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct MockSpeechBackend {
        speech_calls: AtomicUsize,
        fail_synthesis: bool,
        empty_payload: bool,
    }

    #[async_trait]
    impl GenerativeBackend for MockSpeechBackend {
        async fn generate_text(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn generate_image(
            &self,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> Result<String> {
            Ok(String::new())
        }

        async fn generate_speech(&self, _text: &str) -> Result<String> {
            self.speech_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_synthesis {
                return Err(PostforgeError::Request("speech endpoint down".into()));
            }
            if self.empty_payload {
                return Ok(String::new());
            }
            Ok(BASE64.encode(0i16.to_le_bytes()))
        }
    }

    #[test]
    fn decodes_pcm16_samples() {
        let raw: Vec<u8> = [0i16, 16384, -32768, 32767]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let samples = decode_pcm16_base64(&BASE64.encode(raw)).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 0.5);
        assert_eq!(samples[2], -1.0);
        assert!((samples[3] - 32767.0 / 32768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_odd_length_payload() {
        assert!(matches!(
            decode_pcm16_base64(&BASE64.encode([1u8, 2, 3])),
            Err(PostforgeError::Synthesis(_))
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_pcm16_base64("@@@"),
            Err(PostforgeError::Synthesis(_))
        ));
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_a_remote_call() {
        let backend = Arc::new(MockSpeechBackend::default());
        let player = SpeechPlayer::new(backend.clone());
        assert!(matches!(
            player.speak("   ").await,
            Err(PostforgeError::Validation(_))
        ));
        assert_eq!(backend.speech_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_speak_is_rejected() {
        let backend = Arc::new(MockSpeechBackend::default());
        let player = SpeechPlayer::new(backend.clone());

        // simulate an active session
        player.playing.store(true, Ordering::SeqCst);
        assert!(matches!(
            player.speak("hello").await,
            Err(PostforgeError::Playback(_))
        ));
        assert_eq!(backend.speech_calls.load(Ordering::SeqCst), 0);
        // the rejected call must not clear the active session's state
        assert!(player.is_playing());
    }

    #[tokio::test]
    async fn synthesis_failure_clears_the_playing_state() {
        let backend = Arc::new(MockSpeechBackend {
            fail_synthesis: true,
            ..Default::default()
        });
        let player = SpeechPlayer::new(backend);
        assert!(matches!(
            player.speak("hello").await,
            Err(PostforgeError::Synthesis(_))
        ));
        assert!(!player.is_playing());
    }

    #[tokio::test]
    async fn empty_payload_is_a_synthesis_error() {
        let backend = Arc::new(MockSpeechBackend {
            empty_payload: true,
            ..Default::default()
        });
        let player = SpeechPlayer::new(backend);
        assert!(matches!(
            player.speak("hello").await,
            Err(PostforgeError::Synthesis(_))
        ));
        assert!(!player.is_playing());
    }
}
