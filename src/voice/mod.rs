//! Voice processing module
//!
//! Handles audio capture, utterance segmentation, transcription, synthesis
//! and playback. The conversation loop only sees the [`SpeechRecognizer`] and
//! [`Synthesizer`] seams.

mod capture;
mod playback;
mod segmenter;
mod stt;
mod tts;

use std::path::PathBuf;

use async_trait::async_trait;

pub use capture::{AudioCapture, samples_to_wav};
pub use playback::{AudioPlayback, DecodedAudio, PLAYBACK_SAMPLE_RATE, decode_mp3, resample};
pub use segmenter::{SegmenterState, UtteranceSegmenter, calculate_energy};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;

use crate::Result;
use crate::config::VoiceConfig;

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Turns live speech into one finalized utterance
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Block until one utterance is recognized
    ///
    /// Returns an empty string if nothing was recognized before the stream
    /// ended.
    ///
    /// # Errors
    ///
    /// Returns error on device or transcription failure
    async fn listen(&mut self) -> Result<String>;
}

/// Speaks text aloud
#[async_trait]
pub trait Synthesizer: Send {
    /// Synthesize and play `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error on synthesis, file or playback failure
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Microphone capture, segmentation and HTTP transcription
pub struct MicrophoneRecognizer {
    capture: AudioCapture,
    stt: SpeechToText,
}

impl MicrophoneRecognizer {
    /// Open the default input device and prepare the transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the device or the STT credentials are unavailable
    pub fn new(config: &VoiceConfig) -> Result<Self> {
        let stt = SpeechToText::new(
            config.api_key.clone(),
            &config.api_base_url,
            config.stt_model.clone(),
        )?;
        let capture = AudioCapture::new()?;
        Ok(Self { capture, stt })
    }
}

#[async_trait]
impl SpeechRecognizer for MicrophoneRecognizer {
    async fn listen(&mut self) -> Result<String> {
        let Some(samples) = self
            .capture
            .capture_utterance(UtteranceSegmenter::new())
            .await?
        else {
            tracing::debug!("capture ended without an utterance");
            return Ok(String::new());
        };

        let wav = samples_to_wav(&samples, self.capture.sample_rate())?;
        self.stt.transcribe(wav).await
    }
}

/// HTTP synthesis written to a transient file, then played
pub struct SpeakerSynthesizer {
    tts: TextToSpeech,
    playback: AudioPlayback,
    audio_file: PathBuf,
}

impl SpeakerSynthesizer {
    /// Open the default output device and prepare the synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if the device or the TTS credentials are unavailable
    pub fn new(config: &VoiceConfig) -> Result<Self> {
        let tts = TextToSpeech::new(config)?;
        let playback = AudioPlayback::new()?;
        Ok(Self {
            tts,
            playback,
            audio_file: config.audio_file.clone(),
        })
    }
}

#[async_trait]
impl Synthesizer for SpeakerSynthesizer {
    async fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let audio = self.tts.synthesize(text).await?;
        tokio::fs::write(&self.audio_file, &audio).await?;
        self.playback.play_mp3_file(&self.audio_file).await
    }
}
