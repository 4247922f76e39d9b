//! Configuration management for parley
//!
//! Values resolve as env > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;

use crate::chat::RetryPolicy;
use crate::conversation::Keywords;

/// Placeholder used when no Gemini key is configured; requests will fail auth
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

/// Default Gemini model
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-pro-latest";

/// Default Gemini API base URL
pub const DEFAULT_CHAT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default speech (STT/TTS) API base URL
pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.openai.com";

/// parley configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat model configuration
    pub chat: ChatConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Reserved control phrases
    pub keywords: Keywords,

    /// Exit phrase ends the program from voice mode instead of demoting to text
    pub exit_from_voice_terminates: bool,

    /// Retry policy for chat calls
    pub retry: RetryPolicy,
}

/// Chat model configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Gemini API key
    pub api_key: SecretString,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Sampling parameters sent with every request
    pub generation: GenerationConfig,

    /// Harm block threshold applied to every safety category
    pub safety_threshold: String,

    /// System instruction, omitted from requests when `None`
    pub system_instruction: Option<String>,
}

/// Fixed generation parameters for the chat model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice mode
    pub enabled: bool,

    /// Speech API key (for STT and TTS)
    pub api_key: Option<SecretString>,

    /// Speech API base URL
    pub api_base_url: String,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Transient file synthesized audio is written to before playback
    pub audio_file: PathBuf,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load() -> crate::Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load_with_options(disable_voice: bool) -> crate::Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok(), disable_voice)
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a keyword is blank
    pub fn from_sources(
        fc: file::ParleyConfigFile,
        env: impl Fn(&str) -> Option<String>,
        disable_voice: bool,
    ) -> crate::Result<Self> {
        let api_key = env("GEMINI_API_KEY")
            .or(fc.api_keys.gemini)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("GEMINI_API_KEY not set, chat requests will fail authentication");
                PLACEHOLDER_API_KEY.to_string()
            });

        let defaults = GenerationConfig::default();
        let chat = ChatConfig {
            api_key: SecretString::from(api_key),
            model: env("PARLEY_MODEL")
                .or(fc.chat.model)
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            base_url: env("PARLEY_CHAT_URL")
                .or(fc.chat.base_url)
                .unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string()),
            generation: GenerationConfig {
                temperature: fc.chat.temperature.unwrap_or(defaults.temperature),
                top_p: fc.chat.top_p.unwrap_or(defaults.top_p),
                top_k: fc.chat.top_k.unwrap_or(defaults.top_k),
                max_output_tokens: fc
                    .chat
                    .max_output_tokens
                    .unwrap_or(defaults.max_output_tokens),
                response_mime_type: fc
                    .chat
                    .response_mime_type
                    .unwrap_or(defaults.response_mime_type),
            },
            safety_threshold: fc
                .chat
                .safety_threshold
                .unwrap_or_else(|| "BLOCK_NONE".to_string()),
            system_instruction: fc
                .chat
                .system_instruction
                .filter(|s| !s.trim().is_empty()),
        };

        let voice_enabled = !disable_voice && fc.voice.enabled.unwrap_or(true);
        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        let voice = VoiceConfig {
            enabled: voice_enabled,
            api_key: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            api_base_url: fc
                .voice
                .api_base_url
                .unwrap_or_else(|| DEFAULT_SPEECH_BASE_URL.to_string()),
            stt_model: env("PARLEY_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: env("PARLEY_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: fc.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0),
            audio_file: fc
                .voice
                .audio_file
                .unwrap_or_else(|| std::env::temp_dir().join("response.mp3")),
        };

        let phrases = Keywords::default();
        let keywords = Keywords::new(
            fc.keywords.voice.as_deref().unwrap_or(phrases.voice()),
            fc.keywords.text.as_deref().unwrap_or(phrases.text()),
            fc.keywords.exit.as_deref().unwrap_or(phrases.exit()),
        )?;

        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy::new(
            fc.retry.max_attempts.unwrap_or(default_retry.max_attempts),
            fc.retry
                .backoff_secs
                .map_or(default_retry.backoff, Duration::from_secs),
        );

        Ok(Self {
            chat,
            voice,
            keywords,
            exit_from_voice_terminates: fc.keywords.exit_from_voice_terminates.unwrap_or(false),
            retry,
        })
    }
}
