//! Parley - a terminal chat client with text and voice modes
//!
//! The user types (text mode) or speaks (voice mode) to a Gemini chat model
//! that keeps the conversation history. Reserved phrases switch modes or
//! end the session.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Conversation loop                    │
//! │     Console  │  Keywords  │  Mode state machine     │
//! └──────────┬──────────────────────────┬───────────────┘
//!            │                          │
//! ┌──────────▼──────────┐   ┌───────────▼───────────────┐
//! │   Chat (Gemini)      │   │   Voice                    │
//! │  Session  │  Retry   │   │  Capture │ STT │ TTS │ Out │
//! └──────────────────────┘   └───────────────────────────┘
//! ```

pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod setup;
pub mod voice;

pub use config::Config;
pub use conversation::{ConversationLoop, Mode, VoiceIo};
pub use error::{Error, Result};
