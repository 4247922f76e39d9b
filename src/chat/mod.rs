//! Chat model access
//!
//! A [`ChatClient`] owns its [`ConversationSession`] and sends the full history
//! with every message. Quota exhaustion is the only failure [`send_with_retry`]
//! retries.

mod gemini;
mod retry;
mod session;

pub use gemini::GeminiClient;
pub use retry::{RetryPolicy, send_with_retry};
pub use session::{ConversationSession, Role, Turn};

use async_trait::async_trait;

use crate::Result;

/// Remote conversational model with history
#[async_trait]
pub trait ChatClient: Send {
    /// Send a user message and return the model reply
    ///
    /// The user turn and the model turn are appended to the session only when
    /// the call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::QuotaExhausted`] when the provider rate limits
    /// the request, and other variants for transport, auth or response errors
    async fn send(&mut self, text: &str) -> Result<String>;

    /// Conversation history so far
    fn session(&self) -> &ConversationSession;
}
