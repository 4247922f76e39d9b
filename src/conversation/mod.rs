//! The interactive conversation loop
//!
//! Owns the text/voice mode state machine. Each iteration acquires one
//! utterance (typed in text mode, spoken in voice mode), checks it for a
//! reserved phrase, and otherwise forwards it to the chat model with retry.
//! In voice mode the reply is also spoken before the next utterance is read.

mod console;
mod keywords;

pub use console::{Console, TerminalConsole};
pub use keywords::{Action, Keywords, Mode};

use crate::chat::{ChatClient, ConversationSession, RetryPolicy, send_with_retry};
use crate::voice::{SpeechRecognizer, Synthesizer};
use crate::{Error, Result};

const PROMPT: &str = "User: ";
const FAREWELL: &str = "\nGoodbye!";

/// Speech input and output used in voice mode
pub struct VoiceIo {
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub synthesizer: Box<dyn Synthesizer>,
}

/// Whether the loop keeps going after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Text/voice conversation driver
pub struct ConversationLoop {
    chat: Box<dyn ChatClient>,
    console: Box<dyn Console>,
    voice: Option<VoiceIo>,
    keywords: Keywords,
    retry: RetryPolicy,
    exit_from_voice_terminates: bool,
    mode: Mode,
}

impl ConversationLoop {
    /// Create a loop in text mode with default keywords and retry policy
    ///
    /// Voice mode stays unavailable until [`Self::with_voice`] is used.
    #[must_use]
    pub fn new(chat: Box<dyn ChatClient>, console: Box<dyn Console>) -> Self {
        Self {
            chat,
            console,
            voice: None,
            keywords: Keywords::default(),
            retry: RetryPolicy::default(),
            exit_from_voice_terminates: false,
            mode: Mode::Text,
        }
    }

    #[must_use]
    pub fn with_voice(mut self, voice: VoiceIo) -> Self {
        self.voice = Some(voice);
        self
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_exit_from_voice_terminates(mut self, terminates: bool) -> Self {
        self.exit_from_voice_terminates = terminates;
        self
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Conversation history held by the chat client
    #[must_use]
    pub fn session(&self) -> &ConversationSession {
        self.chat.session()
    }

    /// Run until the exit phrase is typed or input ends
    ///
    /// # Errors
    ///
    /// Returns error only if the console itself fails; failed turns are
    /// reported and the loop continues
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(session = %self.chat.session().id(), "conversation started");

        while self.step().await? == Flow::Continue {}

        tracing::info!(turns = self.chat.session().len(), "conversation ended");
        Ok(())
    }

    /// Process one utterance
    ///
    /// # Errors
    ///
    /// Returns error only if the console itself fails
    pub async fn step(&mut self) -> Result<Flow> {
        let utterance = match self.mode {
            Mode::Text => {
                let Some(line) = self.console.read_line(PROMPT).await? else {
                    tracing::debug!("input closed");
                    self.console.print(FAREWELL).await?;
                    return Ok(Flow::Exit);
                };
                line
            }
            Mode::Voice => match self.listen().await {
                Ok(utterance) => utterance,
                Err(e) => {
                    self.report(&e).await?;
                    return Ok(Flow::Continue);
                }
            },
        };

        let action = self
            .keywords
            .classify(self.mode, &utterance, self.exit_from_voice_terminates);
        tracing::debug!(mode = ?self.mode, ?action, "utterance classified");

        match action {
            Action::Skip => {}
            Action::Exit => {
                self.console.print(FAREWELL).await?;
                return Ok(Flow::Exit);
            }
            Action::Switch(Mode::Voice) if self.voice.is_none() => {
                self.console
                    .print("Voice mode is unavailable (voice is disabled).")
                    .await?;
            }
            Action::Switch(mode) => {
                self.mode = mode;
                tracing::info!(?mode, "mode switched");
                let notice = match mode {
                    Mode::Text => "Switching to text mode.",
                    Mode::Voice => "Switching to voice mode.",
                };
                self.console.print(notice).await?;
            }
            Action::Chat => {
                if let Err(e) = self.respond(&utterance).await {
                    self.report(&e).await?;
                }
            }
        }

        Ok(Flow::Continue)
    }

    /// Wait for one spoken utterance and echo it
    async fn listen(&mut self) -> Result<String> {
        let Some(voice) = self.voice.as_mut() else {
            self.mode = Mode::Text;
            return Err(Error::Config("voice mode entered without voice I/O".to_string()));
        };

        self.console.print("Listening...").await?;
        let utterance = voice.recognizer.listen().await?;
        self.console.print(&format!("You said: {utterance}")).await?;
        Ok(utterance)
    }

    /// Ask the model, print the reply and speak it in voice mode
    async fn respond(&mut self, utterance: &str) -> Result<()> {
        let reply = send_with_retry(self.chat.as_mut(), utterance, &self.retry).await?;
        self.console.print(&format!("\nModel: {reply}")).await?;

        if self.mode == Mode::Voice
            && let Some(voice) = self.voice.as_mut()
        {
            voice.synthesizer.speak(&reply).await?;
        }

        Ok(())
    }

    async fn report(&mut self, error: &Error) -> Result<()> {
        tracing::error!(error = %error, mode = ?self.mode, "turn failed");
        self.console
            .print(&format!("An error occurred: {error}"))
            .await
    }
}
