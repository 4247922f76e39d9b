//! Shared test utilities
//!
//! Scripted stand-ins for the chat model, console and voice devices. Each
//! fake shares its record through an `Arc<Mutex<_>>` so a test can inspect
//! it after the conversation loop has taken ownership of the boxed fake.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use parley::chat::{ChatClient, ConversationSession};
use parley::conversation::Console;
use parley::voice::{SpeechRecognizer, Synthesizer};
use parley::{Error, Result};

pub type Shared<T> = Arc<Mutex<Vec<T>>>;

/// Chat model that replays scripted outcomes and records what it was sent
pub struct ScriptedChat {
    outcomes: VecDeque<Result<String>>,
    sent: Shared<String>,
    session: ConversationSession,
}

impl ScriptedChat {
    pub fn new(outcomes: Vec<Result<String>>) -> (Self, Shared<String>) {
        let sent: Shared<String> = Arc::new(Mutex::new(Vec::new()));
        let chat = Self {
            outcomes: outcomes.into(),
            sent: Arc::clone(&sent),
            session: ConversationSession::new(),
        };
        (chat, sent)
    }

    /// Replies `"echo: <text>"` to everything
    pub fn echo() -> (Self, Shared<String>) {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn send(&mut self, text: &str) -> Result<String> {
        self.sent.lock().unwrap().push(text.to_string());
        let reply = self
            .outcomes
            .pop_front()
            .unwrap_or_else(|| Ok(format!("echo: {text}")))?;
        self.session.record_exchange(text, &reply);
        Ok(reply)
    }

    fn session(&self) -> &ConversationSession {
        &self.session
    }
}

/// Console fed from a fixed list of lines, recording everything printed
pub struct ScriptedConsole {
    input: VecDeque<String>,
    output: Shared<String>,
    prompts: Arc<Mutex<usize>>,
}

impl ScriptedConsole {
    pub fn new(lines: &[&str]) -> (Self, Shared<String>) {
        let output: Shared<String> = Arc::new(Mutex::new(Vec::new()));
        let console = Self {
            input: lines.iter().map(|l| (*l).to_string()).collect(),
            output: Arc::clone(&output),
            prompts: Arc::default(),
        };
        (console, output)
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        assert_eq!(prompt, "User: ");
        *self.prompts.lock().unwrap() += 1;
        Ok(self.input.pop_front())
    }

    async fn print(&mut self, line: &str) -> Result<()> {
        self.output.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

/// Console whose input stream is broken
pub struct BrokenConsole;

#[async_trait]
impl Console for BrokenConsole {
    async fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdin closed",
        )))
    }

    async fn print(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }
}

/// Recognizer that replays scripted utterances
pub struct ScriptedRecognizer {
    utterances: VecDeque<Result<String>>,
}

impl ScriptedRecognizer {
    pub fn new(utterances: Vec<Result<String>>) -> Self {
        Self {
            utterances: utterances.into(),
        }
    }

    pub fn saying(utterances: &[&str]) -> Self {
        Self::new(utterances.iter().map(|u| Ok((*u).to_string())).collect())
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn listen(&mut self) -> Result<String> {
        self.utterances
            .pop_front()
            .unwrap_or_else(|| Err(Error::Stt("no more scripted speech".to_string())))
    }
}

/// Synthesizer that records what it was asked to say
pub struct RecordingSynthesizer {
    spoken: Shared<String>,
    fail: bool,
}

impl RecordingSynthesizer {
    pub fn new() -> (Self, Shared<String>) {
        let spoken: Shared<String> = Arc::new(Mutex::new(Vec::new()));
        let synth = Self {
            spoken: Arc::clone(&spoken),
            fail: false,
        };
        (synth, spoken)
    }

    pub fn failing() -> (Self, Shared<String>) {
        let (mut synth, spoken) = Self::new();
        synth.fail = true;
        (synth, spoken)
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(Error::Tts("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

/// Snapshot a shared record
pub fn lines(shared: &Shared<String>) -> Vec<String> {
    shared.lock().unwrap().clone()
}
