//! Reserved control phrases and the mode transition table

use crate::{Error, Result};

/// Current interaction modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Text,
    Voice,
}

/// What the loop does with one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Say goodbye and stop
    Exit,
    /// Change mode without contacting the model
    Switch(Mode),
    /// Forward the utterance to the model
    Chat,
    /// Nothing to do (blank input)
    Skip,
}

/// The three reserved phrases, stored lower-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    voice: String,
    text: String,
    exit: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            voice: "voice mode".to_string(),
            text: "text mode".to_string(),
            exit: "exit mode".to_string(),
        }
    }
}

impl Keywords {
    /// Build a keyword set, normalizing each phrase to trimmed lower case
    ///
    /// # Errors
    ///
    /// Returns error if any phrase is blank, since it would match every utterance
    pub fn new(voice: &str, text: &str, exit: &str) -> Result<Self> {
        let normalize = |name: &str, phrase: &str| {
            let phrase = phrase.trim().to_lowercase();
            if phrase.is_empty() {
                Err(Error::Config(format!("{name} keyword must not be empty")))
            } else {
                Ok(phrase)
            }
        };

        Ok(Self {
            voice: normalize("voice", voice)?,
            text: normalize("text", text)?,
            exit: normalize("exit", exit)?,
        })
    }

    #[must_use]
    pub fn voice(&self) -> &str {
        &self.voice
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn exit(&self) -> &str {
        &self.exit
    }

    /// Decide what to do with `utterance` in `mode`
    ///
    /// Matching is case-insensitive substring containment, so a phrase
    /// anywhere in the utterance triggers. In voice mode the exit phrase only
    /// returns to text mode unless `exit_from_voice_terminates` is set.
    #[must_use]
    pub fn classify(&self, mode: Mode, utterance: &str, exit_from_voice_terminates: bool) -> Action {
        if utterance.trim().is_empty() {
            return Action::Skip;
        }

        let lower = utterance.to_lowercase();

        match mode {
            Mode::Text => {
                if lower.contains(&self.exit) {
                    Action::Exit
                } else if lower.contains(&self.voice) {
                    Action::Switch(Mode::Voice)
                } else {
                    Action::Chat
                }
            }
            Mode::Voice => {
                if lower.contains(&self.exit) && exit_from_voice_terminates {
                    Action::Exit
                } else if lower.contains(&self.text) || lower.contains(&self.exit) {
                    Action::Switch(Mode::Text)
                } else {
                    Action::Chat
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(mode: Mode, utterance: &str) -> Action {
        Keywords::default().classify(mode, utterance, false)
    }

    #[test]
    fn text_mode_transitions() {
        assert_eq!(classify(Mode::Text, "exit mode"), Action::Exit);
        assert_eq!(classify(Mode::Text, "EXIT MODE"), Action::Exit);
        assert_eq!(classify(Mode::Text, "ok, exit mode now"), Action::Exit);
        assert_eq!(
            classify(Mode::Text, "please switch to voice mode"),
            Action::Switch(Mode::Voice)
        );
        assert_eq!(classify(Mode::Text, "hello"), Action::Chat);
        // Text-mode phrase means nothing while already in text mode
        assert_eq!(classify(Mode::Text, "text mode"), Action::Chat);
    }

    #[test]
    fn exit_checked_before_voice_in_text_mode() {
        assert_eq!(classify(Mode::Text, "voice mode or exit mode?"), Action::Exit);
    }

    #[test]
    fn voice_mode_transitions() {
        assert_eq!(classify(Mode::Voice, "Text Mode please"), Action::Switch(Mode::Text));
        assert_eq!(classify(Mode::Voice, "exit mode"), Action::Switch(Mode::Text));
        assert_eq!(classify(Mode::Voice, "what's the weather"), Action::Chat);
        assert_eq!(classify(Mode::Voice, "voice mode"), Action::Chat);
    }

    #[test]
    fn exit_from_voice_can_terminate() {
        let keywords = Keywords::default();
        assert_eq!(keywords.classify(Mode::Voice, "exit mode", true), Action::Exit);
        assert_eq!(
            keywords.classify(Mode::Voice, "text mode", true),
            Action::Switch(Mode::Text)
        );
    }

    #[test]
    fn blank_utterances_are_skipped() {
        assert_eq!(classify(Mode::Text, ""), Action::Skip);
        assert_eq!(classify(Mode::Voice, "   \t"), Action::Skip);
    }

    #[test]
    fn custom_keywords_are_normalized() {
        let keywords = Keywords::new("  Speak To Me ", "Type", "BYE").unwrap();
        assert_eq!(keywords.voice(), "speak to me");
        assert_eq!(
            keywords.classify(Mode::Text, "SPEAK TO ME", false),
            Action::Switch(Mode::Voice)
        );
        assert_eq!(keywords.classify(Mode::Text, "bye", false), Action::Exit);
    }

    #[test]
    fn blank_keyword_is_rejected() {
        assert!(Keywords::new("voice", "", "exit").is_err());
    }
}
