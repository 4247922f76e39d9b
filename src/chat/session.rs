//! In-memory conversation history

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Role name as used on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One entry in the conversation
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Append-only history of a single conversation
///
/// Turns are only ever pushed; nothing is removed or rewritten.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    turns: Vec<Turn>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    /// Start an empty session
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
        }
    }

    /// Record a completed exchange
    pub fn record_exchange(&mut self, user: &str, model: &str) {
        let at = Utc::now();
        self.turns.push(Turn {
            role: Role::User,
            text: user.to_string(),
            at,
        });
        self.turns.push(Turn {
            role: Role::Model,
            text: model.to_string(),
            at,
        });
        tracing::trace!(session = %self.id, turns = self.turns.len(), "exchange recorded");
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
