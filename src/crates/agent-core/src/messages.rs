//! Message Types - Role-Tagged Prompt Transcripts
//!
//! Every completion request sent to an [`LlmClient`](crate::LlmClient) is a
//! [`Transcript`]: exactly one system message followed by exactly one user
//! message. No conversation history is carried between calls, so the
//! transcript type only admits that shape.
//!
//! # Quick Start
//!
//! ```rust
//! use agent_core::{Role, Transcript};
//!
//! let transcript = Transcript::new("You are a helpful assistant.", "What is Rust?");
//!
//! assert_eq!(transcript.system().role(), Role::System);
//! assert_eq!(transcript.user().content(), "What is Rust?");
//! assert_eq!(transcript.messages().len(), 2);
//! ```
//!
//! # Serialization Format
//!
//! Transcripts serialize to the array shape chat APIs expect:
//!
//! ```json
//! [
//!   {"role": "system", "content": "You are a helpful assistant."},
//!   {"role": "user", "content": "What is Rust?"}
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and context for the model
    System,

    /// The request being answered
    User,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Role of the sender
    pub fn role(&self) -> Role {
        self.role
    }

    /// Text content
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The exact ordered messages sent in one completion request
///
/// Always `[system, user]`. Built once and never mutated, so a caller can
/// keep it next to the raw response for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: [Message; 2],
}

impl Transcript {
    /// Build a transcript from the system prompt and the user request
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: [Message::system(system), Message::user(user)],
        }
    }

    /// The system message
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// The user message
    pub fn user(&self) -> &Message {
        &self.messages[1]
    }

    /// Both messages, in send order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

impl<'de> Deserialize<'de> for Transcript {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let messages = Vec::<Message>::deserialize(deserializer)?;
        match messages.as_slice() {
            [system, user] if system.role == Role::System && user.role == Role::User => {
                Ok(Transcript::new(system.content.clone(), user.content.clone()))
            }
            _ => Err(D::Error::custom(
                "transcript must be exactly one system message followed by one user message",
            )),
        }
    }
}
