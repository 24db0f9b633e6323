//! Conversation (turn) types: the displayed units of dialogue

use crate::block::Block;
use crate::message::MessageContent;
use serde::{Deserialize, Serialize};

/// One displayed unit of dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Conversation {
    /// A user turn
    User(UserConversation),
    /// An assistant turn, made of blocks
    Assistant(AssistantConversation),
    /// A standalone error turn
    Error(ErrorConversation),
}

impl Conversation {
    /// Get the conversation id
    pub fn id(&self) -> &str {
        match self {
            Self::User(c) => &c.id,
            Self::Assistant(c) => &c.id,
            Self::Error(c) => &c.id,
        }
    }

    /// Get the conversation timestamp
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::User(c) => c.timestamp,
            Self::Assistant(c) => c.timestamp,
            Self::Error(c) => c.timestamp,
        }
    }

    /// Get the user turn if this is one
    pub fn as_user(&self) -> Option<&UserConversation> {
        match self {
            Self::User(c) => Some(c),
            _ => None,
        }
    }

    /// Get the user turn mutably if this is one
    pub fn as_user_mut(&mut self) -> Option<&mut UserConversation> {
        match self {
            Self::User(c) => Some(c),
            _ => None,
        }
    }

    /// Get the assistant turn if this is one
    pub fn as_assistant(&self) -> Option<&AssistantConversation> {
        match self {
            Self::Assistant(c) => Some(c),
            _ => None,
        }
    }

    /// Get the assistant turn mutably if this is one
    pub fn as_assistant_mut(&mut self) -> Option<&mut AssistantConversation> {
        match self {
            Self::Assistant(c) => Some(c),
            _ => None,
        }
    }
}

/// Status of a user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserConversationStatus {
    /// Sent to the runtime, not yet acknowledged
    Pending,
    Success,
    Error,
    Interrupted,
}

/// A user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConversation {
    pub id: String,
    pub content: MessageContent,
    pub timestamp: i64,
    pub status: UserConversationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Status of an assistant turn: `queued -> processing -> thinking <-> streaming
/// -> completed`. `completed` is terminal; a finished turn only reopens as a
/// brand-new turn with a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantConversationStatus {
    Queued,
    Processing,
    Thinking,
    Streaming,
    Completed,
}

impl AssistantConversationStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// An assistant turn.
///
/// `message_ids` lists the persisted assistant messages merged into this
/// turn; consecutive assistant messages with no intervening user or error
/// message collapse into one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConversation {
    pub id: String,
    pub message_ids: Vec<String>,
    pub timestamp: i64,
    pub status: AssistantConversationStatus,
    pub blocks: Vec<Block>,
}

/// A standalone error turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorConversation {
    pub id: String,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}
