//! avm-model: shared data model for the agent VM client
//!
//! This crate defines the message types received from the agent runtime and
//! the block/conversation view types the conversation engine produces. It is
//! a leaf crate with no I/O.

pub mod block;
pub mod conversation;
pub mod message;
pub mod status;

pub use block::{Block, ImageBlock, TextBlock, TextBlockStatus, ToolBlock, ToolBlockStatus};
pub use conversation::{
    AssistantConversation, AssistantConversationStatus, Conversation, ErrorConversation,
    UserConversation, UserConversationStatus,
};
pub use message::{
    AssistantMessage, ContentPart, ErrorMessage, Message, MessageContent, ToolCallMessage,
    ToolCallPayload, ToolResultMessage, ToolResultPayload, UserMessage,
};
pub use status::{AgentStatus, UiError, SEND_FAILED};
