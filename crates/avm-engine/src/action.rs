//! Actions: the only mutation entry point for the conversation state

use avm_model::{
    AgentStatus, AssistantConversationStatus, ErrorMessage, Message, ToolCallMessage,
    ToolResultMessage, UiError, UserConversation, UserConversationStatus,
};

/// One state transition, derived from exactly one inbound event or one local
/// UI intent. Dispatched in arrival order by a single-threaded loop.
#[derive(Debug, Clone)]
pub enum Action {
    /// Discard everything; the selected thread changed
    Reset,
    /// Seed the state from a replayed message log
    LoadHistory { messages: Vec<Message> },

    /// Append a user turn (usually `pending`, just sent)
    UserAdd { conversation: UserConversation },
    /// Update the most recent still-pending user turn
    UserStatus {
        status: UserConversationStatus,
        error_code: Option<String>,
    },

    /// Open a new assistant turn for streaming
    AssistantStart { id: String },
    /// Update the streaming assistant turn's status
    AssistantStatus { status: AssistantConversationStatus },
    /// Record a persisted message id on the streaming assistant turn
    AssistantMessageStart { message_id: String },
    /// Close the streaming assistant turn; the only transition that
    /// completes a turn
    AssistantFinish,

    /// Append streamed text to the open text block (creating one if needed)
    TextDelta { text: String },
    /// Flush the streaming buffer into the open text block and complete it
    TextFinish,

    /// The runtime announced a tool call before its full input is known
    ToolPlanning {
        tool_call_id: String,
        tool_name: String,
    },
    /// The full tool-call message arrived
    ToolAdd { message: ToolCallMessage },
    /// The tool-result message arrived
    ToolResult { message: ToolResultMessage },

    /// Append a standalone error turn
    ErrorConversationAdd { message: ErrorMessage },
    /// Surface a transport/runtime error to the UI
    ErrorAdd { error: UiError },
    /// Clear surfaced errors
    ErrorsClear,

    /// Update the coarse agent status mirror
    SetAgentStatus { status: AgentStatus },
}
