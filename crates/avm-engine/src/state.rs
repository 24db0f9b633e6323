//! The aggregate conversation state owned by the reducer

use std::collections::{HashMap, HashSet};

use avm_model::{AgentStatus, AssistantConversation, Conversation, UiError};

use crate::history::HistoryView;

/// The aggregate root for one conversation thread.
///
/// Created fresh whenever the selected thread changes, seeded once by
/// history replay, then advanced one action at a time until the thread
/// changes again. Nothing outside the reducer mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    /// Display-ordered turns. Append-only; positions never shift.
    pub conversations: Vec<Conversation>,
    /// Every id observed so far (message ids from history, turn ids from
    /// live inserts). Checked before every insertion so no two turns share
    /// an id.
    conversation_ids: HashSet<String>,
    /// Arena-style index: turn id -> position in `conversations`.
    conversation_index: HashMap<String, usize>,
    /// Tool call id -> hosting turn id, held from block creation until the
    /// result is folded in.
    pub pending_tool_calls: HashMap<String, String>,
    /// The single assistant turn currently open for streaming, if any
    pub streaming_conversation_id: Option<String>,
    /// The in-progress text block, if any
    pub current_text_block_id: Option<String>,
    /// Append buffer for the in-progress text block; flushed into the block
    /// only when it finishes
    pub streaming_text: String,
    /// Transport/runtime errors surfaced to the UI
    pub errors: Vec<UiError>,
    /// Coarse status mirror, independent of per-turn status
    pub agent_status: AgentStatus,
}

impl ConversationState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an id has been seen (as a turn id or a history message id)
    pub fn contains_id(&self, id: &str) -> bool {
        self.conversation_ids.contains(id) || self.conversation_index.contains_key(id)
    }

    /// Position of the turn with the given id, if present
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.conversation_index.get(id).copied()
    }

    /// Append a turn, guarding against duplicate ids.
    ///
    /// Returns `false` (and leaves the state untouched) when the id was
    /// already seen.
    pub fn push_conversation(&mut self, conversation: Conversation) -> bool {
        let id = conversation.id().to_string();
        if self.contains_id(&id) {
            return false;
        }
        self.conversation_index
            .insert(id.clone(), self.conversations.len());
        self.conversation_ids.insert(id);
        self.conversations.push(conversation);
        true
    }

    /// Position of the streaming assistant turn, if one is open
    pub fn streaming_index(&self) -> Option<usize> {
        let id = self.streaming_conversation_id.as_deref()?;
        let index = self.index_of(id)?;
        self.conversations[index].as_assistant().map(|_| index)
    }

    /// The streaming assistant turn, mutably
    pub fn streaming_assistant_mut(&mut self) -> Option<&mut AssistantConversation> {
        let index = self.streaming_index()?;
        self.conversations[index].as_assistant_mut()
    }

    /// The assistant turn with the given id, mutably
    pub fn assistant_mut(&mut self, id: &str) -> Option<&mut AssistantConversation> {
        let index = self.index_of(id)?;
        self.conversations[index].as_assistant_mut()
    }

    /// Whether the agent is actively working (drives UI spinners)
    pub fn is_loading(&self) -> bool {
        self.agent_status.is_busy()
    }

    /// Replace the conversation view with a reconstructed history, keeping
    /// errors and agent status, and closing any streaming bookkeeping.
    pub(crate) fn load_history(&mut self, view: HistoryView) {
        self.conversation_index = view
            .conversations
            .iter()
            .enumerate()
            .map(|(index, conv)| (conv.id().to_string(), index))
            .collect();
        self.conversations = view.conversations;
        self.conversation_ids = view.message_ids;
        self.pending_tool_calls = view.pending_tool_calls;
        self.streaming_conversation_id = None;
        self.current_text_block_id = None;
        self.streaming_text.clear();
    }
}
