//! The live reducer: one inbound action at a time, in arrival order
//!
//! Pure state transition. Ownership in, ownership out: the caller hands over
//! the prior state and receives the next one, which is how the
//! immutable-in/immutable-out contract reads in Rust. Illegal or
//! out-of-order actions degrade to no-ops; the reducer sits on the event
//! delivery hot path and must never panic or throw.

use avm_model::{
    AssistantConversation, AssistantConversationStatus, Block, Conversation, ErrorConversation,
    TextBlock, TextBlockStatus, ToolBlock, ToolBlockStatus, UserConversationStatus,
};

use crate::action::Action;
use crate::env::Env;
use crate::history;
use crate::state::ConversationState;

/// Fold one action into the state.
pub fn reduce(mut state: ConversationState, action: Action, env: &mut dyn Env) -> ConversationState {
    match action {
        Action::Reset => ConversationState::new(),

        Action::LoadHistory { messages } => {
            let view = history::reconstruct(&messages, env);
            state.load_history(view);
            state
        }

        Action::UserAdd { conversation } => {
            state.push_conversation(Conversation::User(conversation));
            state
        }

        Action::UserStatus { status, error_code } => {
            // Last-pending-wins: at most one outstanding user send is
            // expected, so the most recent still-pending user turn is the
            // one this status belongs to.
            if let Some(user) = state
                .conversations
                .iter_mut()
                .rev()
                .filter_map(Conversation::as_user_mut)
                .find(|user| user.status == UserConversationStatus::Pending)
            {
                user.status = status;
                user.error_code = error_code;
            }
            state
        }

        Action::AssistantStart { id } => {
            if state.contains_id(&id) {
                return state;
            }
            let turn = AssistantConversation {
                id: id.clone(),
                message_ids: vec![],
                timestamp: env.now_ms(),
                status: AssistantConversationStatus::Queued,
                blocks: vec![],
            };
            state.push_conversation(Conversation::Assistant(turn));
            state.streaming_conversation_id = Some(id);
            state.current_text_block_id = None;
            state.streaming_text.clear();
            state
        }

        Action::AssistantStatus { status } => {
            if let Some(turn) = state.streaming_assistant_mut() {
                turn.status = status;
            }
            state
        }

        Action::AssistantMessageStart { message_id } => {
            if let Some(turn) = state.streaming_assistant_mut() {
                turn.message_ids.push(message_id);
            }
            state
        }

        Action::AssistantFinish => {
            finish_current_text_block(&mut state);
            let Some(turn) = state.streaming_assistant_mut() else {
                return state;
            };
            turn.status = AssistantConversationStatus::Completed;
            state.streaming_conversation_id = None;
            state.current_text_block_id = None;
            state.streaming_text.clear();
            state
        }

        Action::TextDelta { text } => {
            if state.streaming_index().is_none() {
                return state;
            }
            if state.current_text_block_id.is_some() {
                // Deltas accumulate in the buffer only; the block's content
                // is written once, on finish.
                state.streaming_text.push_str(&text);
                return state;
            }
            let block = TextBlock {
                id: env.next_id("text"),
                timestamp: env.now_ms(),
                content: String::new(),
                status: TextBlockStatus::Streaming,
            };
            let block_id = block.id.clone();
            if let Some(turn) = state.streaming_assistant_mut() {
                turn.blocks.push(Block::Text(block));
                state.current_text_block_id = Some(block_id);
                state.streaming_text = text;
            }
            state
        }

        Action::TextFinish => {
            finish_current_text_block(&mut state);
            state
        }

        Action::ToolPlanning {
            tool_call_id,
            tool_name,
        } => {
            // Text and tool blocks never interleave within a sub-step.
            if state.current_text_block_id.is_some() {
                finish_current_text_block(&mut state);
            }

            let now = env.now_ms();
            match state.streaming_index() {
                Some(index) => {
                    let host_id = state.conversations[index].id().to_string();
                    let block = planning_block(env.next_id("tool"), &tool_call_id, &tool_name, now);
                    if let Some(turn) = state.conversations[index].as_assistant_mut() {
                        turn.blocks.push(Block::Tool(block));
                        state.pending_tool_calls.insert(tool_call_id, host_id);
                    }
                }
                None => {
                    // No turn is open yet; synthesize one to host the block.
                    let turn_id = env.next_id("assistant");
                    let block = planning_block(env.next_id("tool"), &tool_call_id, &tool_name, now);
                    let turn = AssistantConversation {
                        id: turn_id.clone(),
                        message_ids: vec![],
                        timestamp: now,
                        status: AssistantConversationStatus::Streaming,
                        blocks: vec![Block::Tool(block)],
                    };
                    if state.push_conversation(Conversation::Assistant(turn)) {
                        state.pending_tool_calls.insert(tool_call_id, turn_id.clone());
                        state.streaming_conversation_id = Some(turn_id);
                    }
                }
            }
            state
        }

        Action::ToolAdd { message } => {
            if state.current_text_block_id.is_some() {
                finish_current_text_block(&mut state);
            }

            let call_id = message.tool_call.id.clone();

            // Planning preceded the add: upgrade the existing block in place
            // instead of inserting a duplicate.
            if let Some(host_id) = state.pending_tool_calls.get(&call_id).cloned() {
                if let Some(turn) = state.assistant_mut(&host_id) {
                    if let Some(block) = turn
                        .blocks
                        .iter_mut()
                        .filter_map(Block::as_tool_mut)
                        .find(|block| block.tool_call_id == call_id)
                    {
                        block.input = message.tool_call.input.clone();
                        block.status = ToolBlockStatus::Executing;
                        return state;
                    }
                }
            }

            // Host resolution: the turn holding the call's parent message,
            // else the streaming turn, else a synthesized orphan turn.
            let host_index = message
                .parent_id
                .as_deref()
                .and_then(|parent_id| {
                    state.conversations.iter().position(|conv| {
                        conv.as_assistant()
                            .is_some_and(|turn| turn.message_ids.iter().any(|id| id == parent_id))
                    })
                })
                .or_else(|| state.streaming_index());

            let now = env.now_ms();
            match host_index {
                Some(index) => {
                    let host_id = state.conversations[index].id().to_string();
                    let block = ToolBlock {
                        id: message.id.clone(),
                        timestamp: message.timestamp,
                        tool_call_id: call_id.clone(),
                        name: message.tool_call.name.clone(),
                        input: message.tool_call.input.clone(),
                        status: ToolBlockStatus::Executing,
                        output: None,
                        start_time: Some(now),
                        duration: None,
                    };
                    if let Some(turn) = state.conversations[index].as_assistant_mut() {
                        turn.blocks.push(Block::Tool(block));
                        state.pending_tool_calls.insert(call_id, host_id);
                    }
                }
                None => {
                    let turn_id = format!("assistant_for_{}", message.id);
                    let block = ToolBlock {
                        id: message.id.clone(),
                        timestamp: message.timestamp,
                        tool_call_id: call_id.clone(),
                        name: message.tool_call.name.clone(),
                        input: message.tool_call.input.clone(),
                        status: ToolBlockStatus::Executing,
                        output: None,
                        start_time: Some(now),
                        duration: None,
                    };
                    let turn = AssistantConversation {
                        id: turn_id.clone(),
                        message_ids: message.parent_id.iter().cloned().collect(),
                        timestamp: message.timestamp,
                        status: AssistantConversationStatus::Streaming,
                        blocks: vec![Block::Tool(block)],
                    };
                    if state.push_conversation(Conversation::Assistant(turn)) {
                        state.pending_tool_calls.insert(call_id, turn_id.clone());
                        state.streaming_conversation_id = Some(turn_id);
                    }
                }
            }
            state
        }

        Action::ToolResult { message } => {
            // No pending call means no host to attach to; the result is
            // dropped, mirroring the reconstructor's orphan-result policy.
            let Some(host_id) = state.pending_tool_calls.get(&message.tool_call_id).cloned() else {
                return state;
            };
            let is_error = message.tool_result.is_error();
            let now = env.now_ms();
            let Some(turn) = state.assistant_mut(&host_id) else {
                return state;
            };
            let Some(block) = turn
                .blocks
                .iter_mut()
                .filter_map(Block::as_tool_mut)
                .find(|block| block.tool_call_id == message.tool_call_id)
            else {
                return state;
            };
            block.status = if is_error {
                ToolBlockStatus::Error
            } else {
                ToolBlockStatus::Success
            };
            block.output = Some(message.tool_result.output.clone());
            block.duration = Some(
                block
                    .start_time
                    .map(|start| (now - start) as f64 / 1000.0)
                    .unwrap_or(0.0),
            );
            state.pending_tool_calls.remove(&message.tool_call_id);
            state
        }

        Action::ErrorConversationAdd { message } => {
            let turn = ErrorConversation {
                id: message.id.clone(),
                content: message.content,
                timestamp: message.timestamp,
                error_code: message.error_code,
            };
            if state.push_conversation(Conversation::Error(turn)) {
                state.streaming_conversation_id = None;
                state.current_text_block_id = None;
                state.streaming_text.clear();
            }
            state
        }

        Action::ErrorAdd { error } => {
            state.errors.push(error);
            state
        }

        Action::ErrorsClear => {
            state.errors.clear();
            state
        }

        Action::SetAgentStatus { status } => {
            state.agent_status = status;
            state
        }
    }
}

/// Copy the streaming buffer into the open text block and complete it.
/// No-op when no text block is open or the block cannot be located.
fn finish_current_text_block(state: &mut ConversationState) {
    let Some(block_id) = state.current_text_block_id.clone() else {
        return;
    };
    let text = state.streaming_text.clone();
    let Some(turn) = state.streaming_assistant_mut() else {
        return;
    };
    let Some(block) = turn
        .blocks
        .iter_mut()
        .filter_map(Block::as_text_mut)
        .find(|block| block.id == block_id)
    else {
        return;
    };
    block.content = text;
    block.status = TextBlockStatus::Completed;
    state.current_text_block_id = None;
    state.streaming_text.clear();
}

fn planning_block(id: String, tool_call_id: &str, tool_name: &str, now: i64) -> ToolBlock {
    ToolBlock {
        id,
        timestamp: now,
        tool_call_id: tool_call_id.to_string(),
        name: tool_name.to_string(),
        input: serde_json::Value::Object(serde_json::Map::new()),
        status: ToolBlockStatus::Planning,
        output: None,
        start_time: Some(now),
        duration: None,
    }
}
