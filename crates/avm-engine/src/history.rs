//! History reconstruction: flat message log -> turn-structured view
//!
//! One-shot and pure. Produces the exact shape the live reducer would have
//! built had it processed the same messages as live events.

use std::collections::{HashMap, HashSet};

use avm_model::{
    AssistantConversation, AssistantConversationStatus, Block, Conversation, ErrorConversation,
    Message, TextBlock, TextBlockStatus, ToolBlock, ToolBlockStatus, ToolCallMessage,
    ToolResultMessage, UserConversation, UserConversationStatus,
};

use crate::env::Env;

/// The output of [`reconstruct`], ready to seed a
/// [`ConversationState`](crate::ConversationState).
#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    /// Turn-structured view in display order
    pub conversations: Vec<Conversation>,
    /// Every message id seen in the log, for duplicate-delivery guards
    pub message_ids: HashSet<String>,
    /// Always empty today: historical unresolved calls stay `executing` and
    /// are not routable by later live results. Kept so the view has the same
    /// shape the reducer maintains.
    pub pending_tool_calls: HashMap<String, String>,
}

/// Convert the full ordered message log for one thread into the view a user
/// should see when opening the thread.
pub fn reconstruct(messages: &[Message], env: &mut dyn Env) -> HistoryView {
    let mut view = HistoryView::default();

    // Pair results before walking: a result may precede its call in the log.
    let mut results_by_call_id: HashMap<&str, &ToolResultMessage> = HashMap::new();
    for msg in messages {
        if let Message::ToolResult(result) = msg {
            results_by_call_id.insert(result.tool_call_id.as_str(), result);
            view.message_ids.insert(result.id.clone());
        }
    }

    let mut calls_by_parent: HashMap<&str, Vec<&ToolCallMessage>> = HashMap::new();
    let mut orphan_calls: Vec<&ToolCallMessage> = Vec::new();
    for msg in messages {
        if let Message::ToolCall(call) = msg {
            match call.parent_id.as_deref() {
                Some(parent_id) => calls_by_parent.entry(parent_id).or_default().push(call),
                None => orphan_calls.push(call),
            }
            view.message_ids.insert(call.id.clone());
        }
    }

    let mut current: Option<AssistantConversation> = None;

    for msg in messages {
        match msg {
            // Already indexed above
            Message::ToolCall(_) | Message::ToolResult(_) => continue,

            Message::User(user) => {
                view.message_ids.insert(user.id.clone());
                flush(&mut view.conversations, &mut current);
                view.conversations
                    .push(Conversation::User(UserConversation {
                        id: user.id.clone(),
                        content: user.content.clone(),
                        timestamp: user.timestamp,
                        status: UserConversationStatus::Success,
                        error_code: None,
                    }));
            }

            Message::Assistant(assistant) => {
                view.message_ids.insert(assistant.id.clone());

                let mut blocks: Vec<Block> = Vec::new();
                let text = assistant.content.text_joined();
                if !text.is_empty() {
                    blocks.push(Block::Text(TextBlock {
                        id: format!("text_{}", assistant.id),
                        timestamp: assistant.timestamp,
                        content: text,
                        status: TextBlockStatus::Completed,
                    }));
                }
                if let Some(calls) = calls_by_parent.get(assistant.id.as_str()) {
                    blocks.extend(
                        calls
                            .iter()
                            .map(|call| Block::Tool(resolve_call(call, &results_by_call_id))),
                    );
                }

                match current.as_mut() {
                    // Consecutive assistant messages merge into one turn
                    Some(turn) => {
                        turn.message_ids.push(assistant.id.clone());
                        turn.blocks.extend(blocks);
                    }
                    None => {
                        current = Some(AssistantConversation {
                            id: format!("assistant_{}", assistant.id),
                            message_ids: vec![assistant.id.clone()],
                            timestamp: assistant.timestamp,
                            status: AssistantConversationStatus::Completed,
                            blocks,
                        });
                    }
                }
            }

            Message::Error(error) => {
                view.message_ids.insert(error.id.clone());
                flush(&mut view.conversations, &mut current);
                view.conversations
                    .push(Conversation::Error(ErrorConversation {
                        id: error.id.clone(),
                        content: error.content.clone(),
                        timestamp: error.timestamp,
                        error_code: error.error_code.clone(),
                    }));
            }
        }
    }

    flush(&mut view.conversations, &mut current);

    // Calls with no parent id collect into one synthetic trailing turn.
    if !orphan_calls.is_empty() {
        let blocks = orphan_calls
            .iter()
            .map(|call| Block::Tool(resolve_call(call, &results_by_call_id)))
            .collect();
        view.conversations
            .push(Conversation::Assistant(AssistantConversation {
                id: env.next_id("assistant_orphan"),
                message_ids: vec![],
                timestamp: orphan_calls[0].timestamp,
                status: AssistantConversationStatus::Completed,
                blocks,
            }));
    }

    view
}

fn flush(conversations: &mut Vec<Conversation>, current: &mut Option<AssistantConversation>) {
    if let Some(turn) = current.take() {
        conversations.push(Conversation::Assistant(turn));
    }
}

/// Build the tool block for a call, folding in its paired result when one
/// exists anywhere in the log. A call with no result renders as `executing`
/// indefinitely; that is a display fact, not an error.
fn resolve_call(
    call: &ToolCallMessage,
    results_by_call_id: &HashMap<&str, &ToolResultMessage>,
) -> ToolBlock {
    let result = results_by_call_id.get(call.tool_call.id.as_str());
    let status = match result {
        Some(result) if result.tool_result.is_error() => ToolBlockStatus::Error,
        Some(_) => ToolBlockStatus::Success,
        None => ToolBlockStatus::Executing,
    };
    ToolBlock {
        id: call.id.clone(),
        timestamp: call.timestamp,
        tool_call_id: call.tool_call.id.clone(),
        name: call.tool_call.name.clone(),
        input: call.tool_call.input.clone(),
        status,
        output: result.map(|r| r.tool_result.output.clone()),
        start_time: None,
        duration: result.map(|r| (r.timestamp - call.timestamp) as f64 / 1000.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::FixedEnv;
    use avm_model::ToolCallPayload;
    use serde_json::json;

    fn call_payload(id: &str, name: &str) -> ToolCallPayload {
        ToolCallPayload {
            id: id.to_string(),
            name: name.to_string(),
            input: json!({"arg": 1}),
        }
    }

    #[test]
    fn test_user_then_assistant_turns() {
        let messages = vec![
            Message::user("m1", 1000, "hi"),
            Message::assistant("m2", 2000, "hello"),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));

        assert_eq!(view.conversations.len(), 2);
        let user = view.conversations[0].as_user().unwrap();
        assert_eq!(user.id, "m1");
        assert_eq!(user.status, UserConversationStatus::Success);

        let assistant = view.conversations[1].as_assistant().unwrap();
        assert_eq!(assistant.id, "assistant_m2");
        assert_eq!(assistant.message_ids, vec!["m2"]);
        assert_eq!(assistant.status, AssistantConversationStatus::Completed);
        let text = assistant.blocks[0].as_text().unwrap();
        assert_eq!(text.content, "hello");
        assert_eq!(text.status, TextBlockStatus::Completed);
    }

    #[test]
    fn test_consecutive_assistant_messages_merge() {
        let messages = vec![
            Message::user("m1", 1, "q"),
            Message::assistant("m2", 2, "part one"),
            Message::assistant("m3", 3, "part two"),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));

        assert_eq!(view.conversations.len(), 2);
        let assistant = view.conversations[1].as_assistant().unwrap();
        assert_eq!(assistant.message_ids, vec!["m2", "m3"]);
        assert_eq!(assistant.blocks.len(), 2);
    }

    #[test]
    fn test_user_message_splits_assistant_turns() {
        let messages = vec![
            Message::assistant("m1", 1, "first"),
            Message::user("m2", 2, "again"),
            Message::assistant("m3", 3, "second"),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));

        assert_eq!(view.conversations.len(), 3);
        assert_eq!(view.conversations[0].as_assistant().unwrap().id, "assistant_m1");
        assert_eq!(view.conversations[2].as_assistant().unwrap().id, "assistant_m3");
    }

    #[test]
    fn test_tool_call_paired_with_result() {
        let messages = vec![
            Message::assistant("m1", 1000, "let me check"),
            Message::tool_call("m2", 2000, Some("m1".to_string()), call_payload("t1", "search")),
            Message::tool_result("m3", 5000, "t1", json!({"type": "text", "text": "found"})),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));

        assert_eq!(view.conversations.len(), 1);
        let assistant = view.conversations[0].as_assistant().unwrap();
        assert_eq!(assistant.blocks.len(), 2);
        let tool = assistant.blocks[1].as_tool().unwrap();
        assert_eq!(tool.tool_call_id, "t1");
        assert_eq!(tool.status, ToolBlockStatus::Success);
        assert_eq!(tool.output, Some(json!({"type": "text", "text": "found"})));
        assert_eq!(tool.duration, Some(3.0));
    }

    #[test]
    fn test_result_before_call_in_log() {
        // Pairing is order-independent: index first, pair later.
        let messages = vec![
            Message::tool_result("m1", 900, "t1", json!({"type": "text", "text": "ok"})),
            Message::assistant("m2", 1000, ""),
            Message::tool_call("m3", 1100, Some("m2".to_string()), call_payload("t1", "search")),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));

        let assistant = view.conversations[0].as_assistant().unwrap();
        // Empty assistant text produces no text block.
        assert_eq!(assistant.blocks.len(), 1);
        assert_eq!(
            assistant.blocks[0].as_tool().unwrap().status,
            ToolBlockStatus::Success
        );
    }

    #[test]
    fn test_error_typed_output_marks_block_error() {
        let messages = vec![
            Message::assistant("m1", 1, ""),
            Message::tool_call("m2", 2, Some("m1".to_string()), call_payload("t1", "run")),
            Message::tool_result("m3", 3, "t1", json!({"type": "error-text", "text": "boom"})),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));
        let tool = view.conversations[0].as_assistant().unwrap().blocks[0]
            .as_tool()
            .unwrap();
        assert_eq!(tool.status, ToolBlockStatus::Error);
    }

    #[test]
    fn test_unresolved_call_stays_executing() {
        let messages = vec![
            Message::assistant("m1", 1, "working"),
            Message::tool_call("m2", 2, Some("m1".to_string()), call_payload("t1", "search")),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));
        let tool = view.conversations[0].as_assistant().unwrap().blocks[1]
            .as_tool()
            .unwrap();
        assert_eq!(tool.status, ToolBlockStatus::Executing);
        assert_eq!(tool.output, None);
        assert_eq!(tool.duration, None);
        // Historical unresolved calls are not live-routable.
        assert!(view.pending_tool_calls.is_empty());
    }

    #[test]
    fn test_orphan_calls_collect_into_trailing_turn() {
        let messages = vec![
            Message::user("m1", 1, "q"),
            Message::tool_call("m2", 10, None, call_payload("t1", "search")),
            Message::tool_call("m3", 20, None, call_payload("t2", "fetch")),
            Message::tool_result("m4", 30, "t2", json!({"type": "text", "text": "ok"})),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));

        assert_eq!(view.conversations.len(), 2);
        let orphan_turn = view.conversations[1].as_assistant().unwrap();
        assert!(orphan_turn.id.starts_with("assistant_orphan_"));
        assert!(orphan_turn.message_ids.is_empty());
        assert_eq!(orphan_turn.timestamp, 10);
        assert_eq!(orphan_turn.status, AssistantConversationStatus::Completed);
        assert_eq!(orphan_turn.blocks.len(), 2);
        assert_eq!(
            orphan_turn.blocks[0].as_tool().unwrap().status,
            ToolBlockStatus::Executing
        );
        assert_eq!(
            orphan_turn.blocks[1].as_tool().unwrap().status,
            ToolBlockStatus::Success
        );
    }

    #[test]
    fn test_unmatched_result_is_dropped() {
        let messages = vec![
            Message::user("m1", 1, "q"),
            Message::tool_result("m2", 2, "t-unknown", json!({"type": "text", "text": "?"})),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));
        // No block anywhere surfaces the unmatched result.
        assert_eq!(view.conversations.len(), 1);
        assert!(view.conversations[0].as_user().is_some());
        // Its message id is still tracked for re-delivery detection.
        assert!(view.message_ids.contains("m2"));
    }

    #[test]
    fn test_error_message_flushes_open_turn() {
        let messages = vec![
            Message::assistant("m1", 1, "partial"),
            Message::Error(avm_model::ErrorMessage {
                id: "m2".to_string(),
                timestamp: 2,
                content: "runtime crashed".to_string(),
                error_code: Some("E_RUNTIME".to_string()),
            }),
            Message::assistant("m3", 3, "recovered"),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));

        assert_eq!(view.conversations.len(), 3);
        assert_eq!(view.conversations[0].as_assistant().unwrap().id, "assistant_m1");
        let Conversation::Error(error) = &view.conversations[1] else {
            panic!("expected error turn");
        };
        assert_eq!(error.error_code.as_deref(), Some("E_RUNTIME"));
        assert_eq!(view.conversations[2].as_assistant().unwrap().id, "assistant_m3");
    }

    #[test]
    fn test_call_with_unknown_parent_is_not_surfaced() {
        // A parented call whose parent never appears belongs to neither a
        // turn nor the orphan bucket.
        let messages = vec![
            Message::user("m1", 1, "q"),
            Message::tool_call("m2", 2, Some("missing".to_string()), call_payload("t1", "x")),
        ];
        let view = reconstruct(&messages, &mut FixedEnv::at(0));
        assert_eq!(view.conversations.len(), 1);
        assert!(view.message_ids.contains("m2"));
    }

    #[test]
    fn test_empty_log() {
        let view = reconstruct(&[], &mut FixedEnv::at(0));
        assert!(view.conversations.is_empty());
        assert!(view.message_ids.is_empty());
    }
}
