//! Agent event types as delivered over the runtime event stream

use serde::{Deserialize, Serialize};

use avm_model::{ErrorMessage, ToolCallMessage, ToolResultMessage};

use crate::error::Result;

/// Routing metadata attached to every event.
///
/// `thread_id` names the conversation thread the event belongs to. Events
/// without one are broadcast and apply to every session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// One event as it arrives on the wire: routing context plus the event body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub context: EventContext,
    #[serde(flatten)]
    pub event: AgentEvent,
}

impl Envelope {
    /// Decode an envelope from its wire JSON
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Wrap an event with no routing context (a broadcast)
    pub fn broadcast(event: AgentEvent) -> Self {
        Self {
            context: EventContext::default(),
            event,
        }
    }

    /// Wrap an event addressed to one thread
    pub fn for_thread(thread_id: impl Into<String>, event: AgentEvent) -> Self {
        Self {
            context: EventContext {
                thread_id: Some(thread_id.into()),
            },
            event,
        }
    }
}

/// Events emitted by the agent runtime during a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum AgentEvent {
    /// The runtime accepted the turn and started working
    ConversationStart,

    /// The runtime is reasoning before producing output
    ConversationThinking,

    /// The runtime is streaming response text
    ConversationResponding,

    /// The turn finished; no further events for it will arrive
    ConversationEnd,

    /// A persisted assistant message opened within the current turn
    MessageStart { message_id: String },

    /// A chunk of streamed response text
    TextDelta { delta: String },

    /// The runtime is preparing to invoke a tool
    ToolExecuting,

    /// A tool call was announced before its full input is known
    ToolUseStart {
        tool_call_id: String,
        tool_name: String,
    },

    /// The full assistant message was persisted
    AssistantMessage { message: avm_model::AssistantMessage },

    /// The full tool-call message was persisted
    ToolCallMessage { message: ToolCallMessage },

    /// The tool-result message was persisted
    ToolResultMessage { message: ToolResultMessage },

    /// A runtime error was persisted into the message log
    ErrorMessage { message: ErrorMessage },

    /// A transient error occurred outside the message log
    ErrorOccurred {
        code: String,
        message: String,
        recoverable: bool,
    },
}

impl AgentEvent {
    /// Check if this event ends the current turn
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentEvent::ConversationEnd | AgentEvent::ErrorOccurred { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shape() {
        let raw = r#"{
            "context": { "threadId": "t1" },
            "type": "text_delta",
            "data": { "delta": "Hel" }
        }"#;
        let envelope = Envelope::from_json(raw).unwrap();
        assert_eq!(envelope.context.thread_id.as_deref(), Some("t1"));
        assert_eq!(
            envelope.event,
            AgentEvent::TextDelta {
                delta: "Hel".to_string()
            }
        );
    }

    #[test]
    fn test_unit_event_has_no_data() {
        let envelope = Envelope::for_thread("t1", AgentEvent::ConversationEnd);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "conversation_end");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_missing_context_is_broadcast() {
        let raw = r#"{ "type": "conversation_start" }"#;
        let envelope = Envelope::from_json(raw).unwrap();
        assert_eq!(envelope.context.thread_id, None);
        assert_eq!(envelope.event, AgentEvent::ConversationStart);
    }

    #[test]
    fn test_tool_use_start_field_names() {
        let raw = json!({
            "type": "tool_use_start",
            "data": { "toolCallId": "t1", "toolName": "search" }
        });
        let envelope: Envelope = serde_json::from_value(raw).unwrap();
        assert_eq!(
            envelope.event,
            AgentEvent::ToolUseStart {
                tool_call_id: "t1".to_string(),
                tool_name: "search".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_event_is_decode_error() {
        let err = Envelope::from_json(r#"{ "type": "no_such_event" }"#).unwrap_err();
        assert!(matches!(err, crate::Error::Decode(_)));
    }

    #[test]
    fn test_terminal_events() {
        assert!(AgentEvent::ConversationEnd.is_terminal());
        assert!(
            AgentEvent::ErrorOccurred {
                code: "E".to_string(),
                message: "bad".to_string(),
                recoverable: false,
            }
            .is_terminal()
        );
        assert!(!AgentEvent::ConversationStart.is_terminal());
    }
}
