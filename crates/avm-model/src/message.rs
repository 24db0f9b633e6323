//! Persisted message types as emitted by the agent runtime
//!
//! The wire format is the runtime's JSON shape: messages are tagged by
//! `subtype` (kebab-case) and payload fields are camelCase.

use serde::{Deserialize, Serialize};

/// A discrete message from the per-thread message log.
///
/// Messages arrive in a total order per conversation thread, either replayed
/// as history or delivered live wrapped in stream events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "kebab-case")]
pub enum Message {
    /// A message the user sent
    User(UserMessage),
    /// An assistant response message
    Assistant(AssistantMessage),
    /// A tool invocation requested by the assistant
    ToolCall(ToolCallMessage),
    /// The output of a previously requested tool invocation
    ToolResult(ToolResultMessage),
    /// A runtime-level error surfaced into the log
    Error(ErrorMessage),
}

impl Message {
    /// Get the message id
    pub fn id(&self) -> &str {
        match self {
            Self::User(m) => &m.id,
            Self::Assistant(m) => &m.id,
            Self::ToolCall(m) => &m.id,
            Self::ToolResult(m) => &m.id,
            Self::Error(m) => &m.id,
        }
    }

    /// Get the message timestamp (ms since epoch)
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::User(m) => m.timestamp,
            Self::Assistant(m) => m.timestamp,
            Self::ToolCall(m) => m.timestamp,
            Self::ToolResult(m) => m.timestamp,
            Self::Error(m) => m.timestamp,
        }
    }

    /// Create a user message with plain text content
    pub fn user(id: impl Into<String>, timestamp: i64, text: impl Into<String>) -> Self {
        Self::User(UserMessage {
            id: id.into(),
            timestamp,
            content: MessageContent::Text(text.into()),
        })
    }

    /// Create an assistant message with plain text content
    pub fn assistant(id: impl Into<String>, timestamp: i64, text: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage {
            id: id.into(),
            timestamp,
            content: MessageContent::Text(text.into()),
        })
    }

    /// Create a tool-call message
    pub fn tool_call(
        id: impl Into<String>,
        timestamp: i64,
        parent_id: Option<String>,
        tool_call: ToolCallPayload,
    ) -> Self {
        Self::ToolCall(ToolCallMessage {
            id: id.into(),
            timestamp,
            parent_id,
            tool_call,
        })
    }

    /// Create a tool-result message
    pub fn tool_result(
        id: impl Into<String>,
        timestamp: i64,
        tool_call_id: impl Into<String>,
        output: serde_json::Value,
    ) -> Self {
        Self::ToolResult(ToolResultMessage {
            id: id.into(),
            timestamp,
            tool_call_id: tool_call_id.into(),
            tool_result: ToolResultPayload { output },
        })
    }
}

/// Message content: either a plain string or a list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenate the text parts, ignoring everything else.
    ///
    /// Both the history reconstructor and the live reducer use this exact
    /// extraction, so the two views agree on what text a message carries.
    pub fn text_joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A single typed content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
}

/// A message the user sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: String,
    pub timestamp: i64,
    pub content: MessageContent,
}

/// An assistant response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub id: String,
    pub timestamp: i64,
    pub content: MessageContent,
}

/// A tool invocation requested by the assistant.
///
/// `parent_id` names the assistant message this call belongs to; the runtime
/// omits it for calls it could not attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallMessage {
    pub id: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub tool_call: ToolCallPayload,
}

/// The tool-call descriptor carried by a [`ToolCallMessage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPayload {
    /// Correlation id shared with the eventual tool result
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool input as provided by the assistant
    pub input: serde_json::Value,
}

/// The output of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultMessage {
    pub id: String,
    pub timestamp: i64,
    pub tool_call_id: String,
    pub tool_result: ToolResultPayload,
}

/// The tool-result descriptor carried by a [`ToolResultMessage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultPayload {
    pub output: serde_json::Value,
}

impl ToolResultPayload {
    /// Whether this output represents a tool failure.
    ///
    /// An output is an error iff it is a JSON object whose `type` field
    /// equals `"error-text"`. Every component classifies results through
    /// this single rule.
    pub fn is_error(&self) -> bool {
        self.output
            .as_object()
            .and_then(|obj| obj.get("type"))
            .and_then(|value| value.as_str())
            .is_some_and(|kind| kind == "error-text")
    }
}

/// A runtime-level error surfaced into the message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub id: String,
    pub timestamp: i64,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_subtype_tags() {
        let msg = Message::user("m1", 1000, "hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["subtype"], "user");
        assert_eq!(value["content"], "hello");

        let msg = Message::tool_call(
            "m2",
            1001,
            Some("m1".to_string()),
            ToolCallPayload {
                id: "t1".to_string(),
                name: "search".to_string(),
                input: json!({"query": "rust"}),
            },
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["subtype"], "tool-call");
        assert_eq!(value["parentId"], "m1");
        assert_eq!(value["toolCall"]["id"], "t1");
    }

    #[test]
    fn test_tool_result_wire_shape() {
        let raw = json!({
            "subtype": "tool-result",
            "id": "m3",
            "timestamp": 1002,
            "toolCallId": "t1",
            "toolResult": { "output": { "type": "text", "text": "ok" } }
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        let Message::ToolResult(result) = msg else {
            panic!("expected tool-result");
        };
        assert_eq!(result.tool_call_id, "t1");
        assert!(!result.tool_result.is_error());
    }

    #[test]
    fn test_error_output_classification() {
        let error = ToolResultPayload {
            output: json!({"type": "error-text", "text": "boom"}),
        };
        assert!(error.is_error());

        let success = ToolResultPayload {
            output: json!({"type": "text", "text": "ok"}),
        };
        assert!(!success.is_error());

        // Non-object outputs are never errors
        let plain = ToolResultPayload {
            output: json!("just a string"),
        };
        assert!(!plain.is_error());

        let null = ToolResultPayload {
            output: serde_json::Value::Null,
        };
        assert!(!null.is_error());
    }

    #[test]
    fn test_content_text_joined() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: "Hello ".to_string(),
            },
            ContentPart::Image {
                url: "avm://img/1".to_string(),
                alt: None,
            },
            ContentPart::Text {
                text: "world".to_string(),
            },
        ]);
        assert_eq!(content.text_joined(), "Hello world");

        let plain: MessageContent = "plain".into();
        assert_eq!(plain.text_joined(), "plain");
    }

    #[test]
    fn test_parts_content_round_trip() {
        let raw = json!({
            "subtype": "user",
            "id": "m1",
            "timestamp": 5,
            "content": [{"type": "text", "text": "hi"}]
        });
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }
}
