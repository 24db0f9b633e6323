//! Block types: the atomic renderable units inside an assistant turn

use serde::{Deserialize, Serialize};

/// A renderable unit inside an assistant turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// A span of assistant text
    Text(TextBlock),
    /// A tool invocation with its lifecycle state
    Tool(ToolBlock),
    /// An image attachment (populated by other collaborators, never by the
    /// conversation engine itself)
    Image(ImageBlock),
}

impl Block {
    /// Get the block id
    pub fn id(&self) -> &str {
        match self {
            Self::Text(b) => &b.id,
            Self::Tool(b) => &b.id,
            Self::Image(b) => &b.id,
        }
    }

    /// Get the text block if this is one
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Self::Text(b) => Some(b),
            _ => None,
        }
    }

    /// Get the text block mutably if this is one
    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Self::Text(b) => Some(b),
            _ => None,
        }
    }

    /// Get the tool block if this is one
    pub fn as_tool(&self) -> Option<&ToolBlock> {
        match self {
            Self::Tool(b) => Some(b),
            _ => None,
        }
    }

    /// Get the tool block mutably if this is one
    pub fn as_tool_mut(&mut self) -> Option<&mut ToolBlock> {
        match self {
            Self::Tool(b) => Some(b),
            _ => None,
        }
    }
}

/// Lifecycle of a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBlockStatus {
    /// Deltas are still arriving; `content` is not authoritative yet
    Streaming,
    /// Content is final
    Completed,
}

/// A span of assistant text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub id: String,
    pub timestamp: i64,
    pub content: String,
    pub status: TextBlockStatus,
}

/// Lifecycle of a tool block: `planning -> executing -> success | error`.
///
/// The planning phase is advisory; a block may be created directly in
/// `executing` when the call message arrives before any planning signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolBlockStatus {
    Planning,
    Executing,
    Success,
    Error,
}

/// A tool invocation and, once paired, its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolBlock {
    pub id: String,
    pub timestamp: i64,
    /// Correlation id shared with the tool result
    pub tool_call_id: String,
    pub name: String,
    pub input: serde_json::Value,
    pub status: ToolBlockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// When execution started (ms since epoch), for live duration tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Execution duration in seconds, set when the result is folded in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// An image attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    pub id: String,
    pub timestamp: i64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_tag_shape() {
        let block = Block::Tool(ToolBlock {
            id: "b1".to_string(),
            timestamp: 1,
            tool_call_id: "t1".to_string(),
            name: "search".to_string(),
            input: json!({}),
            status: ToolBlockStatus::Planning,
            output: None,
            start_time: Some(1),
            duration: None,
        });
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool");
        assert_eq!(value["toolCallId"], "t1");
        assert_eq!(value["status"], "planning");
        assert!(value.get("output").is_none());
    }
}
