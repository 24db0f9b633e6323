//! Coarse agent status and UI-surfaced errors

use serde::{Deserialize, Serialize};

/// Error code set on a user turn whose dispatch to the runtime failed
pub const SEND_FAILED: &str = "SEND_FAILED";

/// Coarse-grained agent status mirrored for the UI.
///
/// Independent of per-turn status; tracks what the runtime reports it is
/// doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Thinking,
    Responding,
    PlanningTool,
    AwaitingToolResult,
    Error,
}

impl AgentStatus {
    /// Whether the agent is actively working on a response
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Thinking | Self::Responding | Self::PlanningTool | Self::AwaitingToolResult
        )
    }
}

/// A transport or runtime error surfaced to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiError {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_status_wire_names() {
        assert_eq!(
            serde_json::to_value(AgentStatus::PlanningTool).unwrap(),
            "planning_tool"
        );
        assert_eq!(
            serde_json::to_value(AgentStatus::AwaitingToolResult).unwrap(),
            "awaiting_tool_result"
        );
    }

    #[test]
    fn test_busy_statuses() {
        assert!(AgentStatus::Thinking.is_busy());
        assert!(AgentStatus::Responding.is_busy());
        assert!(!AgentStatus::Idle.is_busy());
        assert!(!AgentStatus::Error.is_busy());
    }
}
