//! Message and usage types shared across the runtime.
//!
//! These are domain types: the executor stamps, logs, and forwards them, and
//! the session log persists them one per line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Discriminant tag for the payload a message carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    ToolUse,
    ToolResult,
    Thinking,
}

/// A single conversation message.
///
/// `parent_id` links a message to the one it responds to; the history is a
/// chain, and only the immediate parent is ever looked up. `metadata` is an
/// open bag — the executor adds `agentId` and `agentType` so sub-agent output
/// stays attributable in a shared stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub role: Role,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Message {
    /// Create a message with a fresh id and the current timestamp.
    pub fn new(role: Role, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: None,
            role,
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    /// Fresh user text message, the root of a new turn (no parent).
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, MessageKind::Text, content)
    }

    /// Assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageKind::Text, content)
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Stamp agent attribution metadata. Existing keys are overwritten so the
    /// executing agent always wins over whatever the driver put there.
    pub fn stamp_agent(&mut self, agent_id: &str, agent_type: &str) {
        self.metadata
            .insert("agentId".to_string(), Value::String(agent_id.to_string()));
        self.metadata.insert(
            "agentType".to_string(),
            Value::String(agent_type.to_string()),
        );
    }

    /// The `agentId` metadata stamp, if present.
    pub fn agent_id(&self) -> Option<&str> {
        self.metadata.get("agentId").and_then(Value::as_str)
    }
}

/// Token usage reported by the loop driver for a full run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_agent_overwrites_existing_attribution() {
        let mut msg = Message::assistant("hello");
        msg.metadata.insert(
            "agentId".to_string(),
            Value::String("stale".to_string()),
        );

        msg.stamp_agent("agent-1", "Explore");

        assert_eq!(msg.agent_id(), Some("agent-1"));
        assert_eq!(
            msg.metadata.get("agentType").and_then(Value::as_str),
            Some("Explore")
        );
    }

    #[test]
    fn message_round_trips_through_json() {
        let msg = Message::user("do the thing").with_parent("m-0");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, msg.id);
        assert_eq!(back.parent_id.as_deref(), Some("m-0"));
        assert_eq!(back.role, Role::User);
        assert_eq!(back.kind, MessageKind::Text);
    }
}
