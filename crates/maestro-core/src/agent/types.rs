//! Agent execution results and task inputs.

use serde::{Deserialize, Serialize};

/// Terminal status of an agent run. Callers branch only on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Completed,
    Failed,
}

/// Token usage attributed to a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// The one result every run produces, fully populated on both paths.
///
/// On failure, `content` is the human-readable explanation; counters and
/// usage are zeroed rather than absent so callers never handle partial data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionResult {
    pub status: AgentStatus,
    pub agent_id: String,
    /// Final textual answer, or the failure explanation.
    pub content: String,
    pub total_tool_calls: usize,
    /// Wall-clock duration in milliseconds.
    pub total_duration_ms: u64,
    pub usage: TokenUsage,
}

impl AgentExecutionResult {
    pub fn failed(agent_id: impl Into<String>, content: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            status: AgentStatus::Failed,
            agent_id: agent_id.into(),
            content: content.into(),
            total_tool_calls: 0,
            total_duration_ms: duration_ms,
            usage: TokenUsage::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AgentStatus::Completed
    }
}

/// A task routed through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    /// Agent type to delegate to.
    pub subagent_type: String,
    pub prompt: String,
    /// Per-invocation model override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Agent id of a prior conversation to resume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
}

impl TaskInput {
    pub fn new(subagent_type: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            subagent_type: subagent_type.into(),
            prompt: prompt.into(),
            model: None,
            resume: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_resume(mut self, agent_id: impl Into<String>) -> Self {
        self.resume = Some(agent_id.into());
        self
    }
}
