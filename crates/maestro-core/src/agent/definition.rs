//! Agent definitions: the delegatable task personas.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Where a definition came from. User registrations may shadow built-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentSource {
    BuiltIn,
    User,
}

/// Named configuration describing a delegatable agent: prompt, model, and
/// tool policy. Created once, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Unique key used to route tasks.
    pub agent_type: String,
    /// Advisory description of when to delegate to this agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_to_use: Option<String>,
    pub system_prompt: String,
    /// Concrete model name, empty string, or the `"inherit"` sentinel.
    #[serde(default)]
    pub model: String,
    pub source: AgentSource,
    /// Allow-list of tool names. `None` or exactly `["*"]` means all tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    /// Deny-list of tool names; always wins over the allow-list.
    #[serde(default)]
    pub disallowed_tools: Vec<String>,
    /// Whether parent conversation history may be injected into this agent.
    #[serde(default)]
    pub fork_context: bool,
}

impl AgentDefinition {
    pub fn new(agent_type: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            when_to_use: None,
            system_prompt: system_prompt.into(),
            model: String::new(),
            source: AgentSource::User,
            tools: None,
            disallowed_tools: Vec::new(),
            fork_context: false,
        }
    }

    pub fn with_when_to_use(mut self, when_to_use: impl Into<String>) -> Self {
        self.when_to_use = Some(when_to_use.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_source(mut self, source: AgentSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_disallowed_tools(mut self, disallowed: Vec<String>) -> Self {
        self.disallowed_tools = disallowed;
        self
    }

    pub fn with_fork_context(mut self, fork_context: bool) -> Self {
        self.fork_context = fork_context;
        self
    }

    /// Reject definitions missing the fields execution depends on. Nothing is
    /// silently defaulted.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.agent_type.is_empty() {
            return Err(AgentError::MissingAgentType);
        }
        if self.system_prompt.is_empty() {
            return Err(AgentError::MissingSystemPrompt(self.agent_type.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_agent_type() {
        let definition = AgentDefinition::new("", "prompt");
        let err = definition.validate().unwrap_err();
        assert!(err.to_string().contains("must have agentType"));
    }

    #[test]
    fn validate_rejects_empty_system_prompt() {
        let definition = AgentDefinition::new("Test", "");
        let err = definition.validate().unwrap_err();
        assert!(err.to_string().contains("must have systemPrompt"));
    }

    #[test]
    fn validate_accepts_complete_definition() {
        let definition = AgentDefinition::new("Test", "prompt").with_model("inherit");
        assert!(definition.validate().is_ok());
    }
}
