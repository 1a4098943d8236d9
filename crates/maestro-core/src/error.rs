//! Error taxonomy for agent execution and task routing.
//!
//! Two tiers, deliberately kept apart:
//! - [`UnknownAgentTypeError`] is raised synchronously by the registry for a
//!   misrouted request, before any resources are committed.
//! - [`AgentError`] covers everything that can go wrong mid-execution. It is
//!   never surfaced as an `Err` from the executor; every variant converges to
//!   a `Failed` [`crate::AgentExecutionResult`] with a readable message.

use thiserror::Error;

/// Failures that can occur during an agent run.
///
/// The executor formats these into the `content` field of a `Failed` result,
/// so the messages are written for humans reading a transcript.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent definition must have agentType")]
    MissingAgentType,

    #[error("Agent '{0}' must have systemPrompt")]
    MissingSystemPrompt(String),

    #[error("Agent '{0}' has no available tools after filtering.")]
    NoAvailableTools(String),

    #[error("No model specified for agent '{0}'")]
    NoModelSpecified(String),

    #[error("failed to resolve model '{name}': {reason}")]
    ModelResolutionFailed { name: String, reason: String },

    #[error("Agent execution was cancelled")]
    Cancelled,

    #[error("{0}")]
    Unexpected(String),
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Unexpected(err.to_string())
    }
}

/// Raised when a task names an agent type the registry does not know.
///
/// This is a caller bug (bad routing), not an execution failure, so it is the
/// one error surfaced as an `Err` instead of a `Failed` result. The message
/// lists the valid types to make the misroute obvious at the call site.
#[derive(Debug, Error)]
#[error("Agent type '{requested}' not found. Available agents: {available}")]
pub struct UnknownAgentTypeError {
    pub requested: String,
    /// Comma-separated list of registered agent types.
    pub available: String,
}

impl UnknownAgentTypeError {
    pub fn new(requested: impl Into<String>, available_types: &[String]) -> Self {
        Self {
            requested: requested.into(),
            available: available_types.join(", "),
        }
    }
}
