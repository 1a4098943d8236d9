//! Tool surface consumed by the runtime.
//!
//! Actual tool invocation happens inside the external loop driver; the core
//! only needs names for access filtering and schemas to forward.

use std::sync::Arc;

use serde_json::{json, Value};

/// A tool that can be offered to an agent.
pub trait Tool: Send + Sync {
    /// Unique tool name, the key used by allow/deny lists.
    fn name(&self) -> &str;

    /// One-line description shown to the model.
    fn description(&self) -> &str {
        ""
    }

    /// JSON schema for the tool's input.
    fn input_schema(&self) -> Value {
        json!({ "type": "object" })
    }
}

/// Shared tool set handed to a run.
pub type ToolSet = Vec<Arc<dyn Tool>>;

/// Minimal named tool, useful for registries built from descriptions alone.
#[derive(Debug, Clone)]
pub struct NamedTool {
    name: String,
    description: String,
}

impl NamedTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl Tool for NamedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}
