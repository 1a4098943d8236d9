//! Agent registry: named definitions and task routing.
//!
//! Seeded with built-in agents at construction, extensible at runtime via
//! [`AgentRegistry::register_agent`]. The map is mutated only during
//! startup/registration; once execution begins it is effectively read-only,
//! and lookups take a cheap read lock.

use std::collections::BTreeMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::agent::builtin::builtin_agents;
use crate::agent::definition::AgentDefinition;
use crate::agent::executor::{execute_agent, ExecuteOptions, ExecutorServices, MessageCallback};
use crate::agent::types::{AgentExecutionResult, TaskInput};
use crate::ai::types::Message;
use crate::error::{AgentError, UnknownAgentTypeError};
use crate::tools::ToolSet;

/// Caller-supplied runtime for one routed task.
pub struct TaskRuntime {
    /// Full candidate tool set for the run.
    pub tools: ToolSet,
    /// Working directory the task operates in.
    pub cwd: PathBuf,
    pub cancellation: Option<CancellationToken>,
    /// Parent messages offered for fork-context injection.
    pub fork_context_messages: Option<Vec<Message>>,
    pub on_message: Option<MessageCallback>,
}

impl TaskRuntime {
    pub fn new(tools: ToolSet, cwd: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            cwd: cwd.into(),
            cancellation: None,
            fork_context_messages: None,
            on_message: None,
        }
    }
}

/// Name → definition map plus the services runs need.
pub struct AgentRegistry {
    agents: RwLock<BTreeMap<String, AgentDefinition>>,
    services: ExecutorServices,
}

impl AgentRegistry {
    /// Create a registry seeded with the built-in agents.
    pub fn new(services: ExecutorServices) -> Self {
        let mut agents = BTreeMap::new();
        for agent in builtin_agents() {
            agents.insert(agent.agent_type.clone(), agent);
        }
        Self {
            agents: RwLock::new(agents),
            services,
        }
    }

    /// Register a definition, overwriting any existing one with the same
    /// agent type — user-provided agents shadow built-ins.
    pub fn register_agent(&self, definition: AgentDefinition) -> Result<(), AgentError> {
        definition.validate()?;
        tracing::debug!(agent_type = %definition.agent_type, "Registered agent");
        self.agents
            .write()
            .insert(definition.agent_type.clone(), definition);
        Ok(())
    }

    pub fn get_agent(&self, agent_type: &str) -> Option<AgentDefinition> {
        self.agents.read().get(agent_type).cloned()
    }

    pub fn get_all_agents(&self) -> Vec<AgentDefinition> {
        self.agents.read().values().cloned().collect()
    }

    pub fn get_agent_types(&self) -> Vec<String> {
        self.agents.read().keys().cloned().collect()
    }

    /// Human-readable listing of delegation targets, one per line.
    pub fn agent_descriptions(&self) -> String {
        self.get_all_agents()
            .iter()
            .map(|agent| {
                let when = agent.when_to_use.as_deref().unwrap_or(
                    "This subagent should only be called manually by the user.",
                );
                format!("- {}: {}", agent.agent_type, when)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Route a task to its agent and execute it.
    ///
    /// An unknown `subagent_type` is a caller bug (misrouted request), so it
    /// is returned as an error immediately, before any resources (agent id,
    /// log file) are allocated. Every mid-execution failure instead comes
    /// back as a `Failed` result.
    pub async fn execute_task(
        &self,
        input: TaskInput,
        runtime: TaskRuntime,
    ) -> Result<AgentExecutionResult, UnknownAgentTypeError> {
        let definition = self.get_agent(&input.subagent_type).ok_or_else(|| {
            UnknownAgentTypeError::new(&input.subagent_type, &self.get_agent_types())
        })?;

        tracing::debug!(
            agent_type = %definition.agent_type,
            cwd = %runtime.cwd.display(),
            "Dispatching task"
        );

        let options = ExecuteOptions {
            fork_context_messages: if definition.fork_context {
                runtime.fork_context_messages
            } else {
                None
            },
            model: input.model,
            resume: input.resume,
            cancellation: runtime.cancellation,
            on_message: runtime.on_message,
            ..ExecuteOptions::new(definition, input.prompt, runtime.tools)
        };

        Ok(execute_agent(&self.services, options).await)
    }
}
