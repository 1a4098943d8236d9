//! Core library for Maestro — the orchestration runtime of an interactive
//! coding-agent CLI.
//!
//! ## Agents
//! - `AgentRegistry` - Named agent definitions, built-in seeding, task routing
//! - `execute_agent` - Isolated, resumable, cancellable task execution
//! - `LoopDriver` - Seam to the external conversational turn loop
//!
//! ## Plugins
//! - `PluginHookEngine` - Ordered hook dispatch: accumulating and broadcast
//! - `Plugin` - Typed per-hook handler capabilities
//! - `TelemetryPlugin` - Built-in conversation/telemetry bridge
//!
//! ## Models
//! - `Provider` / `ModelAliasMap` - Memos built once by the hook pipeline
//! - `resolve_model` - Precedence rules including the "inherit" sentinel
//!
//! ## Storage
//! - `SessionLog` - Append-only per-agent message log, loadable on resume

pub mod agent;
pub mod ai;
pub mod config;
pub mod context;
pub mod error;
pub mod plugins;
pub mod storage;
pub mod tools;

pub use agent::definition::{AgentDefinition, AgentSource};
pub use agent::executor::{
    execute_agent, ExecuteOptions, ExecutorServices, ForkStrategy, MessageCallback,
};
pub use agent::filter::filter_tools;
pub use agent::loop_driver::{LoopDriver, LoopMetadata, LoopOutcome, LoopRequest, LoopSuccess};
pub use agent::registry::{AgentRegistry, TaskRuntime};
pub use agent::types::{AgentExecutionResult, AgentStatus, TaskInput, TokenUsage};
pub use ai::provider::{ModelAliasMap, ModelFactory, ModelHandle, ModelInfo, Provider, ProviderMap};
pub use ai::resolver::{resolve_model, MODEL_INHERIT};
pub use ai::types::{Message, MessageKind, Role, Usage};
pub use config::{Config, ResolvedConfig, DEFAULT_MAX_TURNS};
pub use context::{Context, ContextBuilder};
pub use error::{AgentError, UnknownAgentTypeError};
pub use plugins::engine::PluginHookEngine;
pub use plugins::telemetry::{TelemetryPlugin, TelemetrySink};
pub use plugins::types::{
    ConfigHook, ConversationEvent, ConversationHook, HookContext, HookName, ModelAliasHook,
    Plugin, ProviderHook, TelemetryEvent, TelemetryHook, ToolResultEvent, ToolResultHook,
};
pub use storage::session_log::SessionLog;
pub use tools::{NamedTool, Tool, ToolSet};
