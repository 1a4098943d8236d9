//! Agent system for Maestro
//!
//! ## Registry and routing
//! - `AgentRegistry` - Name → definition map, built-in seeding, task routing
//! - `TaskInput` / `TaskRuntime` - The caller-facing task surface
//!
//! ## Execution
//! - `execute_agent` - One isolated, resumable, cancellable run
//! - `ExecutorServices` - Shared immutable services for runs
//! - `LoopDriver` - Seam to the external conversational turn loop
//!
//! ## Policy
//! - `AgentDefinition` - Prompt, model, and tool policy for a persona
//! - `filter_tools` - Pure allow/deny tool access filtering

pub mod builtin;
pub mod definition;
pub mod executor;
pub mod filter;
pub mod loop_driver;
pub mod registry;
pub mod types;

pub use builtin::{builtin_agents, explore_agent};
pub use definition::{AgentDefinition, AgentSource};
pub use executor::{
    execute_agent, ExecuteOptions, ExecutorServices, ForkStrategy, MessageCallback,
};
pub use filter::filter_tools;
pub use loop_driver::{LoopDriver, LoopMetadata, LoopOutcome, LoopRequest, LoopSuccess};
pub use registry::{AgentRegistry, TaskRuntime};
pub use types::{AgentExecutionResult, AgentStatus, TaskInput, TokenUsage};
