//! Plugin capabilities and hook payloads.
//!
//! A plugin is a set of optional named handlers behind a typed interface per
//! hook. The engine asks each plugin which hooks it implements via the
//! accessor methods and iterates declared implementers only — there is no
//! dynamic duck-typed dispatch and no implicit receiver state. Handlers get
//! the resolved configuration and a re-dispatch capability explicitly,
//! through [`HookContext`].

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::provider::{ModelAliasMap, ProviderMap};
use crate::ai::types::Usage;
use crate::config::{Config, ResolvedConfig};
use crate::plugins::engine::PluginHookEngine;

/// Named extension points. Dispatch mode is fixed per hook: `Config`,
/// `Provider`, and `ModelAlias` accumulate; the rest broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookName {
    Config,
    Provider,
    ModelAlias,
    Conversation,
    Telemetry,
    ToolResult,
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookName::Config => "config",
            HookName::Provider => "provider",
            HookName::ModelAlias => "modelAlias",
            HookName::Conversation => "conversation",
            HookName::Telemetry => "telemetry",
            HookName::ToolResult => "toolResult",
        };
        write!(f, "{name}")
    }
}

/// Handler-facing view of the runtime: the resolved configuration plus the
/// ability to re-enter the engine for notification hooks.
#[derive(Clone)]
pub struct HookContext {
    config: Arc<ResolvedConfig>,
    engine: Arc<PluginHookEngine>,
}

impl HookContext {
    pub(crate) fn new(config: Arc<ResolvedConfig>, engine: Arc<PluginHookEngine>) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Re-dispatch through the `telemetry` broadcast hook.
    pub async fn apply_telemetry(&self, event: &TelemetryEvent) {
        self.engine.broadcast_telemetry(&self.config, event).await;
    }
}

/// Summary of one finished conversation, broadcast to interested plugins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEvent {
    pub session_id: String,
    pub user_prompt: String,
    pub success: bool,
    pub usage: Usage,
    pub duration_ms: u64,
    pub turns: usize,
    pub tool_calls: usize,
}

/// A named telemetry datum with an open payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub payload: Value,
}

/// Outcome of a single tool invocation, broadcast as a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultEvent {
    pub session_id: String,
    pub tool_name: String,
    pub output: String,
    pub is_error: bool,
}

/// Accumulating hook: reduce the configuration before it is resolved.
///
/// Runs before resolution, so unlike the other hooks there is no
/// [`HookContext`] yet — the memo is all a handler sees.
#[async_trait]
pub trait ConfigHook: Send + Sync {
    async fn config(&self, memo: Config) -> Result<Config>;
}

/// Accumulating hook: contribute providers to the shared memo.
///
/// A plugin's entries take precedence over entries contributed by plugins
/// registered earlier; the caller-supplied seed has lowest precedence.
#[async_trait]
pub trait ProviderHook: Send + Sync {
    async fn providers(&self, ctx: &HookContext, memo: ProviderMap) -> Result<ProviderMap>;
}

/// Accumulating hook: contribute model aliases. Same precedence rules as
/// [`ProviderHook`].
#[async_trait]
pub trait ModelAliasHook: Send + Sync {
    async fn aliases(&self, ctx: &HookContext, memo: ModelAliasMap) -> Result<ModelAliasMap>;
}

/// Broadcast hook: a conversation finished.
#[async_trait]
pub trait ConversationHook: Send + Sync {
    async fn on_conversation(&self, ctx: &HookContext, event: &ConversationEvent) -> Result<()>;
}

/// Broadcast hook: a telemetry datum was emitted.
#[async_trait]
pub trait TelemetryHook: Send + Sync {
    async fn on_telemetry(&self, ctx: &HookContext, event: &TelemetryEvent) -> Result<()>;
}

/// Broadcast hook: a tool finished executing.
#[async_trait]
pub trait ToolResultHook: Send + Sync {
    async fn on_tool_result(&self, ctx: &HookContext, event: &ToolResultEvent) -> Result<()>;
}

/// A registered extension. Immutable once registered; registration order is
/// significant and preserved by the engine.
///
/// Each accessor returns `Some` only when the plugin implements that hook;
/// the default is "not implemented", so a plugin declares exactly the hooks
/// it handles:
///
/// ```ignore
/// struct AliasPlugin;
///
/// impl Plugin for AliasPlugin {
///     fn name(&self) -> &str {
///         "aliases"
///     }
///     fn model_alias_hook(&self) -> Option<&dyn ModelAliasHook> {
///         Some(self)
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Unique, human-readable plugin name.
    fn name(&self) -> &str;

    fn config_hook(&self) -> Option<&dyn ConfigHook> {
        None
    }

    fn provider_hook(&self) -> Option<&dyn ProviderHook> {
        None
    }

    fn model_alias_hook(&self) -> Option<&dyn ModelAliasHook> {
        None
    }

    fn conversation_hook(&self) -> Option<&dyn ConversationHook> {
        None
    }

    fn telemetry_hook(&self) -> Option<&dyn TelemetryHook> {
        None
    }

    fn tool_result_hook(&self) -> Option<&dyn ToolResultHook> {
        None
    }
}
