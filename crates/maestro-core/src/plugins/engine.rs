//! Hook dispatch over the ordered plugin list.
//!
//! Two strategies, fixed per hook:
//!
//! - **Accumulating** (`config`, `provider`, `modelAlias`): plugins run
//!   strictly in registration order, each handler receiving the memo the
//!   previous one returned. Non-implementers are skipped, the memo passing
//!   through unchanged. A handler error aborts the whole apply and propagates
//!   to the caller — downstream code depends on the structural correctness of
//!   the accumulated value, so a broken extension must be visible.
//! - **Broadcast** (`conversation`, `telemetry`, `toolResult`): every
//!   implementer is invoked with the same arguments, concurrently. Each
//!   handler failure is caught and logged without failing siblings or the
//!   overall call; return values are ignored.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use futures::future::join_all;

use crate::ai::provider::{ModelAliasMap, ProviderMap};
use crate::config::{Config, ResolvedConfig};
use crate::plugins::types::{
    ConversationEvent, HookContext, HookName, Plugin, TelemetryEvent, ToolResultEvent,
};

/// Ordered plugin registry plus the dispatch machinery.
pub struct PluginHookEngine {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginHookEngine {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    fn context(self: &Arc<Self>, config: &Arc<ResolvedConfig>) -> HookContext {
        HookContext::new(config.clone(), self.clone())
    }

    /// Accumulating `config` hook. Runs before resolution, so handlers see
    /// only the memo.
    pub async fn apply_config(&self, seed: Config) -> Result<Config> {
        let mut memo = seed;
        for plugin in &self.plugins {
            let Some(hook) = plugin.config_hook() else {
                continue;
            };
            memo = hook.config(memo).await.with_context(|| {
                format!("plugin '{}' failed in '{}' hook", plugin.name(), HookName::Config)
            })?;
        }
        Ok(memo)
    }

    /// Accumulating `provider` hook over the seed of built-in providers.
    pub async fn apply_providers(
        self: &Arc<Self>,
        config: &Arc<ResolvedConfig>,
        seed: ProviderMap,
    ) -> Result<ProviderMap> {
        let ctx = self.context(config);
        let mut memo = seed;
        for plugin in &self.plugins {
            let Some(hook) = plugin.provider_hook() else {
                continue;
            };
            memo = hook.providers(&ctx, memo).await.with_context(|| {
                format!(
                    "plugin '{}' failed in '{}' hook",
                    plugin.name(),
                    HookName::Provider
                )
            })?;
        }
        Ok(memo)
    }

    /// Accumulating `modelAlias` hook.
    pub async fn apply_model_aliases(
        self: &Arc<Self>,
        config: &Arc<ResolvedConfig>,
        seed: ModelAliasMap,
    ) -> Result<ModelAliasMap> {
        let ctx = self.context(config);
        let mut memo = seed;
        for plugin in &self.plugins {
            let Some(hook) = plugin.model_alias_hook() else {
                continue;
            };
            memo = hook.aliases(&ctx, memo).await.with_context(|| {
                format!(
                    "plugin '{}' failed in '{}' hook",
                    plugin.name(),
                    HookName::ModelAlias
                )
            })?;
        }
        Ok(memo)
    }

    /// Broadcast `conversation` to every implementer.
    pub async fn broadcast_conversation(
        self: &Arc<Self>,
        config: &Arc<ResolvedConfig>,
        event: &ConversationEvent,
    ) {
        let ctx = self.context(config);
        let invocations = self.plugins.iter().filter_map(|plugin| {
            plugin.conversation_hook().map(|hook| {
                let ctx = ctx.clone();
                async move { (plugin.name(), hook.on_conversation(&ctx, event).await) }
            })
        });

        for (name, result) in join_all(invocations).await {
            if let Err(e) = result {
                tracing::warn!(
                    plugin = %name,
                    hook = %HookName::Conversation,
                    error = %e,
                    "Plugin hook failed; continuing"
                );
            }
        }
    }

    /// Broadcast `telemetry` to every implementer.
    pub async fn broadcast_telemetry(
        self: &Arc<Self>,
        config: &Arc<ResolvedConfig>,
        event: &TelemetryEvent,
    ) {
        let ctx = self.context(config);
        let invocations = self.plugins.iter().filter_map(|plugin| {
            plugin.telemetry_hook().map(|hook| {
                let ctx = ctx.clone();
                async move { (plugin.name(), hook.on_telemetry(&ctx, event).await) }
            })
        });

        for (name, result) in join_all(invocations).await {
            if let Err(e) = result {
                tracing::warn!(
                    plugin = %name,
                    hook = %HookName::Telemetry,
                    error = %e,
                    "Plugin hook failed; continuing"
                );
            }
        }
    }

    /// Broadcast `toolResult` to every implementer.
    pub async fn broadcast_tool_result(
        self: &Arc<Self>,
        config: &Arc<ResolvedConfig>,
        event: &ToolResultEvent,
    ) {
        let ctx = self.context(config);
        let invocations = self.plugins.iter().filter_map(|plugin| {
            plugin.tool_result_hook().map(|hook| {
                let ctx = ctx.clone();
                async move { (plugin.name(), hook.on_tool_result(&ctx, event).await) }
            })
        });

        for (name, result) in join_all(invocations).await {
            if let Err(e) = result {
                tracing::warn!(
                    plugin = %name,
                    hook = %HookName::ToolResult,
                    error = %e,
                    "Plugin hook failed; continuing"
                );
            }
        }
    }
}
