//! Top-level session context.
//!
//! A [`Context`] owns everything a session needs: the resolved configuration,
//! the plugin hook engine, the provider and alias memos, and the agent
//! registry. It is constructed explicitly by [`ContextBuilder`] — there is no
//! process-wide singleton — and passed by reference to whatever needs it.
//!
//! The accumulating hooks (`config`, `provider`, `modelAlias`) run exactly
//! once, here, at build time. The memos they produce are immutable for the
//! life of the context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::agent::executor::ExecutorServices;
use crate::agent::loop_driver::LoopDriver;
use crate::agent::registry::AgentRegistry;
use crate::ai::provider::{ModelAliasMap, Provider, ProviderMap};
use crate::config::{Config, ResolvedConfig};
use crate::plugins::engine::PluginHookEngine;
use crate::plugins::types::Plugin;

/// An assembled session runtime.
pub struct Context {
    config: Arc<ResolvedConfig>,
    engine: Arc<PluginHookEngine>,
    providers: Arc<ProviderMap>,
    aliases: Arc<ModelAliasMap>,
    agents: AgentRegistry,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl Context {
    pub fn builder(working_dir: impl Into<PathBuf>) -> ContextBuilder {
        ContextBuilder::new(working_dir)
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn plugins(&self) -> &Arc<PluginHookEngine> {
        &self.engine
    }

    pub fn providers(&self) -> &ProviderMap {
        &self.providers
    }

    pub fn model_aliases(&self) -> &ModelAliasMap {
        &self.aliases
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }
}

/// Builder for [`Context`]. Plugin registration order is preserved and is the
/// hook dispatch order.
pub struct ContextBuilder {
    working_dir: PathBuf,
    overrides: Config,
    plugins: Vec<Arc<dyn Plugin>>,
    provider_seed: ProviderMap,
    alias_seed: ModelAliasMap,
    driver: Option<Arc<dyn LoopDriver>>,
}

impl ContextBuilder {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            overrides: Config::default(),
            plugins: Vec::new(),
            provider_seed: ProviderMap::new(),
            alias_seed: ModelAliasMap::new(),
            driver: None,
        }
    }

    /// Programmatic config overrides, applied on top of `maestro.toml`.
    pub fn with_config(mut self, overrides: Config) -> Self {
        self.overrides = self.overrides.merged_with(overrides);
        self
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Seed a built-in provider. Seeds have the lowest precedence: any plugin
    /// contributing the same provider id wins.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider_seed.insert(provider.id.clone(), provider);
        self
    }

    pub fn with_model_alias(
        mut self,
        alias: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.alias_seed.insert(alias.into(), target.into());
        self
    }

    pub fn with_loop_driver(mut self, driver: Arc<dyn LoopDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Load and resolve configuration, run the accumulating hooks, and
    /// assemble the context. Hook failures propagate — a broken extension
    /// must be visible at startup, not papered over.
    pub async fn build(self) -> Result<Context> {
        let driver = self
            .driver
            .context("a loop driver is required to build a context")?;

        let engine = Arc::new(PluginHookEngine::new(self.plugins));

        let file_config = Config::load(&self.working_dir)?;
        let merged = file_config.merged_with(self.overrides);
        let reduced = engine.apply_config(merged).await?;
        let config = Arc::new(ResolvedConfig::resolve(reduced, &self.working_dir));

        let providers = Arc::new(engine.apply_providers(&config, self.provider_seed).await?);
        let aliases = Arc::new(engine.apply_model_aliases(&config, self.alias_seed).await?);

        tracing::debug!(
            plugins = ?engine.plugin_names(),
            providers = providers.len(),
            aliases = aliases.len(),
            "Context built"
        );

        let services = ExecutorServices {
            config: config.clone(),
            providers: providers.clone(),
            aliases: aliases.clone(),
            engine: engine.clone(),
            driver,
        };

        Ok(Context {
            config,
            engine,
            providers,
            aliases,
            agents: AgentRegistry::new(services),
        })
    }
}
