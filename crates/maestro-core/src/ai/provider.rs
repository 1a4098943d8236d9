//! Model provider configuration.
//!
//! Providers and model aliases are built incrementally by the accumulating
//! hook pipeline at startup and are immutable afterwards. The actual network
//! client behind a [`ModelHandle`] lives outside this crate; a provider only
//! carries the [`ModelFactory`] capable of constructing one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Information about a model offered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model ID to send in API requests
    pub id: String,
    /// Human-readable display name
    pub display_name: String,
    /// Context window size in tokens
    pub context_window: usize,
    /// Maximum output tokens
    pub max_output: usize,
}

impl ModelInfo {
    pub fn new(id: &str, display_name: &str, context_window: usize, max_output: usize) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            context_window,
            max_output,
        }
    }
}

/// An invokable model handle, produced by a [`ModelFactory`].
///
/// The runtime treats this as opaque: it is resolved once per run and handed
/// to the loop driver unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelHandle {
    pub provider_id: String,
    pub model_id: String,
}

impl ModelHandle {
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }

    /// Fully-qualified `provider/model` name.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.provider_id, self.model_id)
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.model_id)
    }
}

/// Constructs invokable model handles for a provider.
///
/// Implemented outside the core by whatever owns the network clients. A
/// failure here is surfaced as a model-resolution error, distinct from "no
/// model specified".
#[async_trait]
pub trait ModelFactory: Send + Sync {
    async fn create_model(&self, model_id: &str, provider: &Provider) -> Result<ModelHandle>;
}

/// Configuration for a model provider.
#[derive(Clone)]
pub struct Provider {
    /// Unique identifier, used as the prefix in `provider/model` names
    pub id: String,
    /// Display name
    pub name: String,
    /// Documentation URL
    pub doc: String,
    /// Models offered by this provider, keyed by model id
    pub models: BTreeMap<String, ModelInfo>,
    /// Factory producing invokable handles for this provider's models
    pub factory: Arc<dyn ModelFactory>,
}

impl Provider {
    pub fn has_model(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Provider memo keyed by provider id. Ordered so listings are stable.
pub type ProviderMap = BTreeMap<String, Provider>;

/// Alias memo: alias string -> fully-qualified `provider/model` name.
pub type ModelAliasMap = BTreeMap<String, String>;
