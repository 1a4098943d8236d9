//! Model resolution policy.
//!
//! Resolution order, highest precedence first: the model passed for this
//! specific invocation, then the agent definition's own `model` field. The
//! literal `"inherit"` re-resolves to the ambient configuration's model
//! instead of being treated as a model identifier. Construction of the
//! resulting handle is delegated to the owning provider's [`ModelFactory`].

use crate::agent::definition::AgentDefinition;
use crate::ai::provider::{ModelAliasMap, ModelHandle, ProviderMap};
use crate::config::ResolvedConfig;
use crate::error::AgentError;

/// Sentinel model value meaning "use the ambient conversation's model".
pub const MODEL_INHERIT: &str = "inherit";

/// Resolve the model name for a run and construct an invokable handle.
pub async fn resolve_model(
    explicit: Option<&str>,
    definition: &AgentDefinition,
    config: &ResolvedConfig,
    providers: &ProviderMap,
    aliases: &ModelAliasMap,
) -> Result<ModelHandle, AgentError> {
    let mut name = match explicit {
        Some(model) if !model.is_empty() => model.to_string(),
        _ => definition.model.clone(),
    };

    if name == MODEL_INHERIT {
        name = config.model.clone().unwrap_or_default();
    }

    if name.is_empty() {
        return Err(AgentError::NoModelSpecified(definition.agent_type.clone()));
    }

    construct_model(&name, providers, aliases).await
}

/// Turn a resolved name into a handle via the provider memos.
///
/// Accepts an alias, a fully-qualified `provider/model` name, or a bare model
/// id (matched against providers in memo order).
async fn construct_model(
    name: &str,
    providers: &ProviderMap,
    aliases: &ModelAliasMap,
) -> Result<ModelHandle, AgentError> {
    let resolution_failed = |reason: String| AgentError::ModelResolutionFailed {
        name: name.to_string(),
        reason,
    };

    let qualified = aliases.get(name).cloned().unwrap_or_else(|| name.to_string());

    let (provider, model_id) = match qualified.split_once('/') {
        Some((provider_id, model_id)) => {
            let provider = providers.get(provider_id).ok_or_else(|| {
                resolution_failed(format!("unknown provider '{provider_id}'"))
            })?;
            (provider, model_id)
        }
        None => providers
            .values()
            .find(|p| p.has_model(&qualified))
            .map(|p| (p, qualified.as_str()))
            .ok_or_else(|| {
                resolution_failed("no provider offers this model".to_string())
            })?,
    };

    provider
        .factory
        .create_model(model_id, provider)
        .await
        .map_err(|e| resolution_failed(e.to_string()))
}
