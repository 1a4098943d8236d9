//! Model-facing types: messages, providers, and resolution policy.

pub mod provider;
pub mod resolver;
pub mod types;

pub use provider::{ModelAliasMap, ModelFactory, ModelHandle, ModelInfo, Provider, ProviderMap};
pub use resolver::{resolve_model, MODEL_INHERIT};
pub use types::{Message, MessageKind, Role, Usage};
