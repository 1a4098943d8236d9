//! Plugin system: typed hook capabilities and the dispatch engine.
//!
//! ## Engine
//! - `PluginHookEngine` - Ordered dispatch, accumulating and broadcast modes
//!
//! ## Capabilities
//! - `Plugin` - Optional typed handler per hook name
//! - `HookContext` - Resolved config + re-dispatch capability for handlers
//!
//! ## Built-ins
//! - `TelemetryPlugin` - Bridges `conversation` events into `telemetry`

pub mod engine;
pub mod telemetry;
pub mod types;

pub use engine::PluginHookEngine;
pub use telemetry::{TelemetryPlugin, TelemetrySink};
pub use types::{
    ConfigHook, ConversationEvent, ConversationHook, HookContext, HookName, ModelAliasHook,
    Plugin, ProviderHook, TelemetryEvent, TelemetryHook, ToolResultEvent, ToolResultHook,
};
