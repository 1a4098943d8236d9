//! Built-in telemetry plugin.
//!
//! Listens to the `conversation` broadcast, assembles a usage payload, and
//! re-dispatches it through the `telemetry` hook so any number of sinks
//! (including ones contributed by other plugins) can consume it without
//! knowing about conversations.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use crate::plugins::types::{
    ConversationEvent, ConversationHook, HookContext, Plugin, TelemetryEvent, TelemetryHook,
};

/// Receives telemetry events forwarded by [`TelemetryPlugin`].
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn handle(&self, event: &TelemetryEvent) -> Result<()>;
}

/// The built-in telemetry bridge. Without a sink it still re-dispatches
/// conversation payloads for other `telemetry` implementers.
#[derive(Default)]
pub struct TelemetryPlugin {
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl TelemetryPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink: Some(sink) }
    }
}

impl Plugin for TelemetryPlugin {
    fn name(&self) -> &str {
        "telemetry"
    }

    fn conversation_hook(&self) -> Option<&dyn ConversationHook> {
        Some(self)
    }

    fn telemetry_hook(&self) -> Option<&dyn TelemetryHook> {
        Some(self)
    }
}

#[async_trait]
impl ConversationHook for TelemetryPlugin {
    async fn on_conversation(&self, ctx: &HookContext, event: &ConversationEvent) -> Result<()> {
        let payload = json!({
            "sessionId": event.session_id,
            "userPrompt": event.user_prompt,
            "promptTokens": event.usage.prompt_tokens,
            "completionTokens": event.usage.completion_tokens,
            "totalTokens": event.usage.total_tokens,
            "success": event.success,
            "duration": event.duration_ms,
            "turnsCount": event.turns,
            "toolCallsCount": event.tool_calls,
            "model": ctx.config().model,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        tracing::debug!(session_id = %event.session_id, "conversation telemetry");

        ctx.apply_telemetry(&TelemetryEvent {
            name: "conversation".to_string(),
            payload,
        })
        .await;

        Ok(())
    }
}

#[async_trait]
impl TelemetryHook for TelemetryPlugin {
    async fn on_telemetry(&self, _ctx: &HookContext, event: &TelemetryEvent) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.handle(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::ai::types::Usage;
    use crate::config::ResolvedConfig;
    use crate::plugins::engine::PluginHookEngine;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn handle(&self, event: &TelemetryEvent) -> Result<()> {
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn conversation_broadcast_reaches_sink_through_telemetry_hook() {
        let sink = Arc::new(RecordingSink::default());
        let engine = Arc::new(PluginHookEngine::new(vec![Arc::new(
            TelemetryPlugin::with_sink(sink.clone()),
        )]));

        let config = Arc::new(ResolvedConfig::for_tests());
        let event = ConversationEvent {
            session_id: "s-1".to_string(),
            user_prompt: "list the tests".to_string(),
            success: true,
            usage: Usage::new(120, 34),
            duration_ms: 987,
            turns: 3,
            tool_calls: 5,
        };

        engine.broadcast_conversation(&config, &event).await;

        let events = sink.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "conversation");
        assert_eq!(events[0].payload["sessionId"], "s-1");
        assert_eq!(events[0].payload["promptTokens"], 120);
        assert_eq!(events[0].payload["toolCallsCount"], 5);
    }
}
