//! Agent task execution.
//!
//! One call to [`execute_agent`] runs one agent conversation: id assignment,
//! validation, tool filtering, model resolution, message preparation (fresh
//! or resumed from the session log), delegation to the external loop driver,
//! per-message enrichment and logging, and result aggregation.
//!
//! The outer contract is **never throws**: every failure path converges to a
//! `Failed` [`AgentExecutionResult`] so callers branch only on `status`. One
//! failing agent can never crash a sibling or the parent conversation.

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agent::definition::AgentDefinition;
use crate::agent::filter::filter_tools;
use crate::agent::loop_driver::{LoopDriver, LoopOutcome, LoopRequest, LoopSuccess};
use crate::agent::types::{AgentExecutionResult, AgentStatus, TokenUsage};
use crate::ai::provider::{ModelAliasMap, ProviderMap};
use crate::ai::resolver::resolve_model;
use crate::ai::types::{Message, Usage};
use crate::config::ResolvedConfig;
use crate::error::AgentError;
use crate::plugins::engine::PluginHookEngine;
use crate::plugins::types::ConversationEvent;
use crate::storage::session_log::SessionLog;
use crate::tools::ToolSet;

/// Shared services an executor run needs. Cheap to clone, immutable after
/// context construction.
#[derive(Clone)]
pub struct ExecutorServices {
    pub config: Arc<ResolvedConfig>,
    pub providers: Arc<ProviderMap>,
    pub aliases: Arc<ModelAliasMap>,
    pub engine: Arc<PluginHookEngine>,
    pub driver: Arc<dyn LoopDriver>,
}

/// How forked parent-conversation messages are merged with the agent's own
/// log. The merge policy is deliberately pluggable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForkStrategy {
    /// Place forked messages ahead of the loaded log (the default).
    #[default]
    Prepend,
    /// Drop the forked messages entirely.
    Ignore,
}

/// Per-message callback. Errors are caught and logged — message delivery is
/// best-effort relative to the agent's own progress.
pub type MessageCallback =
    Arc<dyn Fn(Message) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Inputs for one run.
pub struct ExecuteOptions {
    pub definition: AgentDefinition,
    pub prompt: String,
    /// Full candidate tool set, filtered by the definition's policy.
    pub tools: ToolSet,
    /// Per-invocation model override.
    pub model: Option<String>,
    /// Agent id of a prior conversation to resume. The caller must serialize
    /// resumes of the same id itself.
    pub resume: Option<String>,
    /// Parent messages to fork from, honored only when the definition opts in.
    pub fork_context_messages: Option<Vec<Message>>,
    pub fork_strategy: ForkStrategy,
    pub cancellation: Option<CancellationToken>,
    pub on_message: Option<MessageCallback>,
}

impl ExecuteOptions {
    pub fn new(definition: AgentDefinition, prompt: impl Into<String>, tools: ToolSet) -> Self {
        Self {
            definition,
            prompt: prompt.into(),
            tools,
            model: None,
            resume: None,
            fork_context_messages: None,
            fork_strategy: ForkStrategy::default(),
            cancellation: None,
            on_message: None,
        }
    }
}

/// Run one agent task to completion. Never returns an error; see the module
/// docs for the contract.
pub async fn execute_agent(
    services: &ExecutorServices,
    options: ExecuteOptions,
) -> AgentExecutionResult {
    let started = Instant::now();

    // Assigned before validation so even a validation failure is
    // attributable to an id in logs and telemetry.
    let agent_id = match &options.resume {
        Some(id) => id.clone(),
        None => uuid::Uuid::new_v4().to_string(),
    };

    tracing::debug!(
        agent_id = %agent_id,
        agent_type = %options.definition.agent_type,
        resumed = options.resume.is_some(),
        "Starting agent run"
    );

    match run(services, &agent_id, started, options).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(agent_id = %agent_id, error = %e, "Agent run failed");
            AgentExecutionResult::failed(
                &agent_id,
                format!("Agent execution error: {e}"),
                elapsed_ms(started),
            )
        }
    }
}

async fn run(
    services: &ExecutorServices,
    agent_id: &str,
    started: Instant,
    options: ExecuteOptions,
) -> Result<AgentExecutionResult, AgentError> {
    let ExecuteOptions {
        definition,
        prompt,
        tools,
        model,
        fork_context_messages,
        fork_strategy,
        cancellation,
        on_message,
        ..
    } = options;

    definition.validate()?;

    let filtered = filter_tools(&tools, &definition);
    if filtered.is_empty() {
        return Err(AgentError::NoAvailableTools(definition.agent_type.clone()));
    }

    let model = resolve_model(
        model.as_deref(),
        &definition,
        &services.config,
        &services.providers,
        &services.aliases,
    )
    .await?;

    let log = SessionLog::open(&services.config.session_dir, agent_id);
    let mut history = log.load().await?;

    if definition.fork_context && fork_strategy == ForkStrategy::Prepend {
        if let Some(forked) = fork_context_messages {
            let mut merged = forked;
            merged.append(&mut history);
            history = merged;
        }
    }

    let prompt_text = prompt.clone();
    let mut user_message = Message::user(prompt);
    user_message.stamp_agent(agent_id, &definition.agent_type);
    if let Err(e) = log.append(&user_message).await {
        tracing::warn!(agent_id = %agent_id, error = %e, "Failed to persist prompt message");
    }
    history.push(user_message);

    let cancel = cancellation.unwrap_or_default();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let request = LoopRequest {
        messages: history,
        model,
        tools: filtered,
        system_prompt: definition.system_prompt.clone(),
        cancellation: cancel.clone(),
        max_turns: services.config.max_turns,
        events: event_tx,
    };

    let drive = services.driver.drive(request);
    tokio::pin!(drive);

    // Pump driver-emitted messages while the drive future runs. The channel
    // closes when the driver drops its sender; remaining buffered messages
    // are drained after the outcome lands.
    let mut events_open = true;
    let outcome = loop {
        tokio::select! {
            outcome = &mut drive => break outcome,
            event = event_rx.recv(), if events_open => match event {
                Some(message) => {
                    deliver_message(
                        &log,
                        &cancel,
                        on_message.as_ref(),
                        agent_id,
                        &definition.agent_type,
                        message,
                    )
                    .await;
                }
                None => events_open = false,
            },
        }
    };
    while let Ok(message) = event_rx.try_recv() {
        deliver_message(
            &log,
            &cancel,
            on_message.as_ref(),
            agent_id,
            &definition.agent_type,
            message,
        )
        .await;
    }

    if cancel.is_cancelled() {
        return Err(AgentError::Cancelled);
    }

    let duration_ms = elapsed_ms(started);
    let (result, turns, usage) = match outcome {
        LoopOutcome::Success(success) => {
            let usage = success.usage;
            let turns = success.metadata.turns;
            let result = AgentExecutionResult {
                status: AgentStatus::Completed,
                agent_id: agent_id.to_string(),
                content: extract_final_content(&success),
                total_tool_calls: success.metadata.tool_calls,
                total_duration_ms: duration_ms,
                usage: TokenUsage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                },
            };
            (result, turns, usage)
        }
        LoopOutcome::Failure { message } => (
            AgentExecutionResult::failed(
                agent_id,
                format!("Agent execution failed: {message}"),
                duration_ms,
            ),
            0,
            Usage::default(),
        ),
    };

    services
        .engine
        .broadcast_conversation(
            &services.config,
            &ConversationEvent {
                session_id: agent_id.to_string(),
                user_prompt: prompt_text,
                success: result.is_completed(),
                usage,
                duration_ms,
                turns,
                tool_calls: result.total_tool_calls,
            },
        )
        .await;

    Ok(result)
}

/// Stamp, persist, and forward one driver-emitted message.
///
/// Once cancellation has been observed the message is dropped: no further
/// forwarding, no partially-applied log state.
async fn deliver_message(
    log: &SessionLog,
    cancel: &CancellationToken,
    on_message: Option<&MessageCallback>,
    agent_id: &str,
    agent_type: &str,
    mut message: Message,
) {
    if cancel.is_cancelled() {
        return;
    }

    message.stamp_agent(agent_id, agent_type);

    if let Err(e) = log.append(&message).await {
        tracing::warn!(agent_id = %agent_id, error = %e, "Failed to persist agent message");
    }

    if let Some(callback) = on_message {
        if let Err(e) = callback(message).await {
            tracing::warn!(agent_id = %agent_id, error = %e, "onMessage callback failed");
        }
    }
}

fn extract_final_content(success: &LoopSuccess) -> String {
    if let Some(text) = success.text.as_deref().filter(|t| !t.is_empty()) {
        return text.to_string();
    }
    if let Some(content) = success.content.as_deref().filter(|c| !c.is_empty()) {
        return content.to_string();
    }
    "Agent completed successfully".to_string()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use anyhow::Result;
    use async_trait::async_trait;
    use futures::FutureExt;
    use parking_lot::Mutex;

    use super::*;
    use crate::agent::definition::AgentDefinition;
    use crate::agent::loop_driver::LoopMetadata;
    use crate::ai::provider::{ModelFactory, ModelHandle, ModelInfo, Provider};
    use crate::tools::NamedTool;

    struct StubFactory;

    #[async_trait]
    impl ModelFactory for StubFactory {
        async fn create_model(&self, model_id: &str, provider: &Provider) -> Result<ModelHandle> {
            Ok(ModelHandle::new(provider.id.clone(), model_id))
        }
    }

    fn providers_fixture() -> ProviderMap {
        let mut providers = BTreeMap::new();
        providers.insert(
            "acme".to_string(),
            Provider {
                id: "acme".to_string(),
                name: "Acme".to_string(),
                doc: String::new(),
                models: BTreeMap::from([(
                    "fast-1".to_string(),
                    ModelInfo::new("fast-1", "Fast 1", 200_000, 8_192),
                )]),
                factory: Arc::new(StubFactory),
            },
        );
        providers
    }

    /// Scripted driver: records every request's message history, emits the
    /// configured messages, then reports the configured outcome.
    #[derive(Default)]
    struct StubDriver {
        emit: Vec<Message>,
        fail_with: Option<String>,
        seen_histories: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl LoopDriver for StubDriver {
        async fn drive(&self, request: LoopRequest) -> LoopOutcome {
            self.seen_histories.lock().push(request.messages.clone());
            for message in &self.emit {
                let _ = request.events.send(message.clone());
            }
            match &self.fail_with {
                Some(message) => LoopOutcome::Failure {
                    message: message.clone(),
                },
                None => LoopOutcome::Success(LoopSuccess {
                    text: Some("all done".to_string()),
                    content: None,
                    usage: Usage::new(100, 20),
                    metadata: LoopMetadata {
                        turns: 2,
                        tool_calls: 3,
                    },
                }),
            }
        }
    }

    fn services_with(driver: Arc<dyn LoopDriver>, session_dir: &Path) -> ExecutorServices {
        let mut config = ResolvedConfig::for_tests();
        config.session_dir = session_dir.to_path_buf();
        config.model = Some("acme/fast-1".to_string());

        ExecutorServices {
            config: Arc::new(config),
            providers: Arc::new(providers_fixture()),
            aliases: Arc::new(ModelAliasMap::new()),
            engine: Arc::new(PluginHookEngine::new(Vec::new())),
            driver,
        }
    }

    fn definition() -> AgentDefinition {
        AgentDefinition::new("Test", "You are a test agent").with_model("inherit")
    }

    fn tools(names: &[&str]) -> ToolSet {
        names
            .iter()
            .map(|n| Arc::new(NamedTool::new(*n, "")) as Arc<dyn crate::tools::Tool>)
            .collect()
    }

    #[tokio::test]
    async fn missing_system_prompt_fails_without_throwing() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(Arc::new(StubDriver::default()), dir.path());

        let options = ExecuteOptions::new(
            AgentDefinition::new("Test", ""),
            "prompt",
            tools(&["read"]),
        );
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Failed);
        assert!(result.content.contains("must have systemPrompt"));
    }

    #[tokio::test]
    async fn missing_agent_type_fails() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(Arc::new(StubDriver::default()), dir.path());

        let options = ExecuteOptions::new(
            AgentDefinition::new("", "prompt"),
            "prompt",
            tools(&["read"]),
        );
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Failed);
        assert!(result.content.contains("must have agentType"));
    }

    #[tokio::test]
    async fn empty_tool_set_after_filtering_fails() {
        let dir = tempfile::tempdir().unwrap();
        let services = services_with(Arc::new(StubDriver::default()), dir.path());

        let definition = definition()
            .with_disallowed_tools(vec!["read".to_string(), "write".to_string()]);
        let options = ExecuteOptions::new(definition, "prompt", tools(&["read", "write"]));
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Failed);
        assert!(result.content.contains("no available tools"));
    }

    #[tokio::test]
    async fn missing_model_everywhere_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut services = services_with(Arc::new(StubDriver::default()), dir.path());
        let mut config = ResolvedConfig::for_tests();
        config.session_dir = dir.path().to_path_buf();
        services.config = Arc::new(config); // no ambient model

        let options = ExecuteOptions::new(
            AgentDefinition::new("Test", "prompt").with_model(""),
            "prompt",
            tools(&["read"]),
        );
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Failed);
        assert!(result.content.contains("No model specified"));
    }

    #[tokio::test]
    async fn completed_run_aggregates_and_stamps_messages() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(StubDriver {
            emit: vec![Message::assistant("working on it")],
            ..Default::default()
        });
        let services = services_with(driver, dir.path());

        let forwarded: Arc<Mutex<Vec<Message>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = forwarded.clone();
        let callback: MessageCallback = Arc::new(move |message| {
            let sink = sink.clone();
            async move {
                sink.lock().push(message);
                Ok(())
            }
            .boxed()
        });

        let mut options = ExecuteOptions::new(definition(), "do the thing", tools(&["read"]));
        options.on_message = Some(callback);
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Completed);
        assert_eq!(result.content, "all done");
        assert_eq!(result.total_tool_calls, 3);
        assert_eq!(result.usage.input_tokens, 100);
        assert_eq!(result.usage.output_tokens, 20);

        let forwarded = forwarded.lock();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].agent_id(), Some(result.agent_id.as_str()));

        let log = SessionLog::open(dir.path(), &result.agent_id);
        let persisted = log.load().await.unwrap();
        // prompt message plus the emitted assistant message
        assert_eq!(persisted.len(), 2);
        assert!(persisted
            .iter()
            .all(|m| m.agent_id() == Some(result.agent_id.as_str())));
    }

    #[tokio::test]
    async fn loop_failure_becomes_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(StubDriver {
            fail_with: Some("model quota exceeded".to_string()),
            ..Default::default()
        });
        let services = services_with(driver, dir.path());

        let options = ExecuteOptions::new(definition(), "prompt", tools(&["read"]));
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Failed);
        assert_eq!(
            result.content,
            "Agent execution failed: model quota exceeded"
        );
        assert_eq!(result.total_tool_calls, 0);
    }

    #[tokio::test]
    async fn resume_prepends_prior_log_before_new_prompt() {
        let dir = tempfile::tempdir().unwrap();

        let first_driver = Arc::new(StubDriver {
            emit: vec![Message::assistant("first answer")],
            ..Default::default()
        });
        let services = services_with(first_driver, dir.path());
        let options = ExecuteOptions::new(definition(), "first prompt", tools(&["read"]));
        let first = execute_agent(&services, options).await;
        assert_eq!(first.status, AgentStatus::Completed);

        let second_driver = Arc::new(StubDriver::default());
        let services = services_with(second_driver.clone(), dir.path());
        let mut options = ExecuteOptions::new(definition(), "follow up", tools(&["read"]));
        options.resume = Some(first.agent_id.clone());
        let second = execute_agent(&services, options).await;

        assert_eq!(second.agent_id, first.agent_id);

        let histories = second_driver.seen_histories.lock();
        let history = &histories[0];
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "first prompt");
        assert_eq!(history[1].content, "first answer");
        assert_eq!(history[2].content, "follow up");
    }

    #[tokio::test]
    async fn fork_context_is_prepended_ahead_of_log() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(StubDriver::default());
        let services = services_with(driver.clone(), dir.path());

        let mut options = ExecuteOptions::new(
            definition().with_fork_context(true),
            "child prompt",
            tools(&["read"]),
        );
        options.fork_context_messages = Some(vec![Message::user("parent context")]);
        let result = execute_agent(&services, options).await;
        assert_eq!(result.status, AgentStatus::Completed);

        let histories = driver.seen_histories.lock();
        let history = &histories[0];
        assert_eq!(history[0].content, "parent context");
        assert_eq!(history.last().unwrap().content, "child prompt");
    }

    #[tokio::test]
    async fn cancellation_settles_failed_and_stops_forwarding() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(StubDriver {
            emit: vec![Message::assistant("late message")],
            ..Default::default()
        });
        let services = services_with(driver, dir.path());

        let forwarded: Arc<Mutex<Vec<Message>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = forwarded.clone();
        let callback: MessageCallback = Arc::new(move |message| {
            let sink = sink.clone();
            async move {
                sink.lock().push(message);
                Ok(())
            }
            .boxed()
        });

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut options = ExecuteOptions::new(definition(), "prompt", tools(&["read"]));
        options.cancellation = Some(cancel);
        options.on_message = Some(callback);
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Failed);
        assert!(result.content.contains("cancelled"));
        assert!(forwarded.lock().is_empty());
    }

    #[tokio::test]
    async fn on_message_error_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(StubDriver {
            emit: vec![Message::assistant("hello")],
            ..Default::default()
        });
        let services = services_with(driver, dir.path());

        let callback: MessageCallback =
            Arc::new(|_message| async move { anyhow::bail!("consumer went away") }.boxed());

        let mut options = ExecuteOptions::new(definition(), "prompt", tools(&["read"]));
        options.on_message = Some(callback);
        let result = execute_agent(&services, options).await;

        assert_eq!(result.status, AgentStatus::Completed);
    }

    #[tokio::test]
    async fn concurrent_runs_write_disjoint_logs() {
        let dir = tempfile::tempdir().unwrap();

        let driver_a = Arc::new(StubDriver {
            emit: vec![Message::assistant("from a")],
            ..Default::default()
        });
        let driver_b = Arc::new(StubDriver {
            emit: vec![Message::assistant("from b")],
            ..Default::default()
        });
        let services_a = services_with(driver_a, dir.path());
        let services_b = services_with(driver_b, dir.path());

        let run_a = execute_agent(
            &services_a,
            ExecuteOptions::new(definition(), "task a", tools(&["read"])),
        );
        let run_b = execute_agent(
            &services_b,
            ExecuteOptions::new(definition(), "task b", tools(&["read"])),
        );
        let (result_a, result_b) = tokio::join!(run_a, run_b);

        assert_ne!(result_a.agent_id, result_b.agent_id);

        for result in [&result_a, &result_b] {
            let log = SessionLog::open(dir.path(), &result.agent_id);
            let messages = log.load().await.unwrap();
            assert!(!messages.is_empty());
            assert!(messages
                .iter()
                .all(|m| m.agent_id() == Some(result.agent_id.as_str())));
        }
    }

    #[test]
    fn final_content_falls_back_in_order() {
        let with_text = LoopSuccess {
            text: Some("answer".to_string()),
            content: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_final_content(&with_text), "answer");

        let with_content = LoopSuccess {
            text: Some(String::new()),
            content: Some("fallback".to_string()),
            ..Default::default()
        };
        assert_eq!(extract_final_content(&with_content), "fallback");

        let with_neither = LoopSuccess::default();
        assert_eq!(
            extract_final_content(&with_neither),
            "Agent completed successfully"
        );
    }
}
