//! Seam to the external conversational turn loop.
//!
//! The runtime hands the driver everything a run needs and treats the rest as
//! opaque: the driver talks to the model, executes tool calls turn by turn,
//! streams produced messages back over the `events` channel, and reports a
//! tagged outcome. The executor never inspects intermediate state.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ai::provider::ModelHandle;
use crate::ai::types::{Message, Usage};
use crate::tools::ToolSet;

/// Everything a driver needs for one run.
pub struct LoopRequest {
    /// Full message history, ending with the fresh user prompt.
    pub messages: Vec<Message>,
    pub model: ModelHandle,
    pub tools: ToolSet,
    pub system_prompt: String,
    /// Honored by the driver; the executor also refuses to finalize a
    /// completed result once it has observed cancellation.
    pub cancellation: CancellationToken,
    /// Hard cap on turns. Enforcing it is the driver's concern.
    pub max_turns: usize,
    /// Every message the driver produces goes here, in order.
    pub events: mpsc::UnboundedSender<Message>,
}

/// Turn/tool-call counters reported by the driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopMetadata {
    pub turns: usize,
    pub tool_calls: usize,
}

/// Final data from a successful loop.
#[derive(Debug, Clone, Default)]
pub struct LoopSuccess {
    /// Final textual answer, when the loop produced one.
    pub text: Option<String>,
    /// Fallback content field, used when `text` is empty.
    pub content: Option<String>,
    pub usage: Usage,
    pub metadata: LoopMetadata,
}

/// Tagged outcome of a driver run.
#[derive(Debug, Clone)]
pub enum LoopOutcome {
    Success(LoopSuccess),
    Failure { message: String },
}

/// The external loop driver.
#[async_trait]
pub trait LoopDriver: Send + Sync {
    async fn drive(&self, request: LoopRequest) -> LoopOutcome;
}
