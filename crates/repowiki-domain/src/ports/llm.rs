//! The LLM port — chat-completion calls used by the wiki generator's
//! outline/page/diagram sub-agents.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// A single chat message. Roles follow the common `system`/`user`/`assistant`
/// convention; providers map them to whatever their wire format expects.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Parameters for a single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Request a complete response. Implementations classify failures into
    /// [`crate::error::Error::Transient`] (rate limit/connection), a plain
    /// [`crate::error::Error::TokenBudget`] when the prompt itself overflows
    /// the model's context window, or [`crate::error::Error::Llm`] for
    /// anything else.
    async fn generate(&self, request: CompletionRequest) -> Result<String>;

    /// Request a streamed response, yielded as incremental text deltas. Used
    /// by progress-streaming page generation; callers that only need the
    /// final text should prefer [`Self::generate`].
    async fn stream(&self, request: CompletionRequest) -> Result<BoxStream<'static, Result<String>>>;
}
