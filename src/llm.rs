//! Language model boundary: a streamed chat completion over a constructed
//! prompt. Mirrors the `CompletionModel`/streaming split of `rig-core/src/streaming.rs`,
//! `rig-core/src/completion/request.rs`) collapsed to the one shape this crate needs: a system
//! prompt, a message history, and a token stream back.

use std::future::Future;
use std::pin::Pin;

use futures::stream::Stream;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Failure calling the language model, including a stream interruption mid-completion.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum LlmError {
    #[error("language model provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("language model stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// One role-tagged turn passed to the model as prompt context.
#[derive(Debug, Clone, PartialEq)]
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

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// A streamed language model. `chat_stream` yields text deltas until the model finishes or
/// errors; `chat` is a non-streaming convenience that drains the stream into one `String`.
pub trait LlmClient: Send + Sync {
    fn chat_stream<'a>(
        &'a self,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'a, Result<BoxStream<'a, Result<String, LlmError>>, LlmError>>;
}

/// Drains a client's stream into one string, for callers (like the capstone agent's rubric pass)
/// that need the complete answer rather than a live token feed.
pub async fn chat_complete(client: &dyn LlmClient, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
    use futures::StreamExt;

    let mut stream = client.chat_stream(messages).await?;
    let mut out = String::new();
    while let Some(chunk) = stream.next().await {
        out.push_str(&chunk?);
    }
    Ok(out)
}
