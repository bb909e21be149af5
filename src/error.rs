//! Error taxonomy for the query-handling core.
//!
//! `PipelineError` is the single type surfaced by [`crate::pipeline::RagPipeline::chat`].
//! The streaming path ([`crate::pipeline::RagPipeline::chat_stream`]) never raises this type
//! across the stream boundary: it is translated into a single
//! [`crate::agent::AgentEvent::Error`] instead.

use crate::retrieval::RetrievalError;

/// Errors that can surface from a non-streaming `chat` call.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Empty or otherwise meaningless query.
    #[error("query is invalid: {0}")]
    QueryInvalid(String),

    /// Query exceeds the 2000 character budget.
    #[error("query exceeds the maximum length of {max} characters")]
    QueryTooLong { max: usize },

    /// `selected_text` present but outside the 10..2000 character budget.
    #[error("selected text must be between {min} and {max} characters")]
    SelectedTextInvalid { min: usize, max: usize },

    /// Vector store failure while serving the primary agent.
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(#[from] RetrievalError),

    /// LLM provider failure, or a stream interruption mid-completion.
    #[error("language model unavailable: {0}")]
    LlmUnavailable(String),

    /// An agent failed unexpectedly and the automatic fallback re-run also failed.
    #[error("agent failure: {0}")]
    AgentFailure(String),
}

// Note: session write failures (`SessionError`) intentionally have no conversion into
// `PipelineError` — they are logged and never surfaced to the caller.
