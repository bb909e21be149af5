//! Agent abstraction: a named, domain-bound skill that turns a query plus
//! session context into a streamed answer with citations.
//!
//! Generalizes the `Agent`/streaming-completion split of `rig-core/src/agent.rs`,
//! `rig-core/src/streaming.rs`) to a fixed, heterogeneous registry of five agents rather than one
//! configurable agent per process. Every method takes owned parameters and boxes a `'static`
//! future/stream from inside the method body — each concrete agent clones its `Arc`-held
//! collaborators before constructing the boxed value — which keeps the trait itself free of
//! lifetime parameters and therefore usable as `Arc<dyn Agent>` in the registry.

pub mod capstone;
pub mod fallback;
pub mod glossary;
pub mod hardware;
pub mod module_info;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::Stream;

use crate::chunk::Domain;
use crate::citation::Citation;
use crate::llm::{ChatMessage, LlmClient};
use crate::retrieval::RetrievalSkill;
use crate::session::{Role, SessionMessage};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Per-request context handed to an agent: everything it needs beyond the query text itself.
#[derive(Clone)]
pub struct AgentContext {
    pub session_id: String,
    pub history: Vec<SessionMessage>,
    pub selected_text: Option<String>,
    pub retrieval_limit: usize,
    pub score_floor: f64,
}

/// Distinguishes retry-eligible failures from terminal ones: a `Retrieval` failure
/// is a terminal error with no retry, while `Unexpected` triggers exactly one automatic re-run
/// through the fallback agent.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum AgentErrorKind {
    #[error("retrieval unavailable: {0}")]
    Retrieval(String),
    #[error("language model unavailable: {0}")]
    Llm(String),
    #[error("agent failed unexpectedly: {0}")]
    Unexpected(String),
}

impl AgentErrorKind {
    /// Whether the pipeline should attempt one automatic fallback re-run after this failure.
    pub fn is_retry_eligible(&self) -> bool {
        matches!(self, AgentErrorKind::Unexpected(_))
    }
}

/// One event in an agent's live answer stream.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A text delta to append to the answer under construction.
    Token(String),
    /// The final, deduplicated citation list for this agent's contribution.
    Citations(Vec<Citation>),
    /// Terminal failure; no further events follow.
    Error(AgentErrorKind),
    /// Successful completion; no further events follow.
    End,
}

/// The full non-streaming result of running an agent once, used by `chat` and by
/// the pipeline's per-agent synthesis bookkeeping.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// A named skill bound to a single [`Domain`] (the fallback agent is the one exception, bound to
/// `Domain::General`).
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;
    fn domain(&self) -> Domain;

    /// Human-readable summary for agent introspection.
    fn description(&self) -> &'static str;

    /// At least three keywords, also surfaced via introspection.
    fn keywords(&self) -> &'static [&'static str];

    /// Deterministic, pure, no I/O self-confidence score in `[0,1]`.
    fn can_handle(&self, query: &str) -> f64 {
        keyword_score(query, self.keywords())
    }

    /// Stream the answer to `query` given `ctx`. Always ends in exactly one [`AgentEvent::Error`]
    /// or [`AgentEvent::End`].
    fn run_stream(&self, query: String, ctx: AgentContext) -> BoxStream<'static, AgentEvent>;

    /// Non-streaming convenience: drains [`Agent::run_stream`] into one [`AgentResponse`].
    fn run(&self, query: String, ctx: AgentContext) -> BoxFuture<'static, Result<AgentResponse, AgentErrorKind>> {
        use futures::StreamExt;
        let stream = self.run_stream(query, ctx);
        Box::pin(async move {
            let mut stream = stream;
            let mut text = String::new();
            let mut citations = Vec::new();
            while let Some(event) = stream.next().await {
                match event {
                    AgentEvent::Token(delta) => text.push_str(&delta),
                    AgentEvent::Citations(c) => citations = c,
                    AgentEvent::Error(kind) => return Err(kind),
                    AgentEvent::End => break,
                }
            }
            Ok(AgentResponse { text, citations })
        })
    }
}

/// Shared collaborators every concrete agent needs, bundled so registry construction doesn't
/// repeat five constructor signatures.
#[derive(Clone)]
pub struct AgentDeps {
    pub retrieval: Arc<RetrievalSkill>,
    pub llm: Arc<dyn LlmClient>,
}

/// Minimum viable scorer: case-insensitive substring match against `terms`,
/// `score = min(matches / 3, 1.0)`.
pub(crate) fn keyword_score(query: &str, terms: &[&str]) -> f64 {
    let query_lower = query.to_lowercase();
    let matches = terms.iter().filter(|t| query_lower.contains(&t.to_lowercase())).count();
    (matches as f64 / 3.0).min(1.0)
}

/// Combines keyword matches with additional pattern signals into one score, clamped to `[0,1]`.
pub(crate) fn combined_score(query: &str, keywords: &[&str], patterns: &[&str]) -> f64 {
    let query_lower = query.to_lowercase();
    let matches = keywords.iter().filter(|t| query_lower.contains(&t.to_lowercase())).count()
        + patterns.iter().filter(|t| query_lower.contains(&t.to_lowercase())).count();
    (matches as f64 / 3.0).min(1.0)
}

/// Collapses passages to one per `(source, section)`, keeping first-appearance order. Matches
/// [`crate::citation::build_citations`]'s own first-appearance numbering exactly, so a prompt
/// built from this list and a citation list built from the original `passages` always agree on
/// what `[Source N]` refers to.
pub(crate) fn dedupe_passages_for_prompt(
    passages: &[crate::chunk::RetrievedPassage],
) -> Vec<crate::chunk::RetrievedPassage> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for p in passages {
        let key = (p.chunk.source.clone(), p.chunk.section.clone());
        if seen.insert(key) {
            out.push(p.clone());
        }
    }
    out
}

/// Builds the system prompt shared by the five domain agents: role framing plus numbered context
/// passages an answer may cite as `[Source N]`. Pass a list already
/// collapsed with [`dedupe_passages_for_prompt`] so the numbers line up with the final citations.
pub(crate) fn build_system_prompt(persona: &str, passages: &[crate::chunk::RetrievedPassage]) -> String {
    let mut prompt = String::new();
    prompt.push_str(persona);
    prompt.push_str("\n\nAnswer using only the context passages below. Cite a passage inline as ");
    prompt.push_str("[Source N] using its number. If the passages don't contain the answer, say so plainly ");
    prompt.push_str("instead of guessing.\n\n");
    for (i, passage) in passages.iter().enumerate() {
        prompt.push_str(&format!(
            "[Source {}] {} ({}):\n{}\n\n",
            i + 1,
            passage.chunk.title,
            passage.chunk.source,
            passage.chunk.text
        ));
    }
    prompt
}

/// Streams a language model completion as cleaned text deltas, forwarding each one live as it
/// arrives and stripping any citation marker the model invents for a source outside the prompt's
/// numbered passages. Only an in-progress, unterminated `[Source ` sequence is ever held back —
/// [`crate::citation::split_clean_prefix`] buffers just that much so an illegal `[Source N]`
/// marker is always caught before it reaches the client, without delaying the rest of the answer
/// until the completion finishes.
pub(crate) fn run_llm_and_clean(
    llm: Arc<dyn LlmClient>,
    messages: Vec<ChatMessage>,
    citation_count: usize,
) -> BoxStream<'static, Result<String, AgentErrorKind>> {
    use futures::StreamExt;

    Box::pin(async_stream::stream! {
        let mut completion = match llm.chat_stream(messages).await {
            Ok(s) => s,
            Err(e) => {
                yield Err(AgentErrorKind::Llm(e.to_string()));
                return;
            }
        };

        let mut carry = String::new();
        while let Some(chunk) = completion.next().await {
            let delta = match chunk {
                Ok(delta) => delta,
                Err(e) => {
                    yield Err(AgentErrorKind::Llm(e.to_string()));
                    return;
                }
            };
            carry.push_str(&delta);
            let (ready, remainder) = crate::citation::split_clean_prefix(&carry, citation_count);
            carry = remainder;
            if !ready.is_empty() {
                yield Ok(ready);
            }
        }

        if !carry.is_empty() {
            yield Ok(crate::citation::drop_illegal_markers(&carry, citation_count));
        }
    })
}

/// Assembles the message list passed to the language model: system prompt, replayed session
/// history, an optional selected-text turn, then the current query.
pub(crate) fn build_messages(
    system_prompt: String,
    history: &[SessionMessage],
    selected_text: &Option<String>,
    query: &str,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt)];
    for turn in history {
        messages.push(match turn.role {
            Role::User => ChatMessage::user(turn.content.clone()),
            Role::Assistant => ChatMessage::assistant(turn.content.clone()),
        });
    }
    if let Some(sel) = selected_text {
        messages.push(ChatMessage::user(format!(
            "The user has selected this passage from the book:\n{sel}"
        )));
    }
    messages.push(ChatMessage::user(query.to_string()));
    messages
}
