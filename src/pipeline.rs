//! RAG Pipeline Orchestrator: the single entry point binding validation, routing,
//! agent execution, multi-agent synthesis, and session persistence together.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::{Agent, AgentContext, AgentErrorKind, AgentEvent, BoxStream};
use crate::citation::{merge_citations, Citation};
use crate::config::PipelineConfig;
use crate::dto::AgentSummaryDto;
use crate::error::PipelineError;
use crate::registry::AgentRegistry;
use crate::router::{QueryRouter, RouteResult};
use crate::session::{save_best_effort, SessionMessage, SessionStore};

const MIN_QUERY_LEN: usize = 1;
const MAX_QUERY_LEN: usize = 2000;
const MIN_SELECTED_TEXT_LEN: usize = 10;
const MAX_SELECTED_TEXT_LEN: usize = 2000;

/// Non-streaming answer.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    pub citations: Vec<Citation>,
    pub agent_name: String,
    pub confidence: f64,
}

/// One unit of the live answer stream. A single
/// `End` or `Error` always closes the sequence. Every variant carries `session_id` — the resolved
/// id, allocated fresh when the caller passed `None` — so a caller that starts an anonymous
/// conversation can learn the id to continue it on the next turn.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Text { session_id: String, agent_name: String, delta: String },
    Source { session_id: String, citation: Citation },
    End { session_id: String, agent_name: String },
    Error { session_id: String, message: String },
}

pub struct RagPipeline {
    registry: Arc<AgentRegistry>,
    router: QueryRouter,
    session_store: Arc<dyn SessionStore>,
    config: PipelineConfig,
}

impl RagPipeline {
    pub fn new(
        registry: Arc<AgentRegistry>,
        session_store: Arc<dyn SessionStore>,
        config: PipelineConfig,
    ) -> Self {
        let router = QueryRouter::new(config.confidence_threshold, config.secondary_topk);
        Self { registry, router, session_store, config }
    }

    /// Pure, side-effect-free routing preview.
    pub fn route_preview(&self, query: &str) -> RouteResult {
        self.router.route(query, &self.registry)
    }

    /// Agent introspection listing.
    pub fn agent_summaries(&self) -> Vec<AgentSummaryDto> {
        self.registry.iter().map(|a| AgentSummaryDto::from_agent(a.as_ref())).collect()
    }

    pub fn agent_summary(&self, name: &str) -> Option<AgentSummaryDto> {
        self.registry.get(name).map(|a| AgentSummaryDto::from_agent(a.as_ref()))
    }

    /// Non-streaming `chat`: drains [`RagPipeline::chat_stream`] into one response.
    pub async fn chat(
        &self,
        query: String,
        session_id: Option<String>,
        selected_text: Option<String>,
    ) -> Result<ChatResponse, PipelineError> {
        self.validate(&query, &selected_text)?;
        let confidence = self.router.route(&query, &self.registry).confidence;

        let mut stream = self.chat_stream(query, session_id, selected_text);
        let mut text = String::new();
        let mut citations = Vec::new();
        let mut agent_name = String::new();
        let mut resolved_session_id = String::new();

        while let Some(event) = stream.next().await {
            match event {
                ChatEvent::Text { session_id, agent_name: name, delta } => {
                    resolved_session_id = session_id;
                    agent_name = name;
                    text.push_str(&delta);
                }
                ChatEvent::Source { session_id, citation } => {
                    resolved_session_id = session_id;
                    citations.push(citation);
                }
                ChatEvent::End { session_id, agent_name: name } => {
                    agent_name = name;
                    return Ok(ChatResponse {
                        session_id,
                        response: text,
                        citations,
                        agent_name,
                        confidence,
                    });
                }
                ChatEvent::Error { message, .. } => return Err(PipelineError::AgentFailure(message)),
            }
        }

        Ok(ChatResponse { session_id: resolved_session_id, response: text, citations, agent_name, confidence })
    }

    /// Primary operation: validates, resolves the session, consults the router, runs
    /// the selected agent(s), and streams events. Bypasses the router entirely when called via
    /// [`RagPipeline::chat_stream_with_agent`].
    pub fn chat_stream(
        &self,
        query: String,
        session_id: Option<String>,
        selected_text: Option<String>,
    ) -> BoxStream<'static, ChatEvent> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Err(err) = self.validate(&query, &selected_text) {
            tracing::error!(session_id = %session_id, error = %err, "rejected chat request");
            return Box::pin(stream! {
                yield ChatEvent::Error { session_id, message: err.to_string() };
            });
        }

        let registry = Arc::clone(&self.registry);
        let session_store = Arc::clone(&self.session_store);
        let config = self.config.clone();
        let route = self.router.route(&query, &registry);
        let span = tracing::info_span!("chat_stream", session_id = %session_id, agent = %route.primary_agent);

        Box::pin(stream! {
            save_best_effort(&session_store, &session_id, SessionMessage::user(query.clone())).await;
            let history = session_store.get_history(&session_id, config.history_window).await;

            let ctx = AgentContext {
                session_id: session_id.clone(),
                history,
                selected_text: selected_text.clone(),
                retrieval_limit: config.retrieval_default_limit,
                score_floor: config.retrieval_score_floor,
            };

            let mut events = run_route(registry.clone(), route, query.clone(), ctx, &config);
            let mut final_agent_name = String::new();
            let mut full_text = String::new();
            let mut succeeded = false;

            while let Some(event) = events.next().await {
                match &event {
                    ChatEvent::End { agent_name, .. } => {
                        final_agent_name = agent_name.clone();
                        succeeded = true;
                    }
                    ChatEvent::Text { agent_name, delta, .. } => {
                        final_agent_name = agent_name.clone();
                        full_text.push_str(delta);
                    }
                    ChatEvent::Error { message, .. } => {
                        tracing::error!(session_id = %session_id, error = %message, "chat stream ended in error");
                    }
                    _ => {}
                }
                let is_terminal = matches!(event, ChatEvent::End { .. } | ChatEvent::Error { .. });
                yield event;
                if is_terminal {
                    break;
                }
            }

            if succeeded {
                save_best_effort(
                    &session_store,
                    &session_id,
                    SessionMessage::assistant(full_text, final_agent_name),
                )
                .await;
            }
        }.instrument(span))
    }

    /// Bypasses the router and invokes `agent_name` directly.
    pub fn chat_stream_with_agent(
        &self,
        agent_name: &str,
        query: String,
        session_id: Option<String>,
        selected_text: Option<String>,
    ) -> Result<BoxStream<'static, ChatEvent>, PipelineError> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if let Err(err) = self.validate(&query, &selected_text) {
            tracing::error!(session_id = %session_id, error = %err, "rejected chat request");
            return Err(err);
        }
        let agent = self
            .registry
            .get(agent_name)
            .ok_or_else(|| PipelineError::QueryInvalid(format!("unknown agent {agent_name:?}")))?
            .clone();

        let session_store = Arc::clone(&self.session_store);
        let config = self.config.clone();
        let span = tracing::info_span!("chat_stream", session_id = %session_id, agent = %agent_name);

        Ok(Box::pin(stream! {
            save_best_effort(&session_store, &session_id, SessionMessage::user(query.clone())).await;
            let history = session_store.get_history(&session_id, config.history_window).await;

            let ctx = AgentContext {
                session_id: session_id.clone(),
                history,
                selected_text: selected_text.clone(),
                retrieval_limit: config.retrieval_default_limit,
                score_floor: config.retrieval_score_floor,
            };

            let agent_name = agent.name().to_string();
            let mut inner = with_timeouts(
                agent.run_stream(query.clone(), ctx),
                config.agent_soft_timeout,
                config.agent_hard_timeout,
            );

            let mut succeeded = false;
            let mut full_text = String::new();
            while let Some(event) = inner.next().await {
                match event {
                    AgentEvent::Token(delta) => {
                        full_text.push_str(&delta);
                        yield ChatEvent::Text { session_id: session_id.clone(), agent_name: agent_name.clone(), delta };
                    }
                    AgentEvent::Citations(citations) => {
                        for citation in citations {
                            yield ChatEvent::Source { session_id: session_id.clone(), citation };
                        }
                    }
                    AgentEvent::Error(kind) => {
                        tracing::error!(session_id = %session_id, error = %kind, "chat stream ended in error");
                        yield ChatEvent::Error { session_id: session_id.clone(), message: kind.to_string() };
                        break;
                    }
                    AgentEvent::End => {
                        succeeded = true;
                        yield ChatEvent::End { session_id: session_id.clone(), agent_name: agent_name.clone() };
                        break;
                    }
                }
            }

            if succeeded {
                save_best_effort(&session_store, &session_id, SessionMessage::assistant(full_text, agent_name))
                    .await;
            }
        }.instrument(span)))
    }

    /// Non-streaming direct-agent invocation, mirroring [`RagPipeline::chat`].
    pub async fn chat_with_agent(
        &self,
        agent_name: &str,
        query: String,
        session_id: Option<String>,
        selected_text: Option<String>,
    ) -> Result<ChatResponse, PipelineError> {
        let mut stream = self.chat_stream_with_agent(agent_name, query, session_id, selected_text)?;
        let mut text = String::new();
        let mut citations = Vec::new();
        let mut name = agent_name.to_string();
        let mut resolved_session_id = String::new();
        while let Some(event) = stream.next().await {
            match event {
                ChatEvent::Text { session_id, agent_name, delta } => {
                    resolved_session_id = session_id;
                    name = agent_name;
                    text.push_str(&delta);
                }
                ChatEvent::Source { session_id, citation } => {
                    resolved_session_id = session_id;
                    citations.push(citation);
                }
                ChatEvent::End { session_id, agent_name } => {
                    resolved_session_id = session_id;
                    name = agent_name;
                    break;
                }
                ChatEvent::Error { message, .. } => return Err(PipelineError::AgentFailure(message)),
            }
        }
        Ok(ChatResponse {
            session_id: resolved_session_id,
            response: text,
            citations,
            agent_name: name,
            confidence: 1.0,
        })
    }

    fn validate(&self, query: &str, selected_text: &Option<String>) -> Result<(), PipelineError> {
        if query.is_empty() {
            return Err(PipelineError::QueryInvalid("query must not be empty".to_string()));
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(PipelineError::QueryTooLong { max: MAX_QUERY_LEN });
        }
        if query.chars().count() < MIN_QUERY_LEN {
            return Err(PipelineError::QueryInvalid("query must not be empty".to_string()));
        }
        if let Some(sel) = selected_text {
            let len = sel.chars().count();
            if len < MIN_SELECTED_TEXT_LEN || len > MAX_SELECTED_TEXT_LEN {
                return Err(PipelineError::SelectedTextInvalid {
                    min: MIN_SELECTED_TEXT_LEN,
                    max: MAX_SELECTED_TEXT_LEN,
                });
            }
        }
        Ok(())
    }
}

/// Runs the route decision to completion: single-agent execution, or sequential multi-agent
/// execution followed by synthesis.
fn run_route(
    registry: Arc<AgentRegistry>,
    route: RouteResult,
    query: String,
    ctx: AgentContext,
    config: &PipelineConfig,
) -> BoxStream<'static, ChatEvent> {
    let config = config.clone();
    let session_id = ctx.session_id.clone();
    Box::pin(stream! {
        let primary = match registry.get(&route.primary_agent) {
            Some(a) => a.clone(),
            None => {
                yield ChatEvent::Error {
                    session_id: session_id.clone(),
                    message: format!("router selected unknown agent {:?}", route.primary_agent),
                };
                return;
            }
        };

        if !route.is_multi_domain {
            let mut outcome = run_agent_with_fallback(registry.clone(), primary, query, ctx, &config).await;
            for event in outcome.drain(..) {
                yield event;
            }
            return;
        }

        // Multi-agent synthesis: lead paragraph, then each agent's section
        // under a labeled heading, then the merged/renumbered citation list, then one `end`.
        let mut domain_names = vec![route.primary_agent.clone()];
        domain_names.extend(route.secondary_agents.iter().cloned());
        yield ChatEvent::Text {
            session_id: session_id.clone(),
            agent_name: route.primary_agent.clone(),
            delta: format!("This question touches {}.\n\n", domain_names.join(", ")),
        };

        let mut all_citations: Vec<Vec<Citation>> = Vec::new();

        yield ChatEvent::Text {
            session_id: session_id.clone(),
            agent_name: route.primary_agent.clone(),
            delta: format!("## {}\n", display_name(&route.primary_agent)),
        };
        let mut primary_outcome =
            run_agent_with_fallback(registry.clone(), primary.clone(), query.clone(), ctx.clone(), &config).await;
        let mut primary_failed = false;
        for event in primary_outcome.drain(..) {
            if let ChatEvent::Source { citation, .. } = &event {
                all_citations.push(vec![citation.clone()]);
                continue;
            }
            if matches!(event, ChatEvent::Error { .. }) {
                primary_failed = true;
            }
            if !matches!(event, ChatEvent::End { .. }) {
                yield event;
            }
        }
        if primary_failed {
            return;
        }

        for secondary_name in &route.secondary_agents {
            let Some(secondary) = registry.get(secondary_name) else { continue };
            let sub_query = crate::router::derive_sub_query(&query, secondary.as_ref());

            yield ChatEvent::Text {
                session_id: session_id.clone(),
                agent_name: secondary_name.clone(),
                delta: format!("\n## {}\n", display_name(secondary_name)),
            };

            let mut inner = with_timeouts(
                secondary.run_stream(sub_query, ctx.clone()),
                config.agent_soft_timeout,
                config.agent_hard_timeout,
            );
            let mut secondary_citations = Vec::new();
            let mut secondary_failed = false;
            while let Some(event) = inner.next().await {
                match event {
                    AgentEvent::Token(delta) => yield ChatEvent::Text {
                        session_id: session_id.clone(),
                        agent_name: secondary_name.clone(),
                        delta,
                    },
                    AgentEvent::Citations(c) => secondary_citations = c,
                    AgentEvent::Error(kind) => {
                        tracing::warn!(agent = %secondary_name, error = %kind, "secondary agent failed; skipping");
                        secondary_failed = true;
                        break;
                    }
                    AgentEvent::End => break,
                }
            }
            if !secondary_failed {
                all_citations.push(secondary_citations);
            }
        }

        let merged = merge_citations(all_citations);
        for citation in &merged {
            yield ChatEvent::Source { session_id: session_id.clone(), citation: citation.clone() };
        }
        yield ChatEvent::End { session_id: session_id.clone(), agent_name: route.primary_agent.clone() };
    })
}

/// Runs `agent`, retrying exactly once through the registry's default agent on an
/// [`AgentErrorKind::Unexpected`] failure.
/// Returns the full event sequence (not yet forwarded) so callers can inspect citations before
/// re-emitting them — multi-agent synthesis needs to intercept `Source` events to merge them, a
/// single-agent run just forwards the vector as-is.
async fn run_agent_with_fallback(
    registry: Arc<AgentRegistry>,
    agent: Arc<dyn Agent>,
    query: String,
    ctx: AgentContext,
    config: &PipelineConfig,
) -> Vec<ChatEvent> {
    let agent_name = agent.name().to_string();
    let (events, failure) =
        collect_agent_run(agent, query.clone(), ctx.clone(), config, agent_name.clone()).await;

    let session_id = ctx.session_id.clone();
    match failure {
        Some(kind) if kind.is_retry_eligible() && agent_name != registry.default_agent_name() => {
            tracing::warn!(agent = %agent_name, error = %kind, "agent failed unexpectedly; retrying via fallback agent");
            let fallback = registry.default_agent().clone();
            let fallback_name = fallback.name().to_string();
            let (fallback_events, fallback_failure) =
                collect_agent_run(fallback, query, ctx, config, fallback_name).await;
            if fallback_failure.is_some() {
                tracing::error!(session_id = %session_id, agent = %agent_name, "agent and fallback retry both failed");
                vec![ChatEvent::Error {
                    session_id,
                    message: "the agent failed and the fallback retry also failed".to_string(),
                }]
            } else {
                fallback_events
            }
        }
        Some(kind) => {
            tracing::error!(session_id = %session_id, agent = %agent_name, error = %kind, "agent failed");
            vec![ChatEvent::Error { session_id, message: kind.to_string() }]
        }
        None => events,
    }
}

async fn collect_agent_run(
    agent: Arc<dyn Agent>,
    query: String,
    ctx: AgentContext,
    config: &PipelineConfig,
    agent_name: String,
) -> (Vec<ChatEvent>, Option<AgentErrorKind>) {
    let session_id = ctx.session_id.clone();
    let mut inner = with_timeouts(
        agent.run_stream(query, ctx),
        config.agent_soft_timeout,
        config.agent_hard_timeout,
    );
    let mut events = Vec::new();
    let mut failure = None;
    while let Some(event) = inner.next().await {
        match event {
            AgentEvent::Token(delta) => events.push(ChatEvent::Text {
                session_id: session_id.clone(),
                agent_name: agent_name.clone(),
                delta,
            }),
            AgentEvent::Citations(citations) => {
                for citation in citations {
                    events.push(ChatEvent::Source { session_id: session_id.clone(), citation });
                }
            }
            AgentEvent::Error(kind) => {
                failure = Some(kind);
                break;
            }
            AgentEvent::End => {
                events.push(ChatEvent::End { session_id: session_id.clone(), agent_name: agent_name.clone() });
                break;
            }
        }
    }
    (events, failure)
}

/// Wraps an agent's event stream with soft/hard execution timeouts: a soft timeout
/// logs a warning but lets the agent keep running; a hard timeout drops the inner stream (forcing
/// cancellation of whatever suspension point it's at) and synthesizes a terminal error.
fn with_timeouts(
    events: BoxStream<'static, AgentEvent>,
    soft: Duration,
    hard: Duration,
) -> BoxStream<'static, AgentEvent> {
    Box::pin(stream! {
        let start = tokio::time::Instant::now();
        let mut warned = false;
        tokio::pin!(events);
        loop {
            let remaining_hard = hard.saturating_sub(start.elapsed());
            if remaining_hard.is_zero() {
                yield AgentEvent::Error(AgentErrorKind::Unexpected("agent exceeded hard timeout".to_string()));
                return;
            }
            match tokio::time::timeout(remaining_hard, events.next()).await {
                Ok(Some(event)) => {
                    if !warned && start.elapsed() >= soft {
                        tracing::warn!("agent exceeded soft timeout; continuing until hard timeout");
                        warned = true;
                    }
                    let is_terminal = matches!(event, AgentEvent::End | AgentEvent::Error(_));
                    yield event;
                    if is_terminal {
                        return;
                    }
                }
                Ok(None) => return,
                Err(_) => {
                    yield AgentEvent::Error(AgentErrorKind::Unexpected("agent exceeded hard timeout".to_string()));
                    return;
                }
            }
        }
    })
}

fn display_name(agent_name: &str) -> String {
    let mut chars = agent_name.replace('_', " ");
    if let Some(first) = chars.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    chars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentDeps, BoxStream as AgentBoxStream};
    use crate::chunk::{Chunk, Domain, RetrievedPassage};
    use crate::llm::{BoxFuture as LlmBoxFuture, BoxStream as LlmBoxStream, ChatMessage, LlmClient, LlmError};
    use crate::retrieval::{EmbeddingClient, RetrievalError, RetrievalRequest, RetrievalSkill, VectorStoreClient};
    use crate::session::InMemorySessionStore;
    use async_stream::stream as astream;

    struct StubEmbedder;
    impl EmbeddingClient for StubEmbedder {
        fn embed<'a>(&'a self, _text: &'a str) -> crate::retrieval::BoxFuture<'a, Result<Vec<f32>, RetrievalError>> {
            Box::pin(async { Ok(vec![0.1]) })
        }
    }

    struct StubStore;
    impl VectorStoreClient for StubStore {
        fn query<'a>(
            &'a self,
            request: RetrievalRequest,
        ) -> crate::retrieval::BoxFuture<'a, Result<Vec<RetrievedPassage>, RetrievalError>> {
            Box::pin(async move {
                Ok(vec![RetrievedPassage {
                    chunk: Chunk {
                        chunk_id: "c1".into(),
                        document_id: "d1".into(),
                        text: "A topic is a named channel for ROS 2 messages.".into(),
                        source: "module1-ros2/topics.md".into(),
                        title: "Topics".into(),
                        section: None,
                        domain: request.domain_filter,
                    },
                    score: 0.9,
                    rank: 0,
                }])
            })
        }
    }

    struct StubLlm;
    impl LlmClient for StubLlm {
        fn chat_stream<'a>(
            &'a self,
            _messages: Vec<ChatMessage>,
        ) -> LlmBoxFuture<'a, Result<LlmBoxStream<'a, Result<String, LlmError>>, LlmError>> {
            Box::pin(async move {
                let s: LlmBoxStream<'a, Result<String, LlmError>> = Box::pin(astream! {
                    yield Ok("A topic ".to_string());
                    yield Ok("is a named channel [Source 1].".to_string());
                });
                Ok(s)
            })
        }
    }

    fn test_registry() -> Arc<AgentRegistry> {
        let deps = AgentDeps { retrieval: Arc::new(RetrievalSkill::new(Arc::new(StubEmbedder), Arc::new(StubStore))), llm: Arc::new(StubLlm) };
        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(crate::agent::glossary::GlossaryAgent::new(deps.clone())),
            Arc::new(crate::agent::hardware::HardwareAgent::new(deps.clone())),
            Arc::new(crate::agent::module_info::ModuleInfoAgent::new(deps.clone())),
            Arc::new(crate::agent::capstone::CapstoneAgent::new(deps.clone())),
            Arc::new(crate::agent::fallback::FallbackAgent::new(deps)),
        ];
        Arc::new(AgentRegistry::new(agents, "book").unwrap())
    }

    fn test_pipeline() -> RagPipeline {
        RagPipeline::new(test_registry(), Arc::new(InMemorySessionStore::new(10)), PipelineConfig::default())
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_invoking_any_agent() {
        let pipeline = test_pipeline();
        let err = pipeline.chat("".to_string(), None, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::QueryInvalid(_)));
    }

    #[tokio::test]
    async fn too_long_query_is_rejected() {
        let pipeline = test_pipeline();
        let query = "a".repeat(MAX_QUERY_LEN + 1);
        let err = pipeline.chat(query, None, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::QueryTooLong { .. }));
    }

    #[tokio::test]
    async fn glossary_query_routes_to_glossary_and_cites_module1() {
        let pipeline = test_pipeline();
        let response = pipeline
            .chat("What is a topic in ROS 2?".to_string(), None, None)
            .await
            .unwrap();
        assert_eq!(response.agent_name, "glossary");
        assert!(!response.citations.is_empty());
        assert!(response.citations[0].source.contains("module1-ros2"));
        assert!(response.response.contains("[Source 1]"));
    }

    #[tokio::test]
    async fn unmatched_query_falls_back_to_book_agent_without_error() {
        let pipeline = test_pipeline();
        let response = pipeline
            .chat("What is the recipe for chocolate cake?".to_string(), None, None)
            .await
            .unwrap();
        assert_eq!(response.agent_name, "book");
    }

    #[tokio::test]
    async fn session_history_round_trips_across_two_turns() {
        let pipeline = test_pipeline();
        let first = pipeline
            .chat("define topic".to_string(), Some("session-a".to_string()), None)
            .await
            .unwrap();
        let _second = pipeline
            .chat("and what about nodes".to_string(), Some("session-a".to_string()), None)
            .await
            .unwrap();
        assert_eq!(first.agent_name, "glossary");
    }

    #[tokio::test]
    async fn anonymous_turn_surfaces_an_allocated_session_id() {
        let pipeline = test_pipeline();
        let response = pipeline.chat("define topic".to_string(), None, None).await.unwrap();
        assert!(!response.session_id.is_empty());
    }

    #[tokio::test]
    async fn explicit_session_id_is_echoed_back() {
        let pipeline = test_pipeline();
        let response = pipeline
            .chat("define topic".to_string(), Some("session-b".to_string()), None)
            .await
            .unwrap();
        assert_eq!(response.session_id, "session-b");
    }
}
