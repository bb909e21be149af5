//! The fallback book agent: the default agent, selected whenever no
//! other agent clears the router's confidence threshold. Searches without a domain filter.

use async_stream::stream;
use futures::StreamExt;

use crate::agent::{
    build_messages, build_system_prompt, dedupe_passages_for_prompt, run_llm_and_clean, Agent, AgentContext,
    AgentDeps, AgentErrorKind, AgentEvent, BoxStream,
};
use crate::chunk::Domain;
use crate::citation::build_citations;

const PERSONA: &str = "You are the general book agent for a hardware/ROS 2 robotics course. You search \
the whole book without a domain restriction. When the passages don't cover the user's question, say \
plainly that the book does not cover the topic rather than guessing.";

const KEYWORDS: &[&str] = &["book", "course", "general", "overview"];

pub struct FallbackAgent {
    deps: AgentDeps,
}

impl FallbackAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl Agent for FallbackAgent {
    fn name(&self) -> &'static str {
        "book"
    }

    fn domain(&self) -> Domain {
        Domain::General
    }

    fn description(&self) -> &'static str {
        "Searches the whole book with no domain restriction; the default agent."
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    /// Always 0.0: this agent is only ever selected by the router's fallback path,
    /// never by out-scoring a domain agent.
    fn can_handle(&self, _query: &str) -> f64 {
        0.0
    }

    fn run_stream(&self, query: String, ctx: AgentContext) -> BoxStream<'static, AgentEvent> {
        let retrieval = self.deps.retrieval.clone();
        let llm = self.deps.llm.clone();

        Box::pin(stream! {
            let passages = match retrieval
                .retrieve(&query, None, ctx.retrieval_limit, ctx.score_floor)
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    yield AgentEvent::Error(AgentErrorKind::Retrieval(e.to_string()));
                    return;
                }
            };

            let citations = build_citations(&passages);
            let prompt_passages = dedupe_passages_for_prompt(&passages);
            let system_prompt = build_system_prompt(PERSONA, &prompt_passages);
            let messages = build_messages(system_prompt, &ctx.history, &ctx.selected_text, &query);

            let mut cleaned = run_llm_and_clean(llm, messages, citations.len());
            let mut failure = None;
            while let Some(piece) = cleaned.next().await {
                match piece {
                    Ok(text) => yield AgentEvent::Token(text),
                    Err(kind) => {
                        failure = Some(kind);
                        break;
                    }
                }
            }
            match failure {
                Some(kind) => yield AgentEvent::Error(kind),
                None => {
                    yield AgentEvent::Citations(citations);
                    yield AgentEvent::End;
                }
            }
        })
    }
}
