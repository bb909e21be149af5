//! The capstone agent: guides the humanoid voice-command capstone project.

use async_stream::stream;
use futures::StreamExt;

use crate::agent::{
    build_messages, build_system_prompt, dedupe_passages_for_prompt, run_llm_and_clean, Agent, AgentContext,
    AgentDeps, AgentErrorKind, AgentEvent, BoxStream,
};
use crate::chunk::Domain;
use crate::citation::build_citations;

const PERSONA: &str = "You are the capstone agent for a hardware/ROS 2 robotics course, guiding the \
humanoid voice-command capstone project. When a question is about the pipeline as a whole, cover its \
stages in the canonical order: voice, then plan, then navigate, then manipulate. When listing project \
milestones, list them in their defined order.";

const KEYWORDS: &[&str] = &[
    "capstone", "project", "humanoid", "voice command", "manipulation", "whisper",
];

pub struct CapstoneAgent {
    deps: AgentDeps,
}

impl CapstoneAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl Agent for CapstoneAgent {
    fn name(&self) -> &'static str {
        "capstone"
    }

    fn domain(&self) -> Domain {
        Domain::Capstone
    }

    fn description(&self) -> &'static str {
        "Guides the humanoid voice-command capstone project."
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn run_stream(&self, query: String, ctx: AgentContext) -> BoxStream<'static, AgentEvent> {
        let retrieval = self.deps.retrieval.clone();
        let llm = self.deps.llm.clone();

        Box::pin(stream! {
            let passages = match retrieval
                .retrieve(&query, Some(Domain::Capstone), ctx.retrieval_limit, ctx.score_floor)
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
