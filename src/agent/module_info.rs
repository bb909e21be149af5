//! The module-info agent: explains course modules.

use async_stream::stream;
use futures::StreamExt;

use crate::agent::{
    build_messages, build_system_prompt, combined_score, dedupe_passages_for_prompt, run_llm_and_clean, Agent,
    AgentContext, AgentDeps, AgentErrorKind, AgentEvent, BoxStream,
};
use crate::chunk::Domain;
use crate::citation::build_citations;

const PERSONA: &str = "You are the module-info agent for a hardware/ROS 2 robotics course. You explain \
how the course modules (ROS 2, Gazebo, Isaac, VLA) work. When a query spans multiple modules, state the \
span up front and cover each module in order; reference prerequisite concepts when explaining advanced \
material.";

const KEYWORDS: &[&str] = &["ros 2", "ros2", "gazebo", "isaac", "vla", "module"];
const PATTERNS: &[&str] = &["explain", "how does"];

pub struct ModuleInfoAgent {
    deps: AgentDeps,
}

impl ModuleInfoAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl Agent for ModuleInfoAgent {
    fn name(&self) -> &'static str {
        "module_info"
    }

    fn domain(&self) -> Domain {
        Domain::ModuleInfo
    }

    fn description(&self) -> &'static str {
        "Explains how the ROS 2, Gazebo, Isaac, and VLA modules work."
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn can_handle(&self, query: &str) -> f64 {
        combined_score(query, KEYWORDS, PATTERNS)
    }

    fn run_stream(&self, query: String, ctx: AgentContext) -> BoxStream<'static, AgentEvent> {
        let retrieval = self.deps.retrieval.clone();
        let llm = self.deps.llm.clone();

        Box::pin(stream! {
            let passages = match retrieval
                .retrieve(&query, Some(Domain::ModuleInfo), ctx.retrieval_limit, ctx.score_floor)
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
