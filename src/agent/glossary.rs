//! The glossary agent: defines terms.

use async_stream::stream;
use futures::StreamExt;

use crate::agent::{
    build_messages, build_system_prompt, combined_score, dedupe_passages_for_prompt, run_llm_and_clean, Agent,
    AgentContext, AgentDeps, AgentErrorKind, AgentEvent, BoxStream,
};
use crate::chunk::Domain;
use crate::citation::build_citations;

const PERSONA: &str = "You are the glossary agent for a hardware/ROS 2 robotics course. \
You answer short, precise definition questions about course terminology. When a term is used \
across multiple modules, explicitly enumerate each module's usage. When a term is not covered, \
say plainly: \"This term is not defined in this course.\"";

const KEYWORDS: &[&str] = &["glossary", "term", "definition", "terminology", "node", "message", "topic"];
const PATTERNS: &[&str] = &["what is", "define", "meaning of"];

pub struct GlossaryAgent {
    deps: AgentDeps,
}

impl GlossaryAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl Agent for GlossaryAgent {
    fn name(&self) -> &'static str {
        "glossary"
    }

    fn domain(&self) -> Domain {
        Domain::Glossary
    }

    fn description(&self) -> &'static str {
        "Defines course terminology."
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
                .retrieve(&query, Some(Domain::Glossary), ctx.retrieval_limit, ctx.score_floor)
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
