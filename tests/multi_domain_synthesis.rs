//! Multi-domain synthesis: a query that clears the confidence threshold for more than one agent
//! gets a synthesized answer with one labeled section per selected agent and a single,
//! deduplicated citation list.

use std::sync::Arc;

use bookbot_core::agent::fallback::FallbackAgent;
use bookbot_core::agent::{Agent, AgentDeps};
use bookbot_core::chunk::{Chunk, Domain, RetrievedPassage};
use bookbot_core::llm::{BoxFuture as LlmBoxFuture, BoxStream as LlmBoxStream, ChatMessage, ChatRole, LlmClient, LlmError};
use bookbot_core::registry::AgentRegistry;
use bookbot_core::retrieval::{BoxFuture as RetrievalBoxFuture, EmbeddingClient, RetrievalError, RetrievalRequest, RetrievalSkill, VectorStoreClient};
use bookbot_core::session::InMemorySessionStore;
use bookbot_core::{PipelineConfig, RagPipeline};

struct StubEmbedder;
impl EmbeddingClient for StubEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> RetrievalBoxFuture<'a, Result<Vec<f32>, RetrievalError>> {
        Box::pin(async { Ok(vec![0.2, 0.2]) })
    }
}

fn passage(source: &str, title: &str, domain: Domain) -> RetrievedPassage {
    RetrievedPassage {
        chunk: Chunk {
            chunk_id: format!("{source}-0"),
            document_id: source.to_string(),
            text: "stub passage body".to_string(),
            source: source.to_string(),
            title: title.to_string(),
            section: None,
            domain: Some(domain),
        },
        score: 0.9,
        rank: 0,
    }
}

struct DomainStore;
impl VectorStoreClient for DomainStore {
    fn query<'a>(
        &'a self,
        request: RetrievalRequest,
    ) -> RetrievalBoxFuture<'a, Result<Vec<RetrievedPassage>, RetrievalError>> {
        Box::pin(async move {
            let passages = match request.domain_filter {
                Some(Domain::ModuleInfo) => vec![passage("module3-isaac/sensors.md", "Isaac Sensors", Domain::ModuleInfo)],
                Some(Domain::Hardware) => vec![passage("hardware/gpu-requirements.md", "GPU Requirements", Domain::Hardware)],
                _ => vec![],
            };
            Ok(passages)
        })
    }
}

struct ScriptedLlm;
impl LlmClient for ScriptedLlm {
    fn chat_stream<'a>(
        &'a self,
        messages: Vec<ChatMessage>,
    ) -> LlmBoxFuture<'a, Result<LlmBoxStream<'a, Result<String, LlmError>>, LlmError>> {
        Box::pin(async move {
            let system = messages
                .iter()
                .find(|m| m.role == ChatRole::System)
                .map(|m| m.content.clone())
                .unwrap_or_default();

            let reply = if system.contains("module-info agent") {
                "Isaac uses depth and RGB sensors to perceive its environment. [Source 1]"
            } else if system.contains("hardware agent") {
                "Those sensors need a workstation with an RTX-class GPU. [Source 1]"
            } else {
                "This course does not cover that topic."
            };

            let s: LlmBoxStream<'a, Result<String, LlmError>> =
                Box::pin(futures::stream::once(async move { Ok(reply.to_string()) }));
            Ok(s)
        })
    }
}

fn test_pipeline() -> RagPipeline {
    let deps = AgentDeps {
        retrieval: Arc::new(RetrievalSkill::new(Arc::new(StubEmbedder), Arc::new(DomainStore))),
        llm: Arc::new(ScriptedLlm),
    };
    let agents: Vec<Arc<dyn Agent>> = vec![
        Arc::new(bookbot_core::agent::glossary::GlossaryAgent::new(deps.clone())),
        Arc::new(bookbot_core::agent::hardware::HardwareAgent::new(deps.clone())),
        Arc::new(bookbot_core::agent::module_info::ModuleInfoAgent::new(deps.clone())),
        Arc::new(bookbot_core::agent::capstone::CapstoneAgent::new(deps.clone())),
        Arc::new(FallbackAgent::new(deps)),
    ];
    let registry = Arc::new(AgentRegistry::new(agents, "book").unwrap());
    RagPipeline::new(registry, Arc::new(InMemorySessionStore::new(10)), PipelineConfig::default())
}

const QUERY: &str = "How does the ROS 2 Isaac module handle sensors, and what hardware do they require?";

#[tokio::test]
async fn query_spanning_two_domains_routes_module_info_primary_hardware_secondary() {
    let pipeline = test_pipeline();
    let route = pipeline.route_preview(QUERY);
    assert_eq!(route.primary_agent, "module_info");
    assert!(route.is_multi_domain);
    assert!(route.secondary_agents.contains(&"hardware".to_string()));
}

#[tokio::test]
async fn synthesized_answer_has_a_section_per_agent_and_deduplicated_citations() {
    let pipeline = test_pipeline();
    let response = pipeline.chat(QUERY.to_string(), None, None).await.unwrap();

    assert!(response.response.contains("## Module info"));
    assert!(response.response.contains("## Hardware"));
    assert!(response.response.to_lowercase().contains("sensors"));
    assert!(response.response.to_lowercase().contains("gpu"));

    assert_eq!(response.citations.len(), 2);
    let sources: Vec<&str> = response.citations.iter().map(|c| c.source.as_str()).collect();
    assert!(sources.contains(&"module3-isaac/sensors.md"));
    assert!(sources.contains(&"hardware/gpu-requirements.md"));

    let indices: Vec<usize> = response.citations.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 2]);
}
