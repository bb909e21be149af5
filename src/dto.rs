//! Wire-shape DTOs for the external-facing chat, route-preview, and agent-listing interfaces.
//! Kept separate from the domain types
//! in [`crate::agent`]/[`crate::citation`]/[`crate::router`] so the JSON shape can evolve
//! (field renames, versioning) without disturbing the core's internal vocabulary.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::citation::Citation;
use crate::router::RouteResult;

/// One SSE payload for the chat stream endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEventDto {
    #[serde(rename = "type")]
    pub event_type: StreamEventType,
    pub content: StreamEventContent,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_used: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    Text,
    Source,
    End,
    Error,
}

/// `content` is a string for `text`/`error`, a citation object for `source`, and empty for `end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEventContent {
    Text(String),
    Citation(Citation),
    Empty,
}

impl StreamEventDto {
    pub fn text(session_id: impl Into<String>, agent_used: &str, delta: impl Into<String>) -> Self {
        Self {
            event_type: StreamEventType::Text,
            content: StreamEventContent::Text(delta.into()),
            session_id: session_id.into(),
            agent_used: Some(agent_used.to_string()),
        }
    }

    pub fn source(session_id: impl Into<String>, citation: Citation) -> Self {
        Self {
            event_type: StreamEventType::Source,
            content: StreamEventContent::Citation(citation),
            session_id: session_id.into(),
            agent_used: None,
        }
    }

    pub fn end(session_id: impl Into<String>, agent_used: &str) -> Self {
        Self {
            event_type: StreamEventType::End,
            content: StreamEventContent::Empty,
            session_id: session_id.into(),
            agent_used: Some(agent_used.to_string()),
        }
    }

    pub fn error(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_type: StreamEventType::Error,
            content: StreamEventContent::Text(message.into()),
            session_id: session_id.into(),
            agent_used: None,
        }
    }

    /// Renders as one `data: <json>\n\n` frame.
    pub fn to_sse_frame(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

/// Response body of the route-preview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePreviewDto {
    pub primary_agent: String,
    pub secondary_agents: Vec<String>,
    pub confidence: f64,
    pub reason: String,
    pub is_multi_domain: bool,
}

impl From<RouteResult> for RoutePreviewDto {
    fn from(route: RouteResult) -> Self {
        Self {
            primary_agent: route.primary_agent,
            secondary_agents: route.secondary_agents,
            confidence: route.confidence,
            reason: route.routing_reason,
            is_multi_domain: route.is_multi_domain,
        }
    }
}

/// One entry of the agent introspection listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummaryDto {
    pub name: String,
    pub domain: String,
    pub description: String,
    pub keywords: Vec<String>,
}

impl AgentSummaryDto {
    pub fn from_agent(agent: &dyn Agent) -> Self {
        Self {
            name: agent.name().to_string(),
            domain: agent.domain().as_str().to_string(),
            description: agent.description().to_string(),
            keywords: agent.keywords().iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Response body of `GET /api/chatbot/agents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentListDto {
    pub agents: Vec<AgentSummaryDto>,
    pub total: usize,
}
