//! Agent Registry: a named collection of agents with a designated default,
//! initialized once at startup and read-only thereafter.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::Agent;

/// Failure building a registry — always a startup-time, fatal condition.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("agent name {0:?} is not lowercase snake_case")]
    InvalidName(String),
    #[error("duplicate agent name {0:?}")]
    DuplicateName(String),
    #[error("agent {0:?} declares fewer than three keywords")]
    TooFewKeywords(String),
    #[error("default agent {0:?} is not registered")]
    DefaultAgentNotRegistered(String),
}

/// Process-wide, read-only after construction.
pub struct AgentRegistry {
    agents: HashMap<&'static str, Arc<dyn Agent>>,
    default_agent_name: &'static str,
}

impl AgentRegistry {
    /// Validates every invariant before accepting the set: unique lowercase
    /// `[a-z0-9_]+` names, at least three keywords per agent, and a registered default.
    pub fn new(agents: Vec<Arc<dyn Agent>>, default_agent_name: &'static str) -> Result<Self, RegistryError> {
        let mut map = HashMap::with_capacity(agents.len());
        for agent in agents {
            let name = agent.name();
            if !is_lower_snake_case(name) {
                return Err(RegistryError::InvalidName(name.to_string()));
            }
            if agent.keywords().len() < 3 {
                return Err(RegistryError::TooFewKeywords(name.to_string()));
            }
            if map.insert(name, agent).is_some() {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
        }
        if !map.contains_key(default_agent_name) {
            return Err(RegistryError::DefaultAgentNotRegistered(default_agent_name.to_string()));
        }
        Ok(Self { agents: map, default_agent_name })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.get(name)
    }

    pub fn default_agent(&self) -> &Arc<dyn Agent> {
        self.agents
            .get(self.default_agent_name)
            .expect("construction guarantees the default agent is registered")
    }

    pub fn default_agent_name(&self) -> &'static str {
        self.default_agent_name
    }

    /// All agents except the default/fallback — the candidate set the router scores.
    pub fn routable_agents(&self) -> impl Iterator<Item = &Arc<dyn Agent>> {
        self.agents
            .iter()
            .filter(move |(name, _)| **name != self.default_agent_name)
            .map(|(_, agent)| agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Agent>> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn is_lower_snake_case(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
