//! Query Router: scores every registered agent, picks a primary and zero or more
//! secondaries, and decides whether the query is multi-domain.

use crate::agent::Agent;
use crate::registry::AgentRegistry;

/// Fixed tie-break order for equal top scores: deterministic and reproducible.
const PRIORITY_ORDER: &[&str] = &["glossary", "hardware", "module_info", "capstone"];

/// The router's decision for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub primary_agent: String,
    pub secondary_agents: Vec<String>,
    pub confidence: f64,
    pub routing_reason: String,
    pub is_multi_domain: bool,
}

/// Stateless; holds only the configuration the algorithm needs.
pub struct QueryRouter {
    confidence_threshold: f64,
    secondary_topk: usize,
}

impl QueryRouter {
    pub fn new(confidence_threshold: f64, secondary_topk: usize) -> Self {
        Self { confidence_threshold, secondary_topk }
    }

    /// Pure, deterministic, side-effect-free; also exposed directly as the
    /// route-preview operation.
    pub fn route(&self, query: &str, registry: &AgentRegistry) -> RouteResult {
        let mut scored: Vec<(&str, f64)> = registry
            .routable_agents()
            .map(|agent| (agent.name(), agent.can_handle(query)))
            .collect();

        sort_by_score_then_priority(&mut scored);

        let top = scored.first().copied();
        let default_name = registry.default_agent_name();

        let p = top.map(|(_, s)| s).unwrap_or(0.0);
        if top.is_none() || p < self.confidence_threshold {
            let result = RouteResult {
                primary_agent: default_name.to_string(),
                secondary_agents: Vec::new(),
                confidence: p,
                routing_reason: "no-match".to_string(),
                is_multi_domain: false,
            };
            tracing::debug!(
                confidence = result.confidence,
                primary = %result.primary_agent,
                reason = %result.routing_reason,
                "routed query"
            );
            return result;
        }

        let (primary_name, _) = top.unwrap();

        // "within the top three scores": the primary already occupies one of
        // those three slots, leaving the next two ranks as secondary candidates.
        let secondaries: Vec<String> = scored
            .iter()
            .skip(1)
            .take(2)
            .filter(|(_, score)| *score >= self.confidence_threshold)
            .take(self.secondary_topk)
            .map(|(name, _)| name.to_string())
            .collect();

        let is_multi_domain = !secondaries.is_empty();
        let result = RouteResult {
            primary_agent: primary_name.to_string(),
            secondary_agents: secondaries,
            confidence: p,
            routing_reason: if is_multi_domain { "multi-domain-match".to_string() } else { "single-match".to_string() },
            is_multi_domain,
        };
        tracing::debug!(
            confidence = result.confidence,
            primary = %result.primary_agent,
            secondaries = ?result.secondary_agents,
            reason = %result.routing_reason,
            "routed query"
        );
        result
    }

    /// Scopes a sub-query for a secondary agent's invocation in multi-agent synthesis.
    /// See [`derive_sub_query`].
    pub fn derive_sub_query(&self, query: &str, secondary: &dyn Agent) -> String {
        derive_sub_query(query, secondary)
    }
}

/// Restricts `query` to whitespace-separated tokens that appear in one of `secondary`'s
/// keywords, falling back to the full query when no token matches. Free function (rather than a
/// `QueryRouter` method) since it needs no router configuration, just the secondary's keyword set.
pub fn derive_sub_query(query: &str, secondary: &dyn Agent) -> String {
    let keyword_words: Vec<String> = secondary
        .keywords()
        .iter()
        .flat_map(|kw| kw.to_lowercase().split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect();

    let matched: Vec<&str> = query
        .split_whitespace()
        .filter(|token| {
            let token_lower = token.to_lowercase();
            keyword_words.iter().any(|kw| token_lower.contains(kw.as_str()) || kw.contains(&token_lower))
        })
        .collect();

    if matched.is_empty() {
        query.to_string()
    } else {
        matched.join(" ")
    }
}

/// Sorts descending by score; equal scores break ties by [`PRIORITY_ORDER`], then by name for any
/// agent outside that list (stable ordering, never a panic on an unrecognized name).
fn sort_by_score_then_priority(scored: &mut [(&str, f64)]) {
    scored.sort_by(|(name_a, score_a), (name_b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| priority_rank(name_a).cmp(&priority_rank(name_b)))
            .then_with(|| name_a.cmp(name_b))
    });
}

fn priority_rank(name: &str) -> usize {
    PRIORITY_ORDER.iter().position(|n| *n == name).unwrap_or(PRIORITY_ORDER.len())
}
