//! Environment-variable-driven configuration.
//!
//! Resolution follows the same priority style as the sibling agent-sdk examples studied for this
//! crate: an explicit override always wins, falling back to the environment variable, falling
//! back to the documented default. Unlike a URL string, these values are validated at
//! construction time — an out-of-range value is a fatal startup error rather than a silent clamp.

use std::env;
use std::time::Duration;

/// Immutable, process-wide configuration for a [`crate::pipeline::RagPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Minimum primary agent score to avoid falling back to the default agent (`router.confidence_threshold`).
    pub confidence_threshold: f64,
    /// Maximum number of secondary agents considered for multi-domain synthesis (`router.secondary_topk`).
    pub secondary_topk: usize,
    /// Default `limit` for a retrieval call when the caller doesn't specify one (`retrieval.default_limit`).
    pub retrieval_default_limit: usize,
    /// Upper bound a caller-provided `limit` is clamped to (`retrieval.max_limit`).
    pub retrieval_max_limit: usize,
    /// Default minimum similarity score for a passage to be considered (`retrieval.score_floor`).
    pub retrieval_score_floor: f64,
    /// Number of prior messages retained per session (`history.window`).
    pub history_window: usize,
    /// Soft per-agent execution timeout (`agent.soft_timeout_s`).
    pub agent_soft_timeout: Duration,
    /// Hard per-agent execution timeout (`agent.hard_timeout_s`).
    pub agent_hard_timeout: Duration,
    /// Name of the agent registered as the default / fallback (`agent.default`).
    pub default_agent: String,
}

/// Error constructing a [`PipelineConfig`] from the environment.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be a {expected}, got {value:?}")]
    InvalidValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("retrieval.max_limit ({max}) must be >= retrieval.default_limit ({default})")]
    LimitOrdering { default: usize, max: usize },
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
            secondary_topk: 2,
            retrieval_default_limit: 5,
            retrieval_max_limit: 20,
            retrieval_score_floor: 0.0,
            history_window: 10,
            agent_soft_timeout: Duration::from_secs(20),
            agent_hard_timeout: Duration::from_secs(30),
            default_agent: "book".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Build a configuration from environment variables, falling back to [`PipelineConfig::default`]
    /// for anything unset. Fails fast on a value that parses but violates a documented bound.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let confidence_threshold = parse_env_or(
            "ROUTER_CONFIDENCE_THRESHOLD",
            defaults.confidence_threshold,
            "number in [0,1]",
        )?;
        let secondary_topk = parse_env_or(
            "ROUTER_SECONDARY_TOPK",
            defaults.secondary_topk,
            "non-negative integer",
        )?;
        let retrieval_default_limit = parse_env_or(
            "RETRIEVAL_DEFAULT_LIMIT",
            defaults.retrieval_default_limit,
            "integer in 1..=20",
        )?;
        let retrieval_max_limit = parse_env_or(
            "RETRIEVAL_MAX_LIMIT",
            defaults.retrieval_max_limit,
            "integer in 1..=20",
        )?;
        let retrieval_score_floor = parse_env_or(
            "RETRIEVAL_SCORE_FLOOR",
            defaults.retrieval_score_floor,
            "number in [0,1]",
        )?;
        let history_window = parse_env_or("HISTORY_WINDOW", defaults.history_window, "positive integer")?;
        let agent_soft_timeout = Duration::from_secs(parse_env_or(
            "AGENT_SOFT_TIMEOUT_S",
            defaults.agent_soft_timeout.as_secs(),
            "positive integer",
        )?);
        let agent_hard_timeout = Duration::from_secs(parse_env_or(
            "AGENT_HARD_TIMEOUT_S",
            defaults.agent_hard_timeout.as_secs(),
            "positive integer",
        )?);
        let default_agent =
            env::var("AGENT_DEFAULT").unwrap_or(defaults.default_agent);

        if retrieval_max_limit < retrieval_default_limit {
            return Err(ConfigError::LimitOrdering {
                default: retrieval_default_limit,
                max: retrieval_max_limit,
            });
        }

        Ok(Self {
            confidence_threshold,
            secondary_topk,
            retrieval_default_limit,
            retrieval_max_limit,
            retrieval_score_floor,
            history_window,
            agent_soft_timeout,
            agent_hard_timeout,
            default_agent,
        })
    }
}

fn parse_env_or<T>(var: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            var,
            expected,
            value: raw,
        }),
    }
}
