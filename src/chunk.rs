//! Chunk and retrieval result types.

use serde::{Deserialize, Serialize};

/// Closed set of domain tags a chunk may carry, mirroring the course's module structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Glossary,
    Hardware,
    ModuleInfo,
    Capstone,
    General,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Glossary => "glossary",
            Domain::Hardware => "hardware",
            Domain::ModuleInfo => "module_info",
            Domain::Capstone => "capstone",
            Domain::General => "general",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A segment of book content as produced by external ingestion. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    pub source: String,
    pub title: String,
    pub section: Option<String>,
    pub domain: Option<Domain>,
}

/// A [`Chunk`] ranked by a single retrieval call. Lives only for the duration of one agent
/// invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub chunk: Chunk,
    /// Cosine similarity in `[0, 1]`.
    pub score: f64,
    /// 0-based rank within this retrieval call's result set.
    pub rank: usize,
}

/// Verifies the invariant that passage scores are monotonically non-increasing by rank.
/// Exposed for tests exercising stub `VectorStoreClient` implementations.
pub fn is_score_non_increasing(passages: &[RetrievedPassage]) -> bool {
    passages.windows(2).all(|w| w[0].score >= w[1].score)
}
