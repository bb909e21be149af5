//! Query-handling core for a Retrieval-Augmented Generation question-answering service over a
//! technical book.
//!
//! # Core concepts
//!
//! - [`agent`] — the five domain-specialized agents and the shared [`agent::Agent`] contract.
//! - [`router`] — scores agents against a query and decides single- vs. multi-agent execution.
//! - [`retrieval`] — domain-filtered nearest-neighbor search with a single-flight guarantee.
//! - [`citation`] — turns ranked passages into a stable, numbered citation list.
//! - [`session`] — a rolling window of recent user/assistant turns, keyed by session id.
//! - [`pipeline`] — [`pipeline::RagPipeline`], the single entry point binding the above together.
//!
//! The HTTP surface, document ingestion, the embedding service, the vector store, and the LLM
//! provider itself are external collaborators. This crate defines narrow traits for each
//! ([`retrieval::EmbeddingClient`], [`retrieval::VectorStoreClient`], [`llm::LlmClient`],
//! [`session::SessionStore`]) and ships only an in-memory [`session::InMemorySessionStore`] for
//! single-process deployments; production adapters live outside this crate.

pub mod agent;
pub mod chunk;
pub mod citation;
pub mod config;
pub mod dto;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod registry;
pub mod retrieval;
pub mod router;
pub mod session;

pub use chunk::{Chunk, Domain, RetrievedPassage};
pub use citation::Citation;
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::RagPipeline;
pub use registry::AgentRegistry;
pub use router::{QueryRouter, RouteResult};
