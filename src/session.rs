//! Session Context Skill: a rolling window of the last 10 messages per session.
//!
//! Generalizes `cli_chatbot.rs`'s turn bookkeeping (a `Vec<Message>` built up across
//! a single REPL loop) into a keyed, concurrency-safe store that the pipeline injects into every
//! request.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// The literal session id treated as ephemeral: never persisted, always an empty history.
pub const ANONYMOUS_SESSION: &str = "anonymous";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One turn in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub agent_name: Option<String>,
}

impl SessionMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            agent_name: None,
        }
    }

    pub fn assistant(content: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            agent_name: Some(agent_name.into()),
        }
    }
}

/// Non-fatal: a session write failure is logged and never surfaces to the
/// caller, but the store still needs a typed error for the log line.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Key/value semantics over `session_id`. Implementations must serialize concurrent
/// writes to the same session id and guarantee that a read observes every write accepted before
/// it at the call site.
pub trait SessionStore: Send + Sync {
    fn get_history<'a>(&'a self, session_id: &'a str, limit: usize) -> BoxFuture<'a, Vec<SessionMessage>>;

    fn save_message<'a>(
        &'a self,
        session_id: &'a str,
        message: SessionMessage,
    ) -> BoxFuture<'a, Result<(), SessionError>>;
}

/// Default in-process [`SessionStore`]. A single mutex over the whole map is sufficient to
/// satisfy the serialization and read-your-writes guarantees without a per-key lock
/// table; sessions are created lazily on first write and trimmed to `window` at write time.
pub struct InMemorySessionStore {
    window: usize,
    sessions: Mutex<HashMap<String, Vec<SessionMessage>>>,
}

impl InMemorySessionStore {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_history<'a>(&'a self, session_id: &'a str, limit: usize) -> BoxFuture<'a, Vec<SessionMessage>> {
        Box::pin(async move {
            if session_id == ANONYMOUS_SESSION {
                return Vec::new();
            }
            let sessions = self.sessions.lock().await;
            match sessions.get(session_id) {
                Some(history) => {
                    let take = limit.min(history.len());
                    history[history.len() - take..].to_vec()
                }
                None => Vec::new(),
            }
        })
    }

    fn save_message<'a>(
        &'a self,
        session_id: &'a str,
        message: SessionMessage,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            if session_id == ANONYMOUS_SESSION {
                return Ok(());
            }
            let mut sessions = self.sessions.lock().await;
            let window = self.window;
            let history = sessions.entry(session_id.to_string()).or_default();
            history.push(message);
            if history.len() > window {
                let overflow = history.len() - window;
                history.drain(0..overflow);
            }
            Ok(())
        })
    }
}

/// Saves `message`, logging (rather than surfacing) a failure — session writes are best-effort
/// and never block or fail the caller's response.
pub async fn save_best_effort(store: &Arc<dyn SessionStore>, session_id: &str, message: SessionMessage) {
    if let Err(err) = store.save_message(session_id, message).await {
        tracing::warn!(session_id, %err, "session write failed; continuing without persisting this turn");
    }
}
