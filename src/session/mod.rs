//! Conversation history per session.

mod file;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use file::FileSessionStore;

/// Storage for prior exchanges, keyed by session id.
pub trait SessionStore: Send + Sync {
    /// Start a new, empty session and return its id.
    fn create_session(&self) -> Result<String>;

    /// Serialized recent exchanges, or `None` when there are none.
    fn get_history(&self, session_id: &str) -> Result<Option<String>>;

    /// Record one exchange, creating the session if needed.
    fn append_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()>;

    fn clear(&self, session_id: &str) -> Result<()>;
}

/// One question and its answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
    pub at: DateTime<Utc>,
}

impl Exchange {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
            at: Utc::now(),
        }
    }
}

/// `User: ..\nAssistant: ..` lines, oldest first.
pub fn format_history(exchanges: &[Exchange]) -> Option<String> {
    if exchanges.is_empty() {
        return None;
    }
    let lines: Vec<String> = exchanges
        .iter()
        .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
        .collect();
    Some(lines.join("\n"))
}

fn push_bounded(exchanges: &mut Vec<Exchange>, exchange: Exchange, max_history: usize) {
    exchanges.push(exchange);
    if exchanges.len() > max_history {
        let excess = exchanges.len() - max_history;
        exchanges.drain(..excess);
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    sessions: HashMap<String, Vec<Exchange>>,
}

/// Process-local sessions with sequential ids (`session_1`, `session_2`, ...).
#[derive(Debug)]
pub struct InMemorySessionStore {
    state: Mutex<MemoryState>,
    max_history: usize,
}

impl InMemorySessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: Mutex::default(),
            max_history,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().sessions.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl SessionStore for InMemorySessionStore {
    fn create_session(&self) -> Result<String> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("session_{}", state.next_id);
        state.sessions.insert(id.clone(), Vec::new());
        Ok(id)
    }

    fn get_history(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self
            .lock()
            .sessions
            .get(session_id)
            .and_then(|exchanges| format_history(exchanges)))
    }

    fn append_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()> {
        let max_history = self.max_history;
        let mut state = self.lock();
        let exchanges = state.sessions.entry(session_id.to_string()).or_default();
        push_bounded(exchanges, Exchange::new(query, answer), max_history);
        Ok(())
    }

    fn clear(&self, session_id: &str) -> Result<()> {
        if let Some(exchanges) = self.lock().sessions.get_mut(session_id) {
            exchanges.clear();
        }
        Ok(())
    }
}
