//! Per-session conversation state.
//!
//! In-memory only: sessions are created lazily on first use and live until
//! process restart. Each session keeps a bounded FIFO of query/answer
//! exchanges; mutations on one session are serialized by its own lock while
//! different sessions stay independent.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
}

pub struct SessionStore {
    max_exchanges: usize,
    sessions: RwLock<HashMap<String, Arc<Mutex<VecDeque<Exchange>>>>>,
}

impl SessionStore {
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            max_exchanges,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn create_session(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Record the newest exchange, evicting the oldest beyond capacity.
    pub fn add_exchange(&self, session_id: &str, query: &str, answer: &str) {
        let log = {
            let mut sessions = self.sessions.write().unwrap();
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
                .clone()
        };

        let mut log = log.lock().unwrap();
        log.push_back(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
        });
        while log.len() > self.max_exchanges {
            log.pop_front();
        }
    }

    /// Formatted transcript of the retained exchanges, oldest first, or
    /// `None` for an unseen session id.
    pub fn get_history(&self, session_id: &str) -> Option<String> {
        let log = {
            let sessions = self.sessions.read().unwrap();
            sessions.get(session_id)?.clone()
        };

        let log = log.lock().unwrap();
        if log.is_empty() {
            return None;
        }

        Some(
            log.iter()
                .map(|exchange| {
                    format!("User: {}\nAssistant: {}", exchange.query, exchange.answer)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    #[cfg(test)]
    fn exchange_count(&self, session_id: &str) -> usize {
        let sessions = self.sessions.read().unwrap();
        sessions
            .get(session_id)
            .map(|log| log.lock().unwrap().len())
            .unwrap_or(0)
    }
}
