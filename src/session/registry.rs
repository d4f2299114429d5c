use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::stats::SessionSummary;
use super::worker::WorkerHandle;
use crate::error::{OrchestratorError, Result};

/// A live call: its worker and the resources it was given
pub struct SessionEntry {
    pub caller_id: String,
    pub port: u16,
    pub worker: WorkerHandle,
    pub registered_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(caller_id: impl Into<String>, port: u16, worker: WorkerHandle) -> Self {
        Self {
            caller_id: caller_id.into(),
            port,
            worker,
            registered_at: Utc::now(),
        }
    }

    fn summary(&self, channel_id: &str) -> SessionSummary {
        SessionSummary {
            channel_id: channel_id.to_string(),
            caller_id: self.caller_id.clone(),
            port: self.port,
            registered_at: self.registered_at,
            worker_running: !self.worker.is_finished(),
        }
    }
}

/// Registration refused because the channel already has a live session.
///
/// Carries the rejected entry back so its worker can be stopped.
pub struct DuplicateSession {
    pub channel_id: String,
    pub entry: SessionEntry,
}

impl DuplicateSession {
    pub fn error(&self) -> OrchestratorError {
        OrchestratorError::ProtocolAnomaly {
            channel_id: self.channel_id.clone(),
            reason: "start event for a channel that already has a live session".to_string(),
        }
    }
}

/// Live sessions keyed by channel id (at most one per channel)
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session; an existing entry for `channel_id` is never replaced
    pub async fn register(
        &self,
        channel_id: &str,
        entry: SessionEntry,
    ) -> std::result::Result<(), DuplicateSession> {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(channel_id.to_string()) {
            Entry::Occupied(_) => Err(DuplicateSession {
                channel_id: channel_id.to_string(),
                entry,
            }),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Remove and return the session for `channel_id`
    pub async fn unregister(&self, channel_id: &str) -> Result<SessionEntry> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(channel_id)
            .ok_or_else(|| OrchestratorError::ProtocolAnomaly {
                channel_id: channel_id.to_string(),
                reason: "end event for a channel with no live session".to_string(),
            })
    }

    pub async fn contains(&self, channel_id: &str) -> bool {
        self.sessions.read().await.contains_key(channel_id)
    }

    /// Channel currently holding `port`, if any
    pub async fn port_holder(&self, port: u16) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .find(|(_, entry)| entry.port == port)
            .map(|(id, _)| id.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, entry)| entry.summary(id))
            .collect();
        summaries.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        summaries
    }

    /// Remove every session (used on shutdown)
    pub async fn drain(&self) -> Vec<(String, SessionEntry)> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().collect()
    }
}
