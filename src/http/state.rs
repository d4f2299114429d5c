use crate::call::CallSetupSequencer;
use crate::session::SessionRegistry;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs setup requests received on `/set_up_call`
    pub sequencer: Arc<CallSetupSequencer>,

    /// Live sessions of the local dispatcher (channel_id → session)
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(sequencer: Arc<CallSetupSequencer>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            sequencer,
            sessions,
        }
    }
}
