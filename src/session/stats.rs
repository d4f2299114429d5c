use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of one live call session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub channel_id: String,

    /// Caller number carried from the StasisStart event
    pub caller_id: String,

    /// Media port the call's worker listens on
    pub port: u16,

    pub registered_at: DateTime<Utc>,

    /// Whether the worker task is still executing
    pub worker_running: bool,
}

/// What a worker observed on its media listener
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerStats {
    pub packets_received: u64,
    pub bytes_received: u64,

    /// Time between the worker starting to run and stopping
    pub duration_secs: f64,
}
