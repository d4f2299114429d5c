use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Steps of the call setup sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Answer,
    ForkMedia,
    CreateBridge,
    AddChannel,
    FetchBridge,
}

impl SetupStep {
    /// 1-based position of the step in the sequence
    pub fn number(self) -> u8 {
        match self {
            SetupStep::Answer => 1,
            SetupStep::ForkMedia => 2,
            SetupStep::CreateBridge => 3,
            SetupStep::AddChannel => 4,
            SetupStep::FetchBridge => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SetupStep::Answer => "answer",
            SetupStep::ForkMedia => "fork-media",
            SetupStep::CreateBridge => "create-bridge",
            SetupStep::AddChannel => "add-channel",
            SetupStep::FetchBridge => "fetch-bridge",
        }
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("control server unreachable: {method} {endpoint}: {source}")]
    ControlServerUnreachable {
        method: String,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("control server rejected {method} {endpoint} with status {status}: {body}")]
    ControlServerRejected {
        method: String,
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("protocol anomaly on channel {channel_id}: {reason}")]
    ProtocolAnomaly { channel_id: String, reason: String },

    #[error("call setup aborted at step {step}: {source}")]
    SetupSequenceAborted {
        step: SetupStep,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("worker for port {port} failed to start: {reason}")]
    WorkerStart { port: u16, reason: String },

    #[error("worker {label} failed: {reason}")]
    WorkerFailed { label: String, reason: String },

    #[error("worker {label} did not stop within {timeout:?}")]
    WorkerStopTimeout { label: String, timeout: Duration },

    #[error("event stream failure: {0}")]
    EventStream(String),

    #[error("invalid media port range [{min}, {max}]")]
    InvalidPortRange { min: u16, max: u16 },
}

impl OrchestratorError {
    /// The failed setup step, if this error aborted a setup sequence
    pub fn setup_step(&self) -> Option<SetupStep> {
        match self {
            OrchestratorError::SetupSequenceAborted { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
