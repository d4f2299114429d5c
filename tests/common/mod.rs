// Test doubles shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use ari_orchestrator::call::{CallSetup, SetupRequest};
use ari_orchestrator::error::OrchestratorError;
use ari_orchestrator::session::{CallWorker, WorkerFactory, WorkerStats};
use tokio_util::sync::CancellationToken;

/// Records every setup request; fails for channels listed in `fail_for`
#[derive(Default)]
pub struct RecordingSetup {
    pub requests: Mutex<Vec<SetupRequest>>,
    pub fail_for: Vec<String>,
}

impl RecordingSetup {
    pub fn failing_for(channel_id: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_for: vec![channel_id.to_string()],
        }
    }

    pub fn requests(&self) -> Vec<SetupRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CallSetup for RecordingSetup {
    async fn execute(&self, request: &SetupRequest) -> Result<(), OrchestratorError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_for.contains(&request.channel_id) {
            return Err(OrchestratorError::ControlServerRejected {
                method: "POST".to_string(),
                endpoint: format!("/channels/{}/answer", request.channel_id),
                status: 404,
                body: "Channel not found".to_string(),
            });
        }
        Ok(())
    }
}

/// Counts started and stopped workers
#[derive(Default)]
pub struct WorkerCounters {
    pub created: AtomicUsize,
    pub running: AtomicUsize,
    pub stopped: AtomicUsize,
}

impl WorkerCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Worker that idles until told to stop
pub struct IdleWorker {
    counters: Arc<WorkerCounters>,
    fail_bind: bool,
    /// Time spent winding down after the stop signal
    stop_delay: Duration,
}

impl IdleWorker {
    pub fn new(counters: Arc<WorkerCounters>) -> Self {
        Self {
            counters,
            fail_bind: false,
            stop_delay: Duration::ZERO,
        }
    }
}

#[async_trait::async_trait]
impl CallWorker for IdleWorker {
    async fn bind(&mut self) -> Result<()> {
        if self.fail_bind {
            anyhow::bail!("address already in use");
        }
        Ok(())
    }

    async fn run(&mut self, shutdown: CancellationToken) -> Result<WorkerStats> {
        self.counters.running.fetch_add(1, Ordering::SeqCst);
        shutdown.cancelled().await;
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        self.counters.running.fetch_sub(1, Ordering::SeqCst);
        self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(WorkerStats::default())
    }

    fn name(&self) -> &str {
        "idle"
    }
}

pub struct IdleWorkerFactory {
    pub counters: Arc<WorkerCounters>,
    pub fail_bind: bool,
    pub stop_delay: Duration,
}

impl IdleWorkerFactory {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(WorkerCounters::default()),
            fail_bind: false,
            stop_delay: Duration::ZERO,
        }
    }

    /// Workers that take `delay` to finish once stopped
    pub fn slow_stop(delay: Duration) -> Self {
        Self {
            stop_delay: delay,
            ..Self::new()
        }
    }

    pub fn failing_bind() -> Self {
        Self {
            counters: Arc::new(WorkerCounters::default()),
            fail_bind: true,
            stop_delay: Duration::ZERO,
        }
    }
}

impl WorkerFactory for IdleWorkerFactory {
    fn create(&self, _caller_id: &str, _port: u16) -> Box<dyn CallWorker> {
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        Box::new(IdleWorker {
            counters: Arc::clone(&self.counters),
            fail_bind: self.fail_bind,
            stop_delay: self.stop_delay,
        })
    }
}

pub fn stasis_start(channel_id: &str, name: &str, number: &str) -> String {
    serde_json::json!({
        "type": "StasisStart",
        "application": "callilexa",
        "timestamp": "2026-10-18T09:30:00.000+0000",
        "args": [],
        "channel": {
            "id": channel_id,
            "name": name,
            "state": "Ring",
            "caller": { "name": "", "number": number },
            "connected": { "name": "", "number": "" },
            "dialplan": { "context": "from-trunk", "exten": "100", "priority": 1 }
        }
    })
    .to_string()
}

pub fn stasis_end(channel_id: &str, name: &str) -> String {
    serde_json::json!({
        "type": "StasisEnd",
        "application": "callilexa",
        "timestamp": "2026-10-18T09:31:00.000+0000",
        "channel": {
            "id": channel_id,
            "name": name,
            "state": "Up",
            "caller": { "name": "", "number": "+15551234567" }
        }
    })
    .to_string()
}
