use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::stats::WorkerStats;
use crate::error::OrchestratorError;

/// Per-call worker driven by the dispatcher
///
/// Implementations:
/// - `MediaListener`: binds the forked-media UDP port and drains it
/// - test doubles in `tests/`
#[async_trait::async_trait]
pub trait CallWorker: Send {
    /// Acquire the worker's listener
    ///
    /// Runs on the dispatch path; a failure here keeps the call unregistered.
    async fn bind(&mut self) -> Result<()>;

    /// Run until `shutdown` is cancelled
    async fn run(&mut self, shutdown: CancellationToken) -> Result<WorkerStats>;

    /// Worker name for logging
    fn name(&self) -> &str;
}

/// Builds a worker for a newly bridged call
pub trait WorkerFactory: Send + Sync {
    fn create(&self, caller_id: &str, port: u16) -> Box<dyn CallWorker>;
}

/// Fixed-size pool: at most `size` workers run at once, the rest wait for a slot
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently taken by a running worker
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Queue `worker` for execution and return its stop handle
    pub fn submit(
        &self,
        label: impl Into<String>,
        mut worker: Box<dyn CallWorker>,
    ) -> WorkerHandle {
        let label = label.into();
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        let permits = Arc::clone(&self.permits);
        let task_label = label.clone();

        let join = tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                permit = permits.acquire_owned() => permit.context("worker pool closed")?,
                _ = token.cancelled() => {
                    debug!("Worker {} stopped while queued", task_label);
                    return Ok(WorkerStats::default());
                }
            };

            info!("Worker {} ({}) running", task_label, worker.name());
            let started = Instant::now();
            let mut stats = worker.run(token).await?;
            stats.duration_secs = started.elapsed().as_secs_f64();
            info!("Worker {} finished", task_label);

            Ok::<WorkerStats, anyhow::Error>(stats)
        });

        WorkerHandle {
            label,
            cancel,
            join,
        }
    }
}

/// Running (or queued) worker plus its stop signal
pub struct WorkerHandle {
    label: String,
    cancel: CancellationToken,
    join: JoinHandle<Result<WorkerStats>>,
}

impl WorkerHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal the worker and wait up to `timeout` for it to finish.
    ///
    /// A worker that overruns the timeout is aborted.
    pub async fn stop(self, timeout: Duration) -> Result<WorkerStats, OrchestratorError> {
        let WorkerHandle {
            label,
            cancel,
            mut join,
        } = self;

        cancel.cancel();

        match tokio::time::timeout(timeout, &mut join).await {
            Ok(Ok(Ok(stats))) => Ok(stats),
            Ok(Ok(Err(e))) => Err(OrchestratorError::WorkerFailed {
                label,
                reason: format!("{:#}", e),
            }),
            Ok(Err(e)) => Err(OrchestratorError::WorkerFailed {
                label,
                reason: format!("task panicked: {}", e),
            }),
            Err(_) => {
                error!("Worker {} ignored stop for {:?}, aborting", label, timeout);
                join.abort();
                Err(OrchestratorError::WorkerStopTimeout { label, timeout })
            }
        }
    }
}

/// Default worker: receives the forked call audio on a UDP port
pub struct MediaListener {
    name: String,
    caller_id: String,
    addr: String,
    socket: Option<UdpSocket>,
}

impl MediaListener {
    pub fn new(caller_id: &str, listen_host: &str, port: u16) -> Self {
        Self {
            name: format!("media-listener-{}", port),
            caller_id: caller_id.to_string(),
            addr: format!("{}:{}", listen_host, port),
            socket: None,
        }
    }
}

#[async_trait::async_trait]
impl CallWorker for MediaListener {
    async fn bind(&mut self) -> Result<()> {
        let socket = UdpSocket::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind media listener on {}", self.addr))?;

        info!("Listening for packets on {} (caller {})", self.addr, self.caller_id);
        self.socket = Some(socket);
        Ok(())
    }

    async fn run(&mut self, shutdown: CancellationToken) -> Result<WorkerStats> {
        let socket = self
            .socket
            .take()
            .context("media listener was not bound")?;

        let mut stats = WorkerStats::default();
        let mut buf = vec![0u8; 2048];

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, _from)) => {
                            stats.packets_received += 1;
                            stats.bytes_received += len as u64;
                        }
                        Err(e) => {
                            warn!("Receive on {} failed: {}", self.addr, e);
                            return Err(e).context("media listener receive failed");
                        }
                    }
                }
            }
        }

        info!(
            "Media listener {} stopped after {} packets ({} bytes)",
            self.addr, stats.packets_received, stats.bytes_received
        );

        Ok(stats)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Creates a `MediaListener` per call on `listen_host`
pub struct MediaListenerFactory {
    listen_host: String,
}

impl MediaListenerFactory {
    pub fn new(listen_host: impl Into<String>) -> Self {
        Self {
            listen_host: listen_host.into(),
        }
    }
}

impl WorkerFactory for MediaListenerFactory {
    fn create(&self, caller_id: &str, port: u16) -> Box<dyn CallWorker> {
        Box::new(MediaListener::new(caller_id, &self.listen_host, port))
    }
}
