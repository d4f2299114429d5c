use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::registry::{SessionEntry, SessionRegistry};
use super::worker::{WorkerFactory, WorkerPool};
use crate::ari::AriEvent;
use crate::call::{CallSetup, PortAllocator, SetupRequest};
use crate::config::DispatchConfig;
use crate::error::{OrchestratorError, Result};

/// What an ARI event means for session management
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    Start {
        channel_id: String,
        caller_id: String,
    },
    End {
        channel_id: String,
    },
    Ignored,
}

/// Map an event to a session action.
///
/// Only channels whose name contains `channel_filter` are managed; this keeps
/// the media-fork channels created during setup from being treated as calls.
pub fn classify(event: &AriEvent, channel_filter: &str) -> CallEvent {
    let Some(channel) = event.channel.as_ref() else {
        return CallEvent::Ignored;
    };

    if !channel.name.contains(channel_filter) {
        return CallEvent::Ignored;
    }

    match event.kind.as_str() {
        "StasisStart" => CallEvent::Start {
            channel_id: channel.id.clone(),
            caller_id: channel.caller.number.clone(),
        },
        "StasisEnd" => CallEvent::End {
            channel_id: channel.id.clone(),
        },
        _ => CallEvent::Ignored,
    }
}

/// Consumes ARI events in order and drives session setup and teardown
pub struct Dispatcher {
    channel_filter: String,
    ports: Arc<PortAllocator>,
    setup: Arc<dyn CallSetup>,
    workers: Arc<dyn WorkerFactory>,
    pool: WorkerPool,
    registry: Arc<SessionRegistry>,
    stop_timeout: Duration,
    /// In-flight worker stops, keyed by channel id
    teardowns: HashMap<String, JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(
        config: &DispatchConfig,
        ports: Arc<PortAllocator>,
        setup: Arc<dyn CallSetup>,
        workers: Arc<dyn WorkerFactory>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            channel_filter: config.channel_filter.clone(),
            ports,
            setup,
            workers,
            pool: WorkerPool::new(config.worker_pool_size),
            registry,
            stop_timeout: config.stop_timeout(),
            teardowns: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Process events until the stream ends (`Ok`) or fails (`Err`).
    ///
    /// A single call's failure is logged and never ends the loop.
    pub async fn run<S>(&mut self, events: S) -> Result<()>
    where
        S: Stream<Item = Result<String>>,
    {
        tokio::pin!(events);
        info!(
            "Dispatch loop started (channel filter {:?}, {} worker slots)",
            self.channel_filter,
            self.pool.size()
        );

        while let Some(frame) = events.next().await {
            match frame {
                Ok(raw) => self.handle_message(&raw).await,
                Err(e) => {
                    error!("Event stream failed: {}", e);
                    self.settle().await;
                    return Err(e);
                }
            }
        }

        info!(
            "Event stream ended with {} live sessions",
            self.registry.len().await
        );
        self.settle().await;
        Ok(())
    }

    /// Parse and dispatch one raw event payload
    pub async fn handle_message(&mut self, raw: &str) {
        match serde_json::from_str::<AriEvent>(raw) {
            Ok(event) => self.handle_event(&event).await,
            Err(e) => warn!("Skipping unparseable event ({}): {}", e, raw),
        }
    }

    pub async fn handle_event(&mut self, event: &AriEvent) {
        self.teardowns.retain(|_, task| !task.is_finished());

        match classify(event, &self.channel_filter) {
            CallEvent::Start {
                channel_id,
                caller_id,
            } => {
                info!("Received {} for channel {}", event.kind, channel_id);
                self.on_start(channel_id, caller_id).await;
            }
            CallEvent::End { channel_id } => {
                info!("Received {} for channel {}", event.kind, channel_id);
                self.on_end(channel_id).await;
            }
            CallEvent::Ignored => debug!("Ignoring {} event", event.kind),
        }
    }

    async fn on_start(&mut self, channel_id: String, caller_id: String) {
        self.await_teardown(&channel_id).await;

        if self.registry.contains(&channel_id).await {
            let anomaly = OrchestratorError::ProtocolAnomaly {
                channel_id,
                reason: "duplicate StasisStart for a live session".to_string(),
            };
            warn!("{}", anomaly);
            return;
        }

        let port = self.ports.next_port();
        if let Some(holder) = self.registry.port_holder(port).await {
            warn!(
                "Port {} handed to channel {} is still held by channel {}",
                port, channel_id, holder
            );
        }

        let request = SetupRequest {
            caller_id: caller_id.clone(),
            channel_id: channel_id.clone(),
            port,
        };
        if let Err(e) = self.setup.execute(&request).await {
            error!("Call setup for channel {} failed: {}", channel_id, e);
            return;
        }

        let mut worker = self.workers.create(&caller_id, port);
        if let Err(e) = worker.bind().await {
            let err = OrchestratorError::WorkerStart {
                port,
                reason: format!("{:#}", e),
            };
            error!("Channel {} not registered: {}", channel_id, err);
            return;
        }

        let handle = self.pool.submit(format!("{}@{}", channel_id, port), worker);
        let entry = SessionEntry::new(caller_id.clone(), port, handle);

        match self.registry.register(&channel_id, entry).await {
            Ok(()) => info!(
                "Session registered for channel {} (caller {}, port {})",
                channel_id, caller_id, port
            ),
            Err(duplicate) => {
                warn!("{}", duplicate.error());
                if let Err(e) = duplicate.entry.worker.stop(self.stop_timeout).await {
                    error!("Failed to stop rejected worker: {}", e);
                }
            }
        }
    }

    async fn on_end(&mut self, channel_id: String) {
        self.await_teardown(&channel_id).await;

        let entry = match self.registry.unregister(&channel_id).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };

        let timeout = self.stop_timeout;
        let id = channel_id.clone();
        let task = tokio::spawn(async move {
            match entry.worker.stop(timeout).await {
                Ok(stats) => info!(
                    "Session for channel {} ended ({} packets, {:.1}s)",
                    id, stats.packets_received, stats.duration_secs
                ),
                Err(e) => error!("Teardown of channel {} failed: {}", id, e),
            }
        });
        self.teardowns.insert(channel_id, task);
    }

    async fn await_teardown(&mut self, channel_id: &str) {
        if let Some(task) = self.teardowns.remove(channel_id) {
            if let Err(e) = task.await {
                error!("Teardown task for channel {} panicked: {}", channel_id, e);
            }
        }
    }

    /// Wait for every pending worker stop to complete
    pub async fn settle(&mut self) {
        for (channel_id, task) in self.teardowns.drain() {
            if let Err(e) = task.await {
                error!("Teardown task for channel {} panicked: {}", channel_id, e);
            }
        }
    }

    /// Settle pending teardowns and stop every still-registered worker
    pub async fn shutdown(&mut self) {
        self.settle().await;

        let remaining = self.registry.drain().await;
        if !remaining.is_empty() {
            info!("Stopping {} remaining sessions", remaining.len());
        }

        for (channel_id, entry) in remaining {
            info!("Stopping worker {}", entry.worker.label());
            if let Err(e) = entry.worker.stop(self.stop_timeout).await {
                error!("Failed to stop worker for channel {}: {}", channel_id, e);
            }
        }
    }
}
