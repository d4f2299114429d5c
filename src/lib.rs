pub mod ari;
pub mod call;
pub mod config;
pub mod error;
pub mod http;
pub mod session;

pub use ari::{AriClient, AriEvent, EventStream};
pub use call::{
    BridgeTopology, CallSetup, CallSetupSequencer, PortAllocator, SetupNotifier, SetupRequest,
};
pub use config::Config;
pub use error::{OrchestratorError, SetupStep};
pub use http::{create_router, AppState};
pub use session::{
    CallWorker, Dispatcher, MediaListenerFactory, SessionRegistry, WorkerFactory, WorkerPool,
};
