//! Per-call resources and the ARI call setup sequence

pub mod notifier;
pub mod ports;
pub mod setup;

pub use notifier::SetupNotifier;
pub use ports::PortAllocator;
pub use setup::{BridgeTopology, CallSetup, CallSetupSequencer, SetupRequest};
