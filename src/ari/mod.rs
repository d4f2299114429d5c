//! Asterisk REST Interface plumbing
//!
//! - `client`: REST calls against `/ari` (channels, bridges)
//! - `events`: the `/ari/events` WebSocket feed
//! - `messages`: JSON shapes shared by both

pub mod client;
pub mod events;
pub mod messages;

pub use client::{AriClient, AriResponse, Credentials, ExternalMediaParams};
pub use events::EventStream;
pub use messages::{AriEvent, Bridge, CallerId, Channel};
