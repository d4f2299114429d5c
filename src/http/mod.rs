//! HTTP surface for call setup requests
//!
//! - POST /set_up_call - Answer, fork and bridge a channel
//! - GET /sessions - List live call sessions
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, SetUpCallResponse};
pub use routes::create_router;
pub use state::AppState;
