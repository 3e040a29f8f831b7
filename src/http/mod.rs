//! HTTP surface of the relay server
//!
//! - GET /ws/transcribe - WebSocket endpoint bridging browser audio to the
//!   speech service
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
