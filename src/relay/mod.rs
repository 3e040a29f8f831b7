//! Per-connection relay between a browser client and a speech session
//!
//! This module provides the forwarding protocol of the relay:
//! - `SttAdapter`: owns one speech session, its lifecycle state and the
//!   keep-alive timer
//! - `connection`: the WebSocket loop driving one client
//! - `messages`: the wire format sent back to the browser
//! - `stats`: per-connection counters logged at teardown

mod adapter;
mod connection;
mod messages;
mod stats;

pub use adapter::{SessionState, SttAdapter};
pub use connection::serve_connection;
pub use messages::{client_payload, TranscriptPayload};
pub use stats::ConnectionStats;
