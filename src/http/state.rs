use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::Config;

/// Shared application state for HTTP handlers
///
/// The configuration is read-only after startup; the connection counter is
/// the only process-wide mutable value. All per-connection state lives in
/// the connection tasks themselves.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub active_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }
}
