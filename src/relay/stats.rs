use chrono::{DateTime, Utc};

/// Counters for one client connection, logged when it tears down
#[derive(Debug, Clone)]
pub struct ConnectionStats {
    /// When the client connected
    pub started_at: DateTime<Utc>,

    /// Audio frames forwarded to the speech session
    pub frames_forwarded: u64,

    /// Audio frames dropped (session not open, oversized, or late)
    pub frames_dropped: u64,

    /// Transcript messages delivered to the client
    pub transcripts_delivered: u64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            frames_forwarded: 0,
            frames_dropped: 0,
            transcripts_delivered: 0,
        }
    }

    /// Seconds since the client connected
    pub fn duration_secs(&self) -> f64 {
        let duration = Utc::now().signed_duration_since(self.started_at);
        duration.num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self::new()
    }
}
