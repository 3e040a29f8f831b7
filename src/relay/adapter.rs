use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::stt::{EventReceiver, EventSender, SessionEvent, SpeechSession};

/// Lifecycle state of an upstream speech session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the upstream connection to confirm
    Connecting,
    /// Accepting audio
    Open,
    /// Closed by either side; terminal
    Closed,
    /// Failed; terminal
    Errored,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Errored)
    }
}

/// Owns one speech session for the lifetime of a client connection.
///
/// Tracks the `Connecting → Open → {Closed, Errored}` lifecycle, runs the
/// keep-alive timer while the session is open, and hands upstream events
/// to the connection loop via [`SttAdapter::next_event`]. Never shared
/// between connections.
pub struct SttAdapter {
    session: Arc<dyn SpeechSession>,
    events: EventReceiver,
    /// Sender side of the same event channel; the keep-alive task uses it
    /// to report send failures as session errors
    event_tx: EventSender,
    state: SessionState,
    keepalive: Option<JoinHandle<()>>,
    keepalive_interval: Duration,
    finish_requested: bool,
}

impl SttAdapter {
    pub fn new(
        session: Arc<dyn SpeechSession>,
        events: EventReceiver,
        event_tx: EventSender,
        keepalive_interval: Duration,
    ) -> Self {
        Self {
            session,
            events,
            event_tx,
            state: SessionState::Connecting,
            keepalive: None,
            keepalive_interval,
            finish_requested: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Whether the keep-alive timer is currently running
    pub fn keepalive_active(&self) -> bool {
        self.keepalive.is_some()
    }

    /// Receive the next upstream event, updating lifecycle state first.
    ///
    /// Returns `None` once the event channel is exhausted.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.events.recv().await?;

        match event {
            SessionEvent::Opened => {
                if self.state == SessionState::Connecting {
                    self.state = SessionState::Open;
                    self.start_keepalive();
                }
            }
            SessionEvent::Error(_) => {
                self.stop_keepalive();
                if !self.state.is_terminal() {
                    self.state = SessionState::Errored;
                }
            }
            SessionEvent::Closed => {
                self.stop_keepalive();
                if !self.state.is_terminal() {
                    self.state = SessionState::Closed;
                }
            }
            SessionEvent::Transcript(_) => {}
        }

        Some(event)
    }

    /// Forward one audio frame upstream.
    ///
    /// Frames arriving while the session is not open are dropped, not
    /// queued. Returns whether the frame was forwarded.
    pub async fn forward_audio(&mut self, frame: Vec<u8>) -> bool {
        if self.state != SessionState::Open {
            debug!(
                "Dropping {}-byte frame while session is {:?}",
                frame.len(),
                self.state
            );
            return false;
        }

        match self.session.send_audio(frame).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to forward audio frame: {}", e);
                false
            }
        }
    }

    /// Request a graceful upstream finish, at most once per session.
    ///
    /// No-op unless the session is open: a session that never opened has
    /// nothing to flush, and a terminal one is already gone.
    pub async fn finish(&mut self) {
        if self.finish_requested || self.state != SessionState::Open {
            return;
        }
        self.finish_requested = true;

        if let Err(e) = self.session.finish().await {
            warn!("Failed to request graceful finish: {}", e);
        }
    }

    fn start_keepalive(&mut self) {
        if self.keepalive.is_some() {
            return;
        }

        let session = Arc::clone(&self.session);
        let events = self.event_tx.clone();
        let period = self.keepalive_interval;

        self.keepalive = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = session.keep_alive().await {
                    warn!("Keep-alive send failed: {}", e);
                    let _ = events
                        .send(SessionEvent::Error(format!("keep-alive failed: {}", e)))
                        .await;
                    break;
                }
            }
        }));
    }

    /// Stop the keep-alive timer. Safe to call repeatedly; only the first
    /// call after a start does anything.
    fn stop_keepalive(&mut self) {
        if let Some(handle) = self.keepalive.take() {
            handle.abort();
        }
    }
}

impl Drop for SttAdapter {
    fn drop(&mut self) {
        self.stop_keepalive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::session_channel;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::timeout;

    #[derive(Default)]
    struct MockSession {
        frames: Mutex<Vec<Vec<u8>>>,
        keepalives: AtomicUsize,
        finishes: AtomicUsize,
        fail_keepalive: bool,
    }

    #[async_trait::async_trait]
    impl SpeechSession for MockSession {
        async fn send_audio(&self, frame: Vec<u8>) -> Result<()> {
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }

        async fn keep_alive(&self) -> Result<()> {
            self.keepalives.fetch_add(1, Ordering::SeqCst);
            if self.fail_keepalive {
                anyhow::bail!("socket half-closed");
            }
            Ok(())
        }

        async fn finish(&self) -> Result<()> {
            self.finishes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn adapter_with(mock: Arc<MockSession>, interval: Duration) -> (SttAdapter, EventSender) {
        let (tx, rx) = session_channel();
        let adapter = SttAdapter::new(mock, rx, tx.clone(), interval);
        (adapter, tx)
    }

    async fn open_adapter(adapter: &mut SttAdapter, tx: &EventSender) {
        tx.send(SessionEvent::Opened).await.unwrap();
        assert_eq!(adapter.next_event().await, Some(SessionEvent::Opened));
        assert_eq!(adapter.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn test_starts_connecting_without_keepalive() {
        let mock = Arc::new(MockSession::default());
        let (adapter, _tx) = adapter_with(mock.clone(), Duration::from_secs(3));

        assert_eq!(adapter.state(), SessionState::Connecting);
        assert!(!adapter.keepalive_active());
        assert_eq!(mock.keepalives.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_frames_dropped_until_open() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, _tx) = adapter_with(mock.clone(), Duration::from_secs(3));

        assert!(!adapter.forward_audio(vec![1, 2, 3]).await);
        assert!(!adapter.forward_audio(vec![4, 5, 6]).await);
        assert!(mock.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_opens_on_confirmation_and_starts_keepalive() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, tx) = adapter_with(mock, Duration::from_secs(3));

        open_adapter(&mut adapter, &tx).await;
        assert!(adapter.keepalive_active());
    }

    #[tokio::test]
    async fn test_forwards_frames_in_order_when_open() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, tx) = adapter_with(mock.clone(), Duration::from_secs(3));
        open_adapter(&mut adapter, &tx).await;

        for frame in [vec![1u8], vec![2], vec![3]] {
            assert!(adapter.forward_audio(frame).await);
        }

        let frames = mock.frames.lock().unwrap();
        assert_eq!(*frames, vec![vec![1u8], vec![2], vec![3]]);
    }

    #[tokio::test]
    async fn test_keepalive_fires_while_open_and_stops_on_error() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, tx) = adapter_with(mock.clone(), Duration::from_millis(10));
        open_adapter(&mut adapter, &tx).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(mock.keepalives.load(Ordering::SeqCst) >= 2);

        tx.send(SessionEvent::Error("boom".to_string()))
            .await
            .unwrap();
        adapter.next_event().await.unwrap();
        assert_eq!(adapter.state(), SessionState::Errored);
        assert!(!adapter.keepalive_active());

        // No further keep-alives once the timer is cancelled
        tokio::time::sleep(Duration::from_millis(20)).await;
        let count = mock.keepalives.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(mock.keepalives.load(Ordering::SeqCst), count);
    }

    #[tokio::test]
    async fn test_error_then_close_cancels_once() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, tx) = adapter_with(mock, Duration::from_millis(10));
        open_adapter(&mut adapter, &tx).await;

        tx.send(SessionEvent::Error("boom".to_string()))
            .await
            .unwrap();
        adapter.next_event().await.unwrap();
        assert!(!adapter.keepalive_active());

        // A close right after the error must not panic or resurrect the
        // timer, and the terminal state is kept
        tx.send(SessionEvent::Closed).await.unwrap();
        adapter.next_event().await.unwrap();
        assert!(!adapter.keepalive_active());
        assert_eq!(adapter.state(), SessionState::Errored);
    }

    #[tokio::test]
    async fn test_finish_requested_once() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, tx) = adapter_with(mock.clone(), Duration::from_secs(3));
        open_adapter(&mut adapter, &tx).await;

        adapter.finish().await;
        adapter.finish().await;
        assert_eq!(mock.finishes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_finish_noop_unless_open() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, _tx) = adapter_with(mock.clone(), Duration::from_secs(3));

        adapter.finish().await;
        assert_eq!(mock.finishes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_frames_after_close_dropped() {
        let mock = Arc::new(MockSession::default());
        let (mut adapter, tx) = adapter_with(mock.clone(), Duration::from_secs(3));
        open_adapter(&mut adapter, &tx).await;

        assert!(adapter.forward_audio(vec![1]).await);

        tx.send(SessionEvent::Closed).await.unwrap();
        adapter.next_event().await.unwrap();
        assert_eq!(adapter.state(), SessionState::Closed);

        assert!(!adapter.forward_audio(vec![2]).await);
        assert_eq!(*mock.frames.lock().unwrap(), vec![vec![1u8]]);
    }

    #[tokio::test]
    async fn test_keepalive_failure_reported_as_error() {
        let mock = Arc::new(MockSession {
            fail_keepalive: true,
            ..MockSession::default()
        });
        let (mut adapter, tx) = adapter_with(mock, Duration::from_millis(10));
        open_adapter(&mut adapter, &tx).await;

        let event = timeout(Duration::from_secs(1), async {
            loop {
                match adapter.next_event().await {
                    Some(SessionEvent::Error(cause)) => break cause,
                    Some(_) => continue,
                    None => panic!("event channel closed"),
                }
            }
        })
        .await
        .expect("keep-alive failure was never reported");

        assert!(event.contains("keep-alive failed"));
        assert_eq!(adapter.state(), SessionState::Errored);
        assert!(!adapter.keepalive_active());
    }

    #[tokio::test]
    async fn test_drop_while_connecting_never_starts_keepalive() {
        let mock = Arc::new(MockSession::default());
        let (adapter, _tx) = adapter_with(mock.clone(), Duration::from_millis(10));

        drop(adapter);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(mock.keepalives.load(Ordering::SeqCst), 0);
    }
}
