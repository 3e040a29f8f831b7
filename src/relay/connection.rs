use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::adapter::SttAdapter;
use super::messages::client_payload;
use super::stats::ConnectionStats;
use crate::config::Config;
use crate::stt::{session_channel, DeepgramSession, SessionEvent};

/// Per-client connection record, owned and mutated exclusively by the
/// connection loop
struct ClientConnection {
    id: Uuid,

    /// Set on the first client close or socket error; audio seen
    /// afterwards is dropped rather than forwarded
    disconnected: bool,

    stats: ConnectionStats,
}

impl ClientConnection {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            disconnected: false,
            stats: ConnectionStats::new(),
        }
    }
}

/// Drive one client WebSocket until either side goes away.
///
/// Opens a dedicated speech session for the connection, forwards binary
/// audio frames upstream and transcript events back, and tears the session
/// down when the client disconnects. A failure to open the speech session
/// is fatal for this connection only: the socket is closed and no retry is
/// attempted.
pub async fn serve_connection(mut socket: WebSocket, config: Arc<Config>) {
    let mut conn = ClientConnection::new();
    info!("Client {} connected", conn.id);

    let (event_tx, event_rx) = session_channel();
    let session = match DeepgramSession::connect(&config.stt, event_tx.clone()).await {
        Ok(session) => Arc::new(session),
        Err(e) => {
            error!("Client {}: failed to open speech session: {:#}", conn.id, e);
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let mut adapter = SttAdapter::new(
        session,
        event_rx,
        event_tx,
        config.relay.keepalive_interval(),
    );

    loop {
        tokio::select! {
            inbound = socket.recv(), if !conn.disconnected => {
                match inbound {
                    Some(Ok(Message::Binary(frame))) => {
                        if frame.len() > config.relay.max_frame_bytes {
                            warn!(
                                "Client {}: dropping oversized {}-byte frame",
                                conn.id,
                                frame.len()
                            );
                            conn.stats.frames_dropped += 1;
                        } else if adapter.forward_audio(frame).await {
                            conn.stats.frames_forwarded += 1;
                        } else {
                            conn.stats.frames_dropped += 1;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Client {} disconnected", conn.id);
                        conn.disconnected = true;
                        adapter.finish().await;
                        // Keep draining session events so the flush and
                        // teardown complete; a session that is already
                        // done has nothing left to wait for
                        if adapter.state().is_terminal() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Text/ping/pong frames carry no audio
                    }
                    Some(Err(e)) => {
                        debug!("Client {} socket error: {}", conn.id, e);
                        conn.disconnected = true;
                        adapter.finish().await;
                        if adapter.state().is_terminal() {
                            break;
                        }
                    }
                }
            }
            event = adapter.next_event() => {
                match event {
                    Some(SessionEvent::Opened) => {
                        debug!("Client {}: speech session open", conn.id);
                        if conn.disconnected {
                            // Client went away while the session was still
                            // connecting
                            adapter.finish().await;
                        }
                    }
                    Some(SessionEvent::Transcript(transcript)) => {
                        if conn.disconnected {
                            continue;
                        }
                        if let Some(payload) = client_payload(&transcript) {
                            if socket.send(Message::Text(payload)).await.is_err() {
                                conn.disconnected = true;
                                adapter.finish().await;
                            } else {
                                conn.stats.transcripts_delivered += 1;
                            }
                        }
                    }
                    Some(SessionEvent::Error(cause)) => {
                        error!("Client {}: speech session error: {}", conn.id, cause);
                        break;
                    }
                    Some(SessionEvent::Closed) | None => {
                        debug!("Client {}: speech session closed", conn.id);
                        break;
                    }
                }
            }
        }
    }

    if !conn.disconnected {
        let _ = socket.send(Message::Close(None)).await;
    }

    info!(
        "Client {} closed after {:.1}s: {} frames forwarded, {} dropped, {} transcripts delivered",
        conn.id,
        conn.stats.duration_secs(),
        conn.stats.frames_forwarded,
        conn.stats.frames_dropped,
        conn.stats.transcripts_delivered,
    );
}
