use anyhow::{anyhow, Context, Result};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::config::SttConfig;
use super::events::{EventSender, SessionEvent, TranscriptEvent};
use super::session::SpeechSession;

/// Liveness control message, sent periodically while the session is open
const KEEPALIVE_MESSAGE: &str = r#"{"type":"KeepAlive"}"#;

/// Graceful-finish control message; the server flushes pending transcripts
/// and closes the stream in response
const CLOSE_STREAM_MESSAGE: &str = r#"{"type":"CloseStream"}"#;

const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

enum Outbound {
    Audio(Vec<u8>),
    KeepAlive,
    Finish,
}

/// One live connection to the Deepgram listen endpoint
///
/// The WebSocket is split into a writer task (audio frames and control
/// messages) and a reader task (transcript, close and error events pushed
/// into the event channel supplied at connect time). Dropping the session
/// closes the outbound channel, which ends the writer and in turn the
/// connection.
pub struct DeepgramSession {
    outbound: mpsc::Sender<Outbound>,
}

impl DeepgramSession {
    /// Open a live session with the fixed recognition settings.
    ///
    /// Emits `SessionEvent::Opened` once the handshake completes, then
    /// transcript events until the stream errors or closes.
    pub async fn connect(config: &SttConfig, events: EventSender) -> Result<Self> {
        info!("Connecting to speech service at {}", config.endpoint);

        let mut request = config
            .listen_url()
            .into_client_request()
            .context("Invalid speech service URL")?;
        let auth = HeaderValue::from_str(&format!("Token {}", config.api_key))
            .context("API key is not a valid header value")?;
        request.headers_mut().insert("Authorization", auth);

        let (ws_stream, _) = connect_async(request)
            .await
            .context("Speech service handshake failed")?;

        info!("Speech session established");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);

        let _ = events.send(SessionEvent::Opened).await;

        // Writer task: audio and control messages to the service
        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let frame = match msg {
                    Outbound::Audio(bytes) => Message::Binary(bytes),
                    Outbound::KeepAlive => Message::Text(KEEPALIVE_MESSAGE.to_string()),
                    Outbound::Finish => Message::Text(CLOSE_STREAM_MESSAGE.to_string()),
                };
                if ws_tx.send(frame).await.is_err() {
                    // The reader observes the close and reports it
                    break;
                }
            }
            let _ = ws_tx.close().await;
            debug!("Speech session writer task exiting");
        });

        // Reader task: transcript events back to the adapter
        let reader_events = events.clone();
        tokio::spawn(async move {
            loop {
                match ws_rx.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_listen_message(&text) {
                            if reader_events
                                .send(SessionEvent::Transcript(event))
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        match frame {
                            Some(f) => info!("Speech session closed: {} {}", f.code, f.reason),
                            None => info!("Speech session closed"),
                        }
                        let _ = reader_events.send(SessionEvent::Closed).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Speech session read error: {}", e);
                        let _ = reader_events.send(SessionEvent::Error(e.to_string())).await;
                        break;
                    }
                    None => {
                        // EOF without a close frame
                        let _ = reader_events.send(SessionEvent::Closed).await;
                        break;
                    }
                }
            }
            debug!("Speech session reader task exiting");
        });

        Ok(Self { outbound })
    }
}

#[async_trait::async_trait]
impl SpeechSession for DeepgramSession {
    async fn send_audio(&self, frame: Vec<u8>) -> Result<()> {
        self.outbound
            .send(Outbound::Audio(frame))
            .await
            .map_err(|_| anyhow!("Speech session is closed"))
    }

    async fn keep_alive(&self) -> Result<()> {
        self.outbound
            .send(Outbound::KeepAlive)
            .await
            .map_err(|_| anyhow!("Speech session is closed"))
    }

    async fn finish(&self) -> Result<()> {
        self.outbound
            .send(Outbound::Finish)
            .await
            .map_err(|_| anyhow!("Speech session is closed"))
    }
}

/// Subset of the listen-stream response the relay consumes
#[derive(Debug, Deserialize)]
struct ListenMessage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    is_final: bool,
    channel: Option<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: String,
}

/// Parse one text message from the listen stream.
///
/// Only `Results` messages carry transcripts; metadata and
/// voice-activity notifications are dropped here. Empty transcripts pass
/// through unchanged — filtering them is the relay endpoint's concern.
fn parse_listen_message(text: &str) -> Option<TranscriptEvent> {
    let msg: ListenMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!("Unrecognized speech service message: {}", e);
            return None;
        }
    };

    if msg.kind != "Results" {
        return None;
    }

    let alternative = msg.channel?.alternatives.into_iter().next()?;
    Some(TranscriptEvent {
        text: alternative.transcript,
        is_final: msg.is_final,
    })
}
