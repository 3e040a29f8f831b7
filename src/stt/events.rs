use tokio::sync::mpsc;

/// A transcription hypothesis from the speech service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    /// Transcribed text (may be empty for silence-only segments)
    pub text: String,

    /// Whether this ends an utterance segment; interim hypotheses are
    /// revised by later events
    pub is_final: bool,
}

/// Lifecycle and transcript events emitted by a speech session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The upstream connection is established and accepting audio
    Opened,

    /// A transcription hypothesis (interim or final)
    Transcript(TranscriptEvent),

    /// The upstream connection failed; terminal
    Error(String),

    /// The upstream connection closed; terminal
    Closed,
}

pub type EventSender = mpsc::Sender<SessionEvent>;
pub type EventReceiver = mpsc::Receiver<SessionEvent>;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Create the event channel connecting a speech session to its adapter
pub fn session_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
