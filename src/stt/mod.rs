//! Upstream speech-recognition session
//!
//! This module owns the connection to the streaming speech service
//! (Deepgram live API):
//! - `SpeechSession` trait: the operations the relay needs from any
//!   streaming recognizer
//! - `DeepgramSession`: the live WebSocket implementation
//! - `SessionEvent` / `TranscriptEvent`: the events a session emits to
//!   its owner

mod config;
mod deepgram;
mod events;
mod session;

pub use config::SttConfig;
pub use deepgram::DeepgramSession;
pub use events::{session_channel, EventReceiver, EventSender, SessionEvent, TranscriptEvent};
pub use session::SpeechSession;
