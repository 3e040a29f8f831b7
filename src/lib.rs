pub mod config;
pub mod http;
pub mod relay;
pub mod stt;

pub use config::Config;
pub use http::{create_router, AppState};
pub use relay::{client_payload, ConnectionStats, SessionState, SttAdapter, TranscriptPayload};
pub use stt::{
    session_channel, DeepgramSession, SessionEvent, SpeechSession, SttConfig, TranscriptEvent,
};
