use serde::{Deserialize, Serialize};

use crate::stt::TranscriptEvent;

/// Transcript message sent to the browser client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptPayload {
    pub transcript: String,

    #[serde(rename = "isFinal")]
    pub is_final: bool,
}

/// Encode a transcript event for the client.
///
/// The speech service emits empty transcripts for silence-only segments;
/// those produce no client message.
pub fn client_payload(event: &TranscriptEvent) -> Option<String> {
    if event.text.is_empty() {
        return None;
    }

    let payload = TranscriptPayload {
        transcript: event.text.clone(),
        is_final: event.is_final,
    };

    serde_json::to_string(&payload).ok()
}
