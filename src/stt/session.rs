use anyhow::Result;

/// Streaming speech-recognition session
///
/// Implementations push [`super::SessionEvent`]s into the channel handed to
/// them at connect time: `Opened` once the connection accepts audio,
/// `Transcript` for each hypothesis, then exactly one of `Error` or
/// `Closed`.
#[async_trait::async_trait]
pub trait SpeechSession: Send + Sync {
    /// Forward one opaque audio frame upstream
    ///
    /// Valid only while the session is open; callers are expected to drop
    /// frames outside that window rather than queue them.
    async fn send_audio(&self, frame: Vec<u8>) -> Result<()>;

    /// Send the liveness keep-alive control message
    async fn keep_alive(&self) -> Result<()>;

    /// Request a graceful close, flushing any pending final transcript
    async fn finish(&self) -> Result<()>;
}
