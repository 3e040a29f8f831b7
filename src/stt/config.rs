use serde::Deserialize;

/// Recognition settings for the speech service, fixed per session
///
/// The audio encoding and sample rate are negotiated once when a session
/// opens; individual frames carry no format information.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// API key (usually supplied via the DEEPGRAM_API_KEY environment
    /// variable; never logged)
    pub api_key: String,

    /// Live listen endpoint
    pub endpoint: String,

    /// Recognition model identifier
    pub model: String,

    /// Language code (e.g. "en-US")
    pub language: String,

    /// Audio encoding of client frames
    pub encoding: String,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Insert punctuation into transcripts
    pub punctuate: bool,

    /// Emit interim (partial) hypotheses
    pub interim_results: bool,

    /// Silence-based endpointing threshold in milliseconds
    pub endpointing_ms: u32,

    /// Emit voice-activity-detection events
    pub vad_events: bool,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "wss://api.deepgram.com/v1/listen".to_string(),
            model: "nova-2".to_string(),
            language: "en-US".to_string(),
            encoding: "linear16".to_string(),
            sample_rate: 16000, // 16kHz mono PCM from the browser capture pipeline
            punctuate: true,
            interim_results: true,
            endpointing_ms: 300,
            vad_events: true,
        }
    }
}

impl SttConfig {
    /// Build the listen URL carrying the fixed recognition parameters
    pub fn listen_url(&self) -> String {
        format!(
            "{}?model={}&language={}&encoding={}&sample_rate={}&punctuate={}&interim_results={}&endpointing={}&vad_events={}",
            self.endpoint,
            self.model,
            self.language,
            self.encoding,
            self.sample_rate,
            self.punctuate,
            self.interim_results,
            self.endpointing_ms,
            self.vad_events,
        )
    }
}
