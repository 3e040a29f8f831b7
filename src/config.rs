use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::stt::SttConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub stt: SttConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "lingua-relay".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Seconds between keep-alive messages to the speech service
    pub keepalive_interval_secs: u64,

    /// Maximum concurrent client connections
    pub max_connections: usize,

    /// Maximum accepted audio frame size in bytes
    pub max_frame_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: 3,
            max_connections: 64,
            max_frame_bytes: 1024 * 1024, // 1 MiB
        }
    }
}

impl RelayConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}

impl Config {
    /// Load configuration from an optional file plus environment overrides.
    ///
    /// The speech service API key is taken from `stt.api_key` if set,
    /// otherwise from the `DEEPGRAM_API_KEY` environment variable.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LINGUA").separator("__"))
            .build()?;

        let mut cfg: Config = settings.try_deserialize()?;

        if cfg.stt.api_key.is_empty() {
            if let Ok(key) = std::env::var("DEEPGRAM_API_KEY") {
                cfg.stt.api_key = key;
            }
        }

        Ok(cfg)
    }

    /// Check startup requirements that have no usable defaults
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.stt.api_key.is_empty(),
            "No speech service API key: set DEEPGRAM_API_KEY or stt.api_key"
        );
        Ok(())
    }
}
