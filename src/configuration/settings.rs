use config::{Config, ConfigError, File};
use serde_derive::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Every sleep, timeout, and iteration count the scenarios depend on.
///
/// CI environments vary wildly in latency, so none of these live as
/// magic numbers inside scenario code; a settings file can override any
/// of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bound on establishing one TCP connection.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub connect_timeout: Duration,
    /// Bound on socket reads once connected.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub read_timeout: Duration,
    /// How long a premature-response probe watches for data that must
    /// not arrive.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub peek_timeout: Duration,
    /// Grace period between sending a request fragment and inspecting
    /// the socket, absorbing network jitter.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub settle_delay: Duration,
    /// Pause between single bytes of a byte-wise request.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub byte_gap: Duration,
    /// Abortive-close linger window on raw sockets.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub linger: Duration,
    /// Connect/request/close cycles in the descriptor-leak probes.
    pub leak_iterations: u32,
    /// Wall-clock ceiling on a whole leak probe; exceeding it fails the
    /// probe outright.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub leak_ceiling: Duration,
    /// Readiness probes attempted against a freshly started server.
    pub startup_retries: u32,
    /// Pause between readiness probes.
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub startup_delay: Duration,
    /// Repetitions of the 8-byte path segment in the oversized-URI
    /// request (10240 of them is roughly 80 KB).
    pub oversize_repeats: u32,
    /// Length of the junk parameter padding in query-string checks.
    pub query_padding: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            peek_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_millis(100),
            byte_gap: Duration::from_millis(100),
            linger: Duration::from_secs(1),
            leak_iterations: 2000,
            leak_ceiling: Duration::from_secs(60),
            startup_retries: 10,
            startup_delay: Duration::from_millis(500),
            oversize_repeats: 10240,
            query_padding: 1024,
        }
    }
}

impl Settings {
    pub fn load(file: Option<&PathBuf>) -> Result<Self, ConfigError> {
        match file {
            None => Ok(Self::default()),
            Some(path) => {
                let mut config = Config::new();
                config.merge(File::from(path.clone()))?;
                config.try_into()
            }
        }
    }
}
