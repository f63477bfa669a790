//! Connection settings for a stove.
//!
//! With the `serde` feature the settings can be stored in a YAML file:
//!
//! ```yaml
//! host: 192.168.1.50
//! port: 2390
//! timeout: 1s
//! ```

use crate::{protocol as proto, transport::DEFAULT_TIMEOUT};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoveConfig {
    /// Host name or IP address of the stove.
    pub host: String,
    #[cfg_attr(feature = "serde", serde(default = "StoveConfig::default_port"))]
    pub port: u16,
    /// Receive timeout of a single request.
    #[cfg_attr(
        feature = "serde",
        serde(with = "humantime_serde", default = "StoveConfig::default_timeout")
    )]
    pub timeout: Duration,
}

impl StoveConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::default_port(),
            timeout: Self::default_timeout(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn default_port() -> u16 {
        proto::DEFAULT_PORT
    }

    fn default_timeout() -> Duration {
        DEFAULT_TIMEOUT
    }
}

#[cfg(feature = "serde")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(feature = "serde")]
impl StoveConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoveConfig::new("10.0.0.7");
        assert_eq!(config.port, 2390);
        assert_eq!(config.timeout, Duration::from_secs(1));

        let config = config
            .with_port(2400)
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.port, 2400);
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_yaml() {
        let config = StoveConfig::from_yaml_str("host: stove.local\ntimeout: 500ms\n").unwrap();
        assert_eq!(
            config,
            StoveConfig::new("stove.local").with_timeout(Duration::from_millis(500))
        );

        let config = StoveConfig::from_yaml_str("host: 10.0.0.7\nport: 2391\n").unwrap();
        assert_eq!(config.port, 2391);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        assert!(StoveConfig::from_yaml_str("port: 2391\n").is_err());
    }
}
