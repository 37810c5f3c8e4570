//! Configuration loading and typed config structures for the dashboard.
//!
//! The canonical configuration lives in `strata-config.yaml` at the project
//! root (override the path with `STRATA_CONFIG`). Every field has a serde
//! default, so a missing file or a partial file is fine.
//!
//! Environment variables override YAML values:
//! - `STRATA_UPSTREAM_URL` overrides `upstream.api_url`
//! - `STRATA_STREAM_URL` overrides `upstream.stream_url`
//! - `STRATA_PORT` overrides `server.port`
//! - `STRATA_LOG_LEVEL` overrides `logging.level`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use strata_client::{BackoffPolicy, ClientConfig};
use strata_render::RenderOptions;

use crate::server::ServerConfig;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "strata-config.yaml";

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "STRATA_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
        /// Parse failure.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level dashboard configuration.
///
/// Mirrors the structure of `strata-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerSection,

    /// Simulation backend connection.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Initial render options.
    #[serde(default)]
    pub render: RenderOptions,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] if an override does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load from `$STRATA_CONFIG` or `strata-config.yaml`, falling back to
    /// defaults (plus environment overrides) when the file does not exist.
    ///
    /// Returns the config and the path it was read from, if any.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        if path.exists() {
            let config = Self::from_file(&path)?;
            return Ok((config, Some(path)));
        }
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok((config, None))
    }

    /// Override values from the process environment when set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Override values from `lookup` (variable name to value).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("STRATA_UPSTREAM_URL") {
            self.upstream.api_url = val;
        }
        if let Some(val) = lookup("STRATA_STREAM_URL") {
            self.upstream.stream_url = val;
        }
        if let Some(val) = lookup("STRATA_PORT") {
            self.server.port = val.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    var: "STRATA_PORT",
                    value: val.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(val) = lookup("STRATA_LOG_LEVEL") {
            self.logging.level = val;
        }
        Ok(())
    }

    /// Listener settings for [`start_server`](crate::server::start_server).
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
        }
    }
}

/// HTTP listener section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Simulation backend section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamConfig {
    /// Whether to connect at all. When off the dashboard shows the
    /// placeholder frame and simulation controls answer 503.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// REST base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Push stream URL.
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// First reconnect delay in milliseconds.
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    /// Reconnect delay cap in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Reconnect delay multiplier.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: u32,

    /// Consecutive stream failures before REST polling.
    #[serde(default = "default_max_stream_attempts")]
    pub max_stream_attempts: u32,

    /// Polls between stream retries while polling.
    #[serde(default = "default_stream_retry_polls")]
    pub stream_retry_polls: u32,

    /// Polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_api_url(),
            stream_url: default_stream_url(),
            request_timeout_ms: default_request_timeout_ms(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            backoff_factor: default_backoff_factor(),
            max_stream_attempts: default_max_stream_attempts(),
            stream_retry_polls: default_stream_retry_polls(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl UpstreamConfig {
    /// Settings for [`strata_client::StreamClient`].
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            stream_url: self.stream_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            backoff: BackoffPolicy {
                initial: Duration::from_millis(self.backoff_initial_ms),
                max: Duration::from_millis(self.backoff_max_ms),
                factor: self.backoff_factor,
            },
            max_stream_attempts: self.max_stream_attempts,
            stream_retry_polls: self.stream_retry_polls,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..ClientConfig::default()
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (e.g. `info`,
    /// `strata_dashboard=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of the compact human format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    String::from("http://localhost:8000")
}

fn default_stream_url() -> String {
    String::from("ws://localhost:8000/ws")
}

const fn default_request_timeout_ms() -> u64 {
    5000
}

const fn default_backoff_initial_ms() -> u64 {
    1000
}

const fn default_backoff_max_ms() -> u64 {
    30_000
}

const fn default_backoff_factor() -> u32 {
    2
}

const fn default_max_stream_attempts() -> u32 {
    5
}

const fn default_stream_retry_polls() -> u32 {
    10
}

const fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DashboardConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.upstream.enabled);
        assert_eq!(config.render.width, 120);
        assert_eq!(config.render.height, 36);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000

upstream:
  enabled: false
  api_url: "http://sim:8000"
  stream_url: "ws://sim:8000/stream"
  backoff_initial_ms: 250
  max_stream_attempts: 3

render:
  width: 80
  height: 24
  glyph_ramp: "blocks"
  show_agents: false
  target_fps: 30

logging:
  level: "debug"
  json: true
"#;
        let config = DashboardConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert!(!config.upstream.enabled);
        assert_eq!(config.upstream.api_url, "http://sim:8000");
        assert_eq!(config.upstream.backoff_initial_ms, 250);
        assert_eq!(config.upstream.max_stream_attempts, 3);
        assert_eq!(config.upstream.poll_interval_ms, 2000);
        assert_eq!(config.render.width, 80);
        assert_eq!(config.render.glyph_ramp, "blocks");
        assert!(!config.render.show_agents);
        assert_eq!(config.render.max_agents, 200);
        assert!(config.logging.json);
    }

    #[test]
    fn partial_and_empty_yaml_use_defaults() {
        let config = DashboardConfig::parse("server:\n  port: 7000\n").unwrap_or_default();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.upstream, UpstreamConfig::default());

        assert!(matches!(DashboardConfig::parse(""), Ok(c) if c == DashboardConfig::default()));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            DashboardConfig::parse("server: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn env_overrides_win() {
        let vars: BTreeMap<&str, &str> = [
            ("STRATA_UPSTREAM_URL", "http://elsewhere:1"),
            ("STRATA_STREAM_URL", "ws://elsewhere:1/ws"),
            ("STRATA_PORT", " 9100 "),
            ("STRATA_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();
        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|k| vars.get(k).map(|v| (*v).to_owned()));
        assert!(result.is_ok());
        assert_eq!(config.upstream.api_url, "http://elsewhere:1");
        assert_eq!(config.upstream.stream_url, "ws://elsewhere:1/ws");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = DashboardConfig::default();
        let result = config.apply_overrides(|k| (k == "STRATA_PORT").then(|| "http".to_owned()));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { var: "STRATA_PORT", .. })
        ));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn client_config_carries_upstream_settings() {
        let upstream = UpstreamConfig {
            backoff_initial_ms: 50,
            poll_interval_ms: 100,
            ..UpstreamConfig::default()
        };
        let client = upstream.client_config();
        assert_eq!(client.backoff.initial, Duration::from_millis(50));
        assert_eq!(client.poll_interval, Duration::from_millis(100));
        assert_eq!(client.stream_url, "ws://localhost:8000/ws");
    }
}
