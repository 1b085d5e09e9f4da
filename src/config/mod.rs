//! Configuration of the endpoints watch client.
//!
//! Loaded from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Explicit config file
//! 3. File named by the `CONFIG_PATH` environment variable
//! 4. Environment variables with the `LOCALNET__` prefix (highest priority)

mod tls;
pub use tls::*;


//---
use std::env;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::constants::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::constants::DEFAULT_ERROR_DELAY_MS;
use crate::constants::DEFAULT_HTTP2_KEEP_ALIVE_INTERVAL_IN_SECS;
use crate::constants::DEFAULT_HTTP2_KEEP_ALIVE_TIMEOUT_IN_SECS;
use crate::constants::DEFAULT_MAX_MSG_SIZE;
use crate::constants::DEFAULT_TARGET;
use crate::constants::DEFAULT_TCP_KEEPALIVE_IN_SECS;
use crate::constants::ENV_CONFIG_PATH;
use crate::constants::ENV_PREFIX;
use crate::constants::MULTI_TARGET_PREFIX;
use crate::Error;
use crate::Result;

/// Connection parameters consumed by the connection manager.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientConfig {
    /// gRPC dial target. Accepts `host:port`, a full URI, or
    /// `multi:///host1:port,host2:port` to balance over several addresses.
    /// Default: 127.0.0.1:12090
    #[serde(default = "default_target")]
    pub target: String,

    /// Delay before retrying after an error (unit: milliseconds)
    /// Default: 1000
    #[serde(default = "default_error_delay_ms")]
    pub error_delay_ms: u64,

    /// Max size of a gRPC message in bytes, both directions
    /// Default: 4MB
    #[serde(default = "default_max_msg_size")]
    pub max_msg_size: usize,

    /// TCP connect timeout (unit: milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// TCP keepalive for the watch connection
    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_in_secs: u64,

    /// HTTP2 keepalive ping interval
    #[serde(default = "default_h2_keepalive_interval")]
    pub http2_keep_alive_interval_in_secs: u64,

    /// HTTP2 keepalive timeout
    #[serde(default = "default_h2_keepalive_timeout")]
    pub http2_keep_alive_timeout_in_secs: u64,

    /// Enable Gzip compression on the watch stream
    /// Default: false (the server must support it)
    #[serde(default)]
    pub enable_compression: bool,

    /// Transport security, insecure when disabled
    #[serde(default)]
    pub tls: TlsConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            error_delay_ms: default_error_delay_ms(),
            max_msg_size: default_max_msg_size(),
            connect_timeout_ms: default_connect_timeout_ms(),
            tcp_keepalive_in_secs: default_tcp_keepalive(),
            http2_keep_alive_interval_in_secs: default_h2_keepalive_interval(),
            http2_keep_alive_timeout_in_secs: default_h2_keepalive_timeout(),
            enable_compression: false,
            tls: TlsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from defaults, an optional file, the file named by
    /// `CONFIG_PATH`, then `LOCALNET__*` environment variables.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML configuration file
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        if let Ok(path) = env::var(ENV_CONFIG_PATH) {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: ClientConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration sanity
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(config_error("target must not be empty".to_string()));
        }

        if let Some(list) = self.target.strip_prefix(MULTI_TARGET_PREFIX) {
            if list.split(',').all(|addr| addr.trim().is_empty()) {
                return Err(config_error(format!(
                    "target {} lists no address",
                    self.target
                )));
            }
        }

        if self.max_msg_size == 0 {
            return Err(config_error("max_msg_size must be > 0".to_string()));
        }

        if self.connect_timeout_ms == 0 {
            return Err(config_error("connect_timeout_ms must be > 0".to_string()));
        }

        if self.tls.cert_path.is_empty() != self.tls.key_path.is_empty() {
            return Err(config_error(
                "tls cert_path and key_path must be set together".to_string(),
            ));
        }

        Ok(())
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn tcp_keepalive(&self) -> Duration {
        Duration::from_secs(self.tcp_keepalive_in_secs)
    }

    pub fn http2_keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.http2_keep_alive_interval_in_secs)
    }

    pub fn http2_keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.http2_keep_alive_timeout_in_secs)
    }
}

fn config_error(message: String) -> Error {
    Error::Config(ConfigError::Message(message))
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}
fn default_error_delay_ms() -> u64 {
    DEFAULT_ERROR_DELAY_MS
}
fn default_max_msg_size() -> usize {
    DEFAULT_MAX_MSG_SIZE
}
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}
fn default_tcp_keepalive() -> u64 {
    DEFAULT_TCP_KEEPALIVE_IN_SECS
}
fn default_h2_keepalive_interval() -> u64 {
    DEFAULT_HTTP2_KEEP_ALIVE_INTERVAL_IN_SECS
}
fn default_h2_keepalive_timeout() -> u64 {
    DEFAULT_HTTP2_KEEP_ALIVE_TIMEOUT_IN_SECS
}
