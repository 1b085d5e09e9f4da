use std::time::Duration;

use super::EndpointsClient;
use crate::ClientConfig;
use crate::Result;
use crate::TlsConfig;

pub struct ClientBuilder {
    config: ClientConfig,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set the dial target (default: 127.0.0.1:12090)
    pub fn target(
        mut self,
        target: impl Into<String>,
    ) -> Self {
        self.config.target = target.into();
        self
    }

    /// Set the delay before retrying after errors (default: 1s)
    pub fn error_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.config.error_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the max gRPC message size (default: 4MB)
    pub fn max_msg_size(
        mut self,
        size: usize,
    ) -> Self {
        self.config.max_msg_size = size;
        self
    }

    /// Set connection timeout (default: 1s)
    pub fn connect_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.config.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Enable/disable gzip compression (default: disabled)
    pub fn enable_compression(
        mut self,
        enable: bool,
    ) -> Self {
        self.config.enable_compression = enable;
        self
    }

    /// Set transport security (default: insecure)
    pub fn tls(
        mut self,
        tls: TlsConfig,
    ) -> Self {
        self.config.tls = tls;
        self
    }

    /// Completely replaces the default configuration
    ///
    /// # Warning: Configuration Override
    /// This will discard all previous settings configured through individual
    /// methods like [`target`](ClientBuilder::target) or
    /// [`error_delay`](ClientBuilder::error_delay).
    pub fn set_config(
        mut self,
        config: ClientConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the client with current configuration
    pub fn build(self) -> Result<EndpointsClient> {
        EndpointsClient::new(self.config)
    }
}
