use std::fs;

use serde::Deserialize;
use tonic::transport::Certificate;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Identity;

use crate::NetworkError;
use crate::Result;

/// Transport security for the watch connection.
///
/// When `enable_tls` is false the client dials an insecure (plaintext
/// HTTP/2) transport.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct TlsConfig {
    /// Enables TLS encryption for the watch connection
    /// Default: false (disabled)
    #[serde(default)]
    pub enable_tls: bool,

    /// Path to Certificate Authority root certificate in PEM format
    #[serde(default)]
    pub ca_path: String,

    /// Client certificate chain path in PEM format (mTLS)
    #[serde(default)]
    pub cert_path: String,

    /// Client private key path in PEM format (mTLS)
    #[serde(default)]
    pub key_path: String,

    /// Overrides the server name checked against the server certificate
    #[serde(default)]
    pub server_name: Option<String>,
}

impl TlsConfig {
    /// Builds the tonic TLS settings, `None` when TLS is disabled.
    pub fn client_tls_config(&self) -> Result<Option<ClientTlsConfig>> {
        if !self.enable_tls {
            return Ok(None);
        }

        let mut tls = ClientTlsConfig::new();

        if !self.ca_path.is_empty() {
            let ca = read_pem(&self.ca_path)?;
            tls = tls.ca_certificate(Certificate::from_pem(ca));
        }

        if !self.cert_path.is_empty() {
            let cert = read_pem(&self.cert_path)?;
            let key = read_pem(&self.key_path)?;
            tls = tls.identity(Identity::from_pem(cert, key));
        }

        if let Some(name) = &self.server_name {
            tls = tls.domain_name(name.clone());
        }

        Ok(Some(tls))
    }
}

fn read_pem(path: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| {
        NetworkError::TlsMaterial {
            path: path.to_string(),
            source,
        }
        .into()
    })
}
