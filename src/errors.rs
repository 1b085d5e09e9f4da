//! Error hierarchy for the endpoints watch client.
//!
//! Only configuration and construction failures ever reach callers of the
//! public API. Transport and decode errors are consumed by the connection
//! and diff state machines, which log them and recover on their own.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport failures (dial, stream open, send, receive)
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Malformed `Set` payloads
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Malformed target address
    #[error("Invalid URI format: {0}")]
    InvalidURI(String),

    /// gRPC transport layer errors
    #[error(transparent)]
    TonicError(#[from] Box<tonic::transport::Error>),

    /// gRPC status code errors
    #[error(transparent)]
    TonicStatusError(#[from] Box<tonic::Status>),

    /// The server ended the watch stream
    #[error("watch stream closed by peer")]
    StreamClosed,

    /// The outbound half of the watch stream is gone
    #[error("watch request could not be sent: {0}")]
    SendFailed(String),

    /// TLS material could not be loaded
    #[error("failed to read TLS material from {path}: {source}")]
    TlsMaterial {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to decode {kind} at {path:?}: {source}")]
pub struct DecodeError {
    pub kind: &'static str,
    pub path: String,
    #[source]
    pub source: prost::DecodeError,
}

// ============== Conversion Implementations ============== //
impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        NetworkError::TonicError(Box::new(err)).into()
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        NetworkError::TonicStatusError(Box::new(status)).into()
    }
}

