//! Transport abstraction of the watch protocol.
//!
//! The connection manager only sees a [`Connector`] that hands out
//! [`WatchStream`]s; [`GrpcConnector`] is the production implementation over
//! tonic.

mod grpc;
pub use grpc::*;


#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::proto::OpItem;
use crate::proto::WatchReq;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Establishes the transport and opens the bidirectional watch call.
    ///
    /// # Errors
    /// Any dial or stream-open failure. Callers treat every error as
    /// transient and retry after the configured delay.
    async fn connect(&self) -> Result<Box<dyn WatchStream>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait WatchStream: Send + 'static {
    /// Queues a watch request on the outbound half of the stream.
    async fn send(
        &mut self,
        req: WatchReq,
    ) -> Result<()>;

    /// Waits for the next operation. The server ending the stream is an
    /// error: a healthy watch never ends on its own.
    async fn recv(&mut self) -> Result<OpItem>;

    /// Half-closes the stream (send side).
    fn close_send(&mut self);
}
