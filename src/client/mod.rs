//! Endpoints watch client
//!
//! - [`EndpointsClient`] - blocking-until-round API over the watch stream
//! - [`ClientBuilder`] - configurable client construction
//! - [`ServiceEndpoints`] - one service with its endpoints
//!
//! # Basic Usage
//! ```no_run
//! use localnet_client::proto::WatchReq;
//! use localnet_client::EndpointsClient;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut client = EndpointsClient::builder()
//!         .target("127.0.0.1:12090")
//!         .error_delay(Duration::from_secs(1))
//!         .build()
//!         .unwrap();
//!     client.cancel_on_signals().unwrap();
//!
//!     let req = WatchReq::for_node("node-1");
//!     loop {
//!         let (items, canceled) = client.next(&req).await;
//!         if canceled {
//!             break;
//!         }
//!         println!("{} services", items.len());
//!     }
//! }
//! ```

mod builder;
mod connection;
mod diff;
mod grouper;

pub use builder::*;
pub use grouper::ServiceEndpoints;

#[cfg(test)]
mod connection_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use self::connection::ConnectionManager;
use self::diff::run_round;
use self::diff::RoundOutcome;
use self::grouper::closed_channel;
use self::grouper::group;
use self::grouper::spawn_grouper;
use self::grouper::GroupingReport;
use crate::proto::WatchReq;
use crate::ClientConfig;
use crate::Connector;
use crate::GrpcConnector;
use crate::Result;

/// Client of the endpoints watch API.
///
/// Never fails on network instability: every call keeps retrying until a
/// full round has been received or the client is canceled. One round may be
/// in flight at a time, which `&mut self` enforces.
pub struct EndpointsClient {
    conn: ConnectionManager,
    token: CancellationToken,
}

impl EndpointsClient {
    /// Client over gRPC, configured from `config`.
    ///
    /// # Errors
    /// Invalid configuration or unreadable TLS material. Nothing is dialed
    /// before the first round.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let connector = GrpcConnector::new(&config)?;
        Ok(Self::with_connector(connector, config.error_delay()))
    }

    /// Client over a custom transport.
    pub fn with_connector<C: Connector>(
        connector: C,
        error_delay: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        Self {
            conn: ConnectionManager::new(Arc::new(connector), error_delay, token.clone()),
            token,
        }
    }

    /// Create a configured client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns every service with its endpoints as of the next round
    /// boundary, waiting for the round as needed.
    ///
    /// Returns an empty list and `true` once canceled.
    pub async fn next(
        &mut self,
        req: &WatchReq,
    ) -> (Vec<ServiceEndpoints>, bool) {
        let Some((mut rx, handle)) = self.start_round(req).await else {
            return (Vec::new(), true);
        };

        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }

        match handle.await {
            Ok(GroupingReport { completed: true, .. }) => (items, false),
            Ok(_) => (Vec::new(), true),
            Err(e) => {
                error!("grouping task failed: {:?}", e);
                (Vec::new(), true)
            }
        }
    }

    /// Like [`next`](Self::next), but hands the aggregates over through a
    /// bounded queue as they are produced.
    ///
    /// The queue is closed after the last aggregate. Once canceled, the
    /// returned queue is already closed and the flag is `true`.
    pub async fn next_channel(
        &mut self,
        req: &WatchReq,
    ) -> (mpsc::Receiver<ServiceEndpoints>, bool) {
        match self.start_round(req).await {
            Some((rx, _)) => (rx, false),
            None => (closed_channel(), true),
        }
    }

    /// Groups the snapshot held by the current connection, without waiting
    /// for a round. `None` while disconnected.
    pub fn snapshot(&self) -> Option<Vec<ServiceEndpoints>> {
        self.conn.store().map(group)
    }

    /// Cancels this client, quickly releasing any call to `next`.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The execution scope shared by every checkpoint of this client.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancels this client on the default termination signals.
    #[cfg(unix)]
    pub fn cancel_on_signals(&self) -> std::io::Result<JoinHandle<()>> {
        crate::signal::cancel_on_signals(self.token.clone())
    }

    /// Cancels this client on the given signals.
    #[cfg(unix)]
    pub fn cancel_on(
        &self,
        signals: &[tokio::signal::unix::SignalKind],
    ) -> std::io::Result<JoinHandle<()>> {
        crate::signal::cancel_on(self.token.clone(), signals)
    }

    async fn start_round(
        &mut self,
        req: &WatchReq,
    ) -> Option<(mpsc::Receiver<ServiceEndpoints>, JoinHandle<GroupingReport>)> {
        if !self.conn.is_connected() {
            self.conn.connect().await;
        }

        if self.token.is_cancelled() {
            return None;
        }

        match run_round(&mut self.conn, req).await {
            RoundOutcome::Complete(store) => Some(spawn_grouper(store, self.token.clone())),
            RoundOutcome::Canceled => None,
        }
    }
}
