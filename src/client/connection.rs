//! Connection lifecycle of the watch pipeline.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> (error) -> Disconnected -> ...
//!       \______________\_____________\______________> Canceled
//! ```
//!
//! Dial failures are retried forever after a fixed delay. Cancellation is
//! checked before every attempt and interrupts both the dial and the delay;
//! once `Canceled` is reached no further attempt is made.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::store::OrderedStore;
use crate::Connector;
use crate::WatchStream;

/// Everything owned by one successful connection. Dropping it closes the
/// stream and discards the snapshot.
pub(crate) struct Session {
    pub(crate) stream: Box<dyn WatchStream>,
    pub(crate) store: Arc<OrderedStore>,
}

pub(crate) enum ConnectionState {
    Disconnected,
    Connecting { attempt: u64 },
    Connected(Session),
    Canceled,
}

impl ConnectionState {
    fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected(_) => "connected",
            ConnectionState::Canceled => "canceled",
        }
    }
}

pub(crate) struct ConnectionManager {
    connector: Arc<dyn Connector>,
    error_delay: Duration,
    token: CancellationToken,
    state: ConnectionState,
}

impl ConnectionManager {
    pub(crate) fn new(
        connector: Arc<dyn Connector>,
        error_delay: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            connector,
            error_delay,
            token,
            state: ConnectionState::Disconnected,
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub(crate) fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    pub(crate) fn store(&self) -> Option<&OrderedStore> {
        match &self.state {
            ConnectionState::Connected(session) => Some(session.store.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.state {
            ConnectionState::Connected(session) => Some(session),
            _ => None,
        }
    }

    /// Blocks until a watch stream is open or the scope is canceled.
    ///
    /// Returns true when canceled. Every successful connection starts from
    /// an empty store.
    pub(crate) async fn connect(&mut self) -> bool {
        let mut state = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        loop {
            state = match state {
                ConnectionState::Connected(_) | ConnectionState::Canceled => break,
                ConnectionState::Disconnected => ConnectionState::Connecting { attempt: 1 },
                ConnectionState::Connecting { attempt } => self.try_connect(attempt).await,
            };
        }

        debug!("connect finished: {}", state.name());
        let canceled = matches!(state, ConnectionState::Canceled);
        self.state = state;
        canceled
    }

    /// Closes the send side of the stream, drops the connection and its
    /// store, waits the error delay, then connects again.
    ///
    /// Returns true when canceled.
    pub(crate) async fn teardown_and_reconnect(&mut self) -> bool {
        if let ConnectionState::Connected(mut session) =
            std::mem::replace(&mut self.state, ConnectionState::Disconnected)
        {
            session.stream.close_send();
        }

        if self.token.is_cancelled() || !self.error_sleep().await {
            self.state = ConnectionState::Canceled;
            return true;
        }

        self.connect().await
    }

    /// Transition out of `Connecting`
    ///
    /// Takes `&mut self` so the future stays `Send`: the session stream is
    /// not `Sync`.
    async fn try_connect(
        &mut self,
        attempt: u64,
    ) -> ConnectionState {
        if self.token.is_cancelled() {
            return ConnectionState::Canceled;
        }

        let result = tokio::select! {
            _ = self.token.cancelled() => return ConnectionState::Canceled,
            result = self.connector.connect() => result,
        };

        match result {
            Ok(stream) => {
                debug!("connected (attempt {})", attempt);
                ConnectionState::Connected(Session {
                    stream,
                    store: Arc::new(OrderedStore::new()),
                })
            }
            Err(e) => {
                info!("failed to connect (attempt {}): {}", attempt, e);
                if self.error_sleep().await {
                    ConnectionState::Connecting { attempt: attempt + 1 }
                } else {
                    ConnectionState::Canceled
                }
            }
        }
    }

    /// Waits the error delay. Returns false if canceled before or during
    /// the wait.
    async fn error_sleep(&mut self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }

        warn!("retrying in {:?}", self.error_delay);
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = sleep(self.error_delay) => true,
        }
    }
}
