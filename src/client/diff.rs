//! Round protocol: send a watch request, apply the streamed diff, stop at
//! `Sync`.
//!
//! Any send or receive failure tears the connection down and restarts the
//! whole round against the new connection and its empty store. The only
//! outcomes are a completed round or an observed cancellation.

use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use super::connection::ConnectionManager;
use crate::proto::op_item::Op;
use crate::proto::OpItem;
use crate::proto::WatchReq;
use crate::store::OrderedStore;
use crate::store::StoreValue;

#[derive(Debug)]
pub(crate) enum RoundOutcome {
    /// `Sync` received; the store as of the round boundary
    Complete(Arc<OrderedStore>),
    Canceled,
}

#[derive(Debug)]
enum RoundState {
    Send,
    Receive,
    Reconnect,
    Done(RoundOutcome),
}

/// What applying one operation means for the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpEffect {
    Continue,
    RoundEnd,
}

/// Runs one round on the current connection, reconnecting as often as
/// needed.
pub(crate) async fn run_round(
    conn: &mut ConnectionManager,
    req: &WatchReq,
) -> RoundOutcome {
    let mut state = RoundState::Send;
    loop {
        state = match state {
            RoundState::Done(outcome) => return outcome,
            state => step(conn, req, state).await,
        };
    }
}

async fn step(
    conn: &mut ConnectionManager,
    req: &WatchReq,
    state: RoundState,
) -> RoundState {
    if conn.token().is_cancelled() {
        return RoundState::Done(RoundOutcome::Canceled);
    }

    match state {
        RoundState::Send => send(conn, req).await,
        RoundState::Receive => receive(conn).await,
        RoundState::Reconnect => {
            if conn.teardown_and_reconnect().await {
                RoundState::Done(RoundOutcome::Canceled)
            } else {
                RoundState::Send
            }
        }
        done @ RoundState::Done(_) => done,
    }
}

async fn send(
    conn: &mut ConnectionManager,
    req: &WatchReq,
) -> RoundState {
    let token = conn.token().clone();
    let Some(session) = conn.session_mut() else {
        return RoundState::Reconnect;
    };

    let result = tokio::select! {
        _ = token.cancelled() => return RoundState::Done(RoundOutcome::Canceled),
        result = session.stream.send(req.clone()) => result,
    };

    match result {
        Ok(()) => {
            trace!("watch request sent: {:?}", req);
            RoundState::Receive
        }
        Err(e) => {
            warn!("watch send failed: {}", e);
            RoundState::Reconnect
        }
    }
}

async fn receive(conn: &mut ConnectionManager) -> RoundState {
    let token = conn.token().clone();
    let Some(session) = conn.session_mut() else {
        return RoundState::Reconnect;
    };

    let result = tokio::select! {
        _ = token.cancelled() => return RoundState::Done(RoundOutcome::Canceled),
        result = session.stream.recv() => result,
    };

    match result {
        Ok(op) => match apply_op(&mut session.store, op) {
            OpEffect::Continue => RoundState::Receive,
            OpEffect::RoundEnd => {
                debug!("round complete, {} entries", session.store.len());
                RoundState::Done(RoundOutcome::Complete(session.store.clone()))
            }
        },
        Err(e) => {
            error!("watch recv failed: {}", e);
            RoundState::Reconnect
        }
    }
}

/// Applies one received operation to the store.
///
/// Undecodable payloads are logged and dropped; unknown kinds are dropped
/// without decoding. `Sync` never touches the store.
pub(crate) fn apply_op(
    store: &mut Arc<OrderedStore>,
    op: OpItem,
) -> OpEffect {
    match op.op {
        Some(Op::Set(value)) => {
            let Some(r) = value.r#ref else {
                warn!("ignoring set without ref");
                return OpEffect::Continue;
            };

            match StoreValue::decode(r.set, &r.path, &value.bytes) {
                Ok(Some(decoded)) => Arc::make_mut(store).upsert(r.path, decoded),
                Ok(None) => {}
                Err(e) => error!("failed to parse value: {}", e),
            }
        }
        Some(Op::Delete(r)) => {
            if store.get(&r.path).is_some() {
                Arc::make_mut(store).delete(&r.path);
            }
        }
        Some(Op::Sync(_)) => return OpEffect::RoundEnd,
        None => trace!("ignoring empty op"),
    }

    OpEffect::Continue
}
