//! Scripted transport for driving the watch pipeline without a server.
//!
//! A [`ScriptedStream`] replays a fixed list of [`Step`]s from `recv` and
//! records what the pipeline sent and whether it half-closed the stream.
//! [`scripted_connector`] wraps a [`MockConnector`] that hands out one
//! scripted stream per dial, and fails every dial once the scripts run out.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tonic::async_trait;

use crate::proto::OpItem;
use crate::proto::WatchReq;
use crate::MockConnector;
use crate::NetworkError;
use crate::Result;
use crate::WatchStream;

pub(crate) enum Step {
    /// `recv` yields this operation
    Op(OpItem),
    /// `recv` fails with a transport error
    Fail,
    /// `recv` never returns
    Hang,
}

/// What the pipeline did to a scripted stream
#[derive(Clone, Default)]
pub(crate) struct StreamProbe {
    pub(crate) sent: Arc<Mutex<Vec<WatchReq>>>,
    pub(crate) closed: Arc<AtomicBool>,
}

impl StreamProbe {
    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub(crate) struct ScriptedStream {
    steps: VecDeque<Step>,
    fail_send: bool,
    probe: StreamProbe,
}

impl ScriptedStream {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            fail_send: false,
            probe: StreamProbe::default(),
        }
    }

    /// Stream replaying `ops` in order, then hanging
    pub(crate) fn ops(ops: Vec<OpItem>) -> Self {
        Self::new(ops.into_iter().map(Step::Op).collect())
    }

    /// Every `send` fails
    pub(crate) fn failing_send() -> Self {
        Self {
            fail_send: true,
            ..Self::new(vec![])
        }
    }

    pub(crate) fn probe(&self) -> StreamProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl WatchStream for ScriptedStream {
    async fn send(
        &mut self,
        req: WatchReq,
    ) -> Result<()> {
        if self.fail_send {
            return Err(NetworkError::SendFailed("scripted send failure".to_string()).into());
        }
        self.probe.sent.lock().push(req);
        Ok(())
    }

    async fn recv(&mut self) -> Result<OpItem> {
        match self.steps.pop_front() {
            Some(Step::Op(op)) => Ok(op),
            Some(Step::Fail) => Err(NetworkError::StreamClosed.into()),
            Some(Step::Hang) | None => std::future::pending().await,
        }
    }

    fn close_send(&mut self) {
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}

/// Dial outcome of one connect attempt
pub(crate) enum Dial {
    Ok(ScriptedStream),
    Fail,
}

/// Connector replaying `dials` in order; counts every attempt.
pub(crate) fn scripted_connector(dials: Vec<Dial>) -> (MockConnector, Arc<AtomicUsize>) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let dials = Mutex::new(VecDeque::from(dials));

    let mut connector = MockConnector::new();
    let counter = attempts.clone();
    connector.expect_connect().returning(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        match dials.lock().pop_front() {
            Some(Dial::Ok(stream)) => Ok(Box::new(stream) as Box<dyn WatchStream>),
            Some(Dial::Fail) | None => Err(tonic::Status::unavailable("scripted dial failure").into()),
        }
    });

    (connector, attempts)
}
