//! Regroups the flat ordered store into service aggregates.
//!
//! Relies on path order: every endpoint key sorts after its service key and
//! before the next service key. An endpoint seen before any service is
//! dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::constants::RESULTS_CHANNEL_CAPACITY;
use crate::proto::Endpoint;
use crate::proto::Service;
use crate::store::OrderedStore;
use crate::store::StoreValue;

/// A service and its endpoints, in path order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceEndpoints {
    pub service: Service,
    pub endpoints: Vec<Endpoint>,
}

/// Summary of one grouping pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct GroupingReport {
    /// Aggregates delivered to the queue
    pub(crate) sent: usize,
    /// Endpoints with no preceding service
    pub(crate) orphans: usize,
    /// False when cancellation or a dropped receiver cut the pass short
    pub(crate) completed: bool,
}

/// Incremental grouping over an ascending traversal.
#[derive(Debug, Default)]
pub(crate) struct Grouper {
    current: Option<ServiceEndpoints>,
    orphans: usize,
}

impl Grouper {
    /// Feeds the next entry; returns the previous aggregate once a new
    /// service starts.
    pub(crate) fn push(
        &mut self,
        path: &str,
        value: &StoreValue,
    ) -> Option<ServiceEndpoints> {
        match value {
            StoreValue::Service(service) => self.current.replace(ServiceEndpoints {
                service: service.clone(),
                endpoints: Vec::new(),
            }),
            StoreValue::Endpoint(endpoint) => {
                match &mut self.current {
                    Some(current) => current.endpoints.push(endpoint.clone()),
                    None => {
                        debug!("dropping endpoint {:?}: no service before it", path);
                        self.orphans += 1;
                    }
                }
                None
            }
        }
    }

    /// Flushes the last aggregate.
    pub(crate) fn finish(self) -> (Option<ServiceEndpoints>, usize) {
        (self.current, self.orphans)
    }
}

/// Groups a whole store at once.
pub(crate) fn group(store: &OrderedStore) -> Vec<ServiceEndpoints> {
    let mut grouper = Grouper::default();
    let mut items = Vec::new();

    store.ascend(|path, value| {
        items.extend(grouper.push(path, value));
        true
    });
    items.extend(grouper.finish().0);

    items
}

/// Starts the producer task of a finished round.
///
/// The task owns the only sender; the queue closes exactly once, when the
/// task returns. A full queue blocks the task until the consumer catches up
/// or the scope is canceled.
pub(crate) fn spawn_grouper(
    store: Arc<OrderedStore>,
    token: CancellationToken,
) -> (mpsc::Receiver<ServiceEndpoints>, JoinHandle<GroupingReport>) {
    let (tx, rx) = mpsc::channel(RESULTS_CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move { produce(&store, tx, &token).await });
    (rx, handle)
}

async fn produce(
    store: &OrderedStore,
    tx: mpsc::Sender<ServiceEndpoints>,
    token: &CancellationToken,
) -> GroupingReport {
    let mut grouper = Grouper::default();
    let mut report = GroupingReport::default();

    for (path, value) in store.iter() {
        if let Some(aggregate) = grouper.push(path, value) {
            if !emit(&tx, token, aggregate).await {
                return report;
            }
            report.sent += 1;
        }
    }

    let (last, orphans) = grouper.finish();
    report.orphans = orphans;
    if let Some(aggregate) = last {
        if !emit(&tx, token, aggregate).await {
            return report;
        }
        report.sent += 1;
    }

    debug!("grouping done: {:?}", report);
    report.completed = true;
    report
}

async fn emit(
    tx: &mpsc::Sender<ServiceEndpoints>,
    token: &CancellationToken,
    aggregate: ServiceEndpoints,
) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        sent = tx.send(aggregate) => sent.is_ok(),
    }
}

/// A queue that is already closed, for the canceled fast path.
pub(crate) fn closed_channel() -> mpsc::Receiver<ServiceEndpoints> {
    let (_, rx) = mpsc::channel(1);
    rx
}
