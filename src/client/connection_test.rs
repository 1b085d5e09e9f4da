use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::connection::ConnectionManager;
use super::connection::ConnectionState;
use crate::store::StoreValue;
use crate::test_utils::enable_logger;
use crate::test_utils::scripted_connector;
use crate::test_utils::service;
use crate::test_utils::Dial;
use crate::test_utils::ScriptedStream;
use crate::MockConnector;

fn manager(
    connector: MockConnector,
    error_delay: Duration,
) -> (ConnectionManager, CancellationToken) {
    let token = CancellationToken::new();
    (
        ConnectionManager::new(Arc::new(connector), error_delay, token.clone()),
        token,
    )
}

#[tokio::test]
async fn test_connect_retries_until_success() {
    enable_logger();
    let (connector, attempts) = scripted_connector(vec![
        Dial::Fail,
        Dial::Fail,
        Dial::Ok(ScriptedStream::ops(vec![])),
    ]);
    let (mut conn, _token) = manager(connector, Duration::from_millis(10));

    assert!(!conn.connect().await);
    assert!(conn.is_connected());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(conn.store().unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_pre_canceled_never_dials() {
    let (connector, attempts) = scripted_connector(vec![Dial::Ok(ScriptedStream::ops(vec![]))]);
    let (mut conn, token) = manager(connector, Duration::from_millis(10));
    token.cancel();

    assert!(conn.connect().await);
    assert!(!conn.is_connected());
    assert!(matches!(conn.state(), ConnectionState::Canceled));
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancel_interrupts_error_delay() {
    enable_logger();
    let (connector, attempts) = scripted_connector(vec![]);
    let (mut conn, token) = manager(connector, Duration::from_secs(10));

    let canceler = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceler.cancel();
    });

    let start = Instant::now();
    let canceled = timeout(Duration::from_secs(1), conn.connect())
        .await
        .expect("connect should observe cancellation");

    assert!(canceled);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_canceled_is_terminal() {
    let (connector, attempts) = scripted_connector(vec![]);
    let (mut conn, token) = manager(connector, Duration::from_millis(5));
    token.cancel();

    assert!(conn.connect().await);
    assert!(conn.connect().await);
    assert!(conn.teardown_and_reconnect().await);
    assert!(matches!(conn.state(), ConnectionState::Canceled));
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_teardown_closes_stream_and_resets_store() {
    enable_logger();
    let first = ScriptedStream::ops(vec![]);
    let first_probe = first.probe();
    let (connector, attempts) = scripted_connector(vec![
        Dial::Ok(first),
        Dial::Ok(ScriptedStream::ops(vec![])),
    ]);
    let (mut conn, _token) = manager(connector, Duration::from_millis(5));

    assert!(!conn.connect().await);
    let session = conn.session_mut().unwrap();
    Arc::make_mut(&mut session.store).upsert(
        "default/web".to_string(),
        StoreValue::Service(service("default", "web")),
    );
    assert_eq!(conn.store().unwrap().len(), 1);

    assert!(!conn.teardown_and_reconnect().await);
    assert!(first_probe.is_closed());
    assert!(conn.is_connected());
    assert!(conn.store().unwrap().is_empty());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_teardown_canceled_during_delay() {
    let (connector, attempts) = scripted_connector(vec![Dial::Ok(ScriptedStream::ops(vec![]))]);
    let (mut conn, token) = manager(connector, Duration::from_secs(10));
    assert!(!conn.connect().await);

    let canceler = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceler.cancel();
    });

    let canceled = timeout(Duration::from_secs(1), conn.teardown_and_reconnect())
        .await
        .expect("teardown should observe cancellation");
    assert!(canceled);
    assert!(conn.store().is_none());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
