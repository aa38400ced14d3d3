mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{within, FakeHost, FAKE_NOW_MS};
use postbox::interpreter::{perform, Interpreter};
use postbox::post::{Cmd, PostIntent, ResourceId};
use tokio::sync::mpsc;

fn id(s: &str) -> ResourceId {
    ResourceId::from(s)
}

#[tokio::test]
async fn none_performs_nothing() {
    let host = FakeHost::new();
    assert!(perform(&host, Cmd::None).await.is_empty());
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn fetch_success_and_failure() {
    let host = FakeHost::new();
    host.script_fetch("75001", vec![Ok("croissants"), Err("connection reset")]);

    let ok = perform(&host, Cmd::FetchResource { id: id("75001") }).await;
    assert_eq!(
        ok,
        vec![PostIntent::ResourceFetched {
            id: id("75001"),
            body: "croissants".into()
        }]
    );

    let failed = perform(&host, Cmd::FetchResource { id: id("75001") }).await;
    assert_eq!(
        failed,
        vec![PostIntent::ResourceFetchFailed {
            id: id("75001"),
            error: "Connection failed: connection reset".into()
        }]
    );
}

#[tokio::test]
async fn beer_success_and_failure() {
    let host = FakeHost::new();
    assert_eq!(perform(&host, Cmd::OrderBeer).await, vec![PostIntent::BeerOrdered]);

    host.fail_beer();
    assert_eq!(
        perform(&host, Cmd::OrderBeer).await,
        vec![PostIntent::BeerOrderFailed {
            error: "Unexpected status 503: bar closed".into()
        }]
    );
}

#[tokio::test]
async fn persist_success_and_failure() {
    let host = FakeHost::new();
    let cmd = Cmd::PersistPackage {
        id: id("EC1A"),
        body: "tea".into(),
    };

    assert_eq!(
        perform(&host, cmd.clone()).await,
        vec![PostIntent::PackagePersisted { id: id("EC1A") }]
    );
    assert_eq!(host.stored(), vec![(id("EC1A"), "tea".to_string())]);

    host.fail_persist();
    let failed = perform(&host, cmd).await;
    assert!(matches!(
        failed.as_slice(),
        [PostIntent::PersistFailed { error, .. }] if error.starts_with("Storage error")
    ));
}

#[tokio::test]
async fn get_time_reads_host_clock() {
    let host = FakeHost::new();
    assert_eq!(
        perform(&host, Cmd::GetTime).await,
        vec![PostIntent::ClockRead {
            unix_ms: FAKE_NOW_MS
        }]
    );
}

#[tokio::test]
async fn retry_after_sleeps_then_reports_due() {
    let host = FakeHost::new();
    let intents = perform(
        &host,
        Cmd::RetryAfter {
            id: id("75001"),
            delay_ms: 250,
        },
    )
    .await;
    assert_eq!(intents, vec![PostIntent::RetryDue { id: id("75001") }]);
    assert_eq!(host.sleeps(), vec![Duration::from_millis(250)]);
}

#[tokio::test]
async fn cancel_without_dispatcher_yields_nothing() {
    let host = FakeHost::new();
    assert!(perform(&host, Cmd::CancelFetch { id: id("75001") })
        .await
        .is_empty());
}

#[tokio::test]
async fn batch_runs_leaves_in_order() {
    let host = FakeHost::new();
    let intents = perform(
        &host,
        Cmd::Batch(vec![
            Cmd::OrderBeer,
            Cmd::None,
            Cmd::Batch(vec![Cmd::GetTime]),
        ]),
    )
    .await;
    assert_eq!(
        intents,
        vec![
            PostIntent::BeerOrdered,
            PostIntent::ClockRead {
                unix_ms: FAKE_NOW_MS
            }
        ]
    );
}

#[tokio::test]
async fn every_leaf_has_an_interpretation() {
    let host = FakeHost::new();
    let leaves = vec![
        (Cmd::None, 0),
        (Cmd::FetchResource { id: id("a") }, 1),
        (Cmd::CancelFetch { id: id("a") }, 0),
        (
            Cmd::RetryAfter {
                id: id("a"),
                delay_ms: 0,
            },
            1,
        ),
        (Cmd::GetTime, 1),
        (
            Cmd::PersistPackage {
                id: id("a"),
                body: "b".into(),
            },
            1,
        ),
        (Cmd::OrderBeer, 1),
    ];
    for (cmd, expected) in leaves {
        let intents = perform(&host, cmd.clone()).await;
        assert_eq!(intents.len(), expected, "cmd: {:?}", cmd);
        assert!(intents.iter().all(PostIntent::is_effect_result));
    }
}

// Dispatch

#[tokio::test]
async fn dispatch_delivers_results_to_outbox() {
    let host = FakeHost::shared();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let interpreter = Interpreter::new(Arc::clone(&host), tx);

    interpreter.dispatch(Cmd::batch([Cmd::OrderBeer, Cmd::GetTime]));
    within(interpreter.idle()).await;

    let mut received = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
    received.sort_by_key(|intent| format!("{:?}", intent));
    assert_eq!(
        received,
        vec![
            PostIntent::BeerOrdered,
            PostIntent::ClockRead {
                unix_ms: FAKE_NOW_MS
            }
        ]
    );
    assert!(interpreter.is_idle());
}

#[tokio::test]
async fn cancel_aborts_running_fetch() {
    let host = FakeHost::shared();
    host.hang_fetches();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let interpreter = Interpreter::new(Arc::clone(&host), tx);

    interpreter.dispatch(Cmd::FetchResource { id: id("75001") });
    assert_eq!(interpreter.outstanding(), 1);

    interpreter.dispatch(Cmd::CancelFetch { id: id("75001") });
    assert_eq!(
        within(rx.recv()).await,
        Some(PostIntent::FetchCancelled { id: id("75001") })
    );

    within(interpreter.idle()).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn cancel_unknown_fetch_is_silent() {
    let host = FakeHost::shared();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let interpreter = Interpreter::new(host, tx);

    interpreter.dispatch(Cmd::CancelFetch { id: id("75001") });
    assert!(interpreter.is_idle());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn abort_all_drops_outstanding_work() {
    let host = FakeHost::shared();
    host.hang_fetches();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let interpreter = Interpreter::new(Arc::clone(&host), tx);

    interpreter.dispatch(Cmd::batch([
        Cmd::FetchResource { id: id("a") },
        Cmd::FetchResource { id: id("b") },
    ]));
    assert_eq!(interpreter.outstanding(), 2);

    interpreter.abort_all();
    within(interpreter.idle()).await;
    assert!(rx.try_recv().is_err());
}
