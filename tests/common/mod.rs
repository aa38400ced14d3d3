//! Shared test utilities and fake host.

#![allow(dead_code, unused_imports)]

pub mod mock_server;

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use postbox::interpreter::{Host, HostError};
use postbox::post::{PostIntent, ResourceId};
use postbox::runtime::{RunOutcome, Runtime};
use postbox::shutdown::ShutdownHandle;

pub const FAKE_NOW_MS: u64 = 1_700_000_000_000;

/// Scriptable in-memory host.
///
/// Fetches answer from a per-resource queue of scripted outcomes; an
/// empty queue answers `"package <id>"`.
#[derive(Default)]
pub struct FakeHost {
    fetches: Mutex<HashMap<ResourceId, VecDeque<Result<String, String>>>>,
    stored: Mutex<Vec<(ResourceId, String)>>,
    calls: Mutex<Vec<String>>,
    sleeps: Mutex<Vec<Duration>>,
    beer_fails: AtomicBool,
    persist_fails: AtomicBool,
    hang_fetches: AtomicBool,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue the next outcomes for fetches of `id`, in order.
    pub fn script_fetch(&self, id: &str, outcomes: Vec<Result<&str, &str>>) {
        self.fetches
            .lock()
            .entry(ResourceId::from(id))
            .or_default()
            .extend(
                outcomes
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string)),
            );
    }

    pub fn fail_beer(&self) {
        self.beer_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_persist(&self) {
        self.persist_fails.store(true, Ordering::SeqCst);
    }

    /// Make every fetch wait forever (until aborted).
    pub fn hang_fetches(&self) {
        self.hang_fetches.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn stored(&self) -> Vec<(ResourceId, String)> {
        self.stored.lock().clone()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Host for FakeHost {
    async fn fetch_resource(&self, id: &ResourceId) -> Result<String, HostError> {
        self.record(format!("fetch {}", id));
        if self.hang_fetches.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let scripted = self.fetches.lock().get_mut(id).and_then(VecDeque::pop_front);
        match scripted {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(HostError::Connection(message)),
            None => Ok(format!("package {}", id)),
        }
    }

    async fn order_beer(&self) -> Result<(), HostError> {
        self.record("beer".to_string());
        if self.beer_fails.load(Ordering::SeqCst) {
            return Err(HostError::Status {
                status: 503,
                message: "bar closed".to_string(),
            });
        }
        Ok(())
    }

    async fn persist(&self, id: &ResourceId, body: &str) -> Result<(), HostError> {
        self.record(format!("persist {}", id));
        if self.persist_fails.load(Ordering::SeqCst) {
            return Err(HostError::Storage(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        self.stored.lock().push((id.clone(), body.to_string()));
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        FAKE_NOW_MS
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Feed `intents` into `runtime` and run it until it drains.
pub async fn run_to_completion(runtime: Runtime<FakeHost>, intents: Vec<PostIntent>) -> RunOutcome {
    let (tx, rx) = mpsc::channel(intents.len().max(1));
    for intent in intents {
        tx.send(intent).await.expect("queue has room");
    }
    drop(tx);

    within(runtime.run(rx, ShutdownHandle::new())).await
}

/// Await `fut` with a timeout so a hung test fails instead of blocking.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out")
}
