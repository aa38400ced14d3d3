//! The impure boundary: turns [`Cmd`] values into host operations.
//!
//! [`perform`] is the single mapping from a command to the host primitive
//! it runs and the [`PostIntent`] its outcome becomes. [`Interpreter`]
//! runs those mappings on tokio tasks, feeds the resulting intents back
//! into the runtime's queue, and keeps enough bookkeeping to cancel
//! running fetches and to tell when nothing is outstanding.

mod host;
mod live;

pub use host::{Host, HostError};
pub use live::LiveHost;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::post::{Cmd, PostIntent, ResourceId};

/// Sending half of the queue that feeds intents back to the reducer.
pub type Outbox = mpsc::UnboundedSender<PostIntent>;

/// Run one command against `host` and return the intents it produced.
///
/// Leaves yield at most one intent. `Batch` runs its leaves one after
/// another. `None` does nothing. `CancelFetch` needs the bookkeeping of a
/// running [`Interpreter`] and yields nothing here.
pub async fn perform<H: Host + ?Sized>(host: &H, cmd: Cmd) -> Vec<PostIntent> {
    let mut intents = Vec::new();
    for leaf in cmd.leaves() {
        intents.extend(perform_leaf(host, leaf).await);
    }
    intents
}

async fn perform_leaf<H: Host + ?Sized>(host: &H, cmd: Cmd) -> Option<PostIntent> {
    match cmd {
        Cmd::None | Cmd::Batch(_) | Cmd::CancelFetch { .. } => None,

        Cmd::FetchResource { id } => Some(match host.fetch_resource(&id).await {
            Ok(body) => PostIntent::ResourceFetched { id, body },
            Err(e) => PostIntent::ResourceFetchFailed {
                id,
                error: e.to_string(),
            },
        }),

        Cmd::RetryAfter { id, delay_ms } => {
            host.sleep(Duration::from_millis(delay_ms)).await;
            Some(PostIntent::RetryDue { id })
        }

        Cmd::GetTime => Some(PostIntent::ClockRead {
            unix_ms: host.now_ms(),
        }),

        Cmd::PersistPackage { id, body } => Some(match host.persist(&id, &body).await {
            Ok(()) => PostIntent::PackagePersisted { id },
            Err(e) => PostIntent::PersistFailed {
                id,
                error: e.to_string(),
            },
        }),

        Cmd::OrderBeer => Some(match host.order_beer().await {
            Ok(()) => PostIntent::BeerOrdered,
            Err(e) => PostIntent::BeerOrderFailed {
                error: e.to_string(),
            },
        }),
    }
}

#[derive(Default)]
struct Shared {
    /// Every running task.
    tasks: Mutex<HashMap<Uuid, AbortHandle>>,
    /// Running fetches by resource.
    fetches: Mutex<HashMap<ResourceId, Uuid>>,
    idle: Notify,
}

/// Removes a task from the bookkeeping when it finishes or is aborted.
struct TaskGuard {
    task_id: Uuid,
    shared: Arc<Shared>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let mut tasks = self.shared.tasks.lock();
        tasks.remove(&self.task_id);
        if tasks.is_empty() {
            self.shared.idle.notify_waiters();
        }
    }
}

/// Executes commands on tokio tasks and delivers their results.
pub struct Interpreter<H: Host> {
    host: Arc<H>,
    outbox: Outbox,
    shared: Arc<Shared>,
}

impl<H: Host> Interpreter<H> {
    pub fn new(host: Arc<H>, outbox: Outbox) -> Self {
        Self {
            host,
            outbox,
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Start every leaf of `cmd`, in order.
    ///
    /// Leaves run concurrently once started; their intents arrive in
    /// completion order. Must be called inside a tokio runtime.
    pub fn dispatch(&self, cmd: Cmd) {
        for leaf in cmd.leaves() {
            match leaf {
                Cmd::CancelFetch { id } => self.cancel_fetch(id),
                Cmd::FetchResource { id } => {
                    let task_id =
                        self.spawn(Cmd::FetchResource { id: id.clone() }, Some(id.clone()));
                    tracing::debug!(id = %id, task = %task_id, "Fetch started");
                }
                other => {
                    self.spawn(other, None);
                }
            }
        }
    }

    fn spawn(&self, cmd: Cmd, fetch: Option<ResourceId>) -> Uuid {
        let task_id = Uuid::new_v4();
        let host = Arc::clone(&self.host);
        let outbox = self.outbox.clone();
        let shared = Arc::clone(&self.shared);
        let kind = cmd.kind();
        // Owned by the future, so it also runs when the task is aborted
        // before its first poll.
        let guard = TaskGuard {
            task_id,
            shared: Arc::clone(&self.shared),
        };

        if let Some(id) = fetch {
            self.shared.fetches.lock().insert(id, task_id);
        }

        // Hold the task table while spawning so the task cannot finish
        // and unregister before it is registered.
        let mut tasks = self.shared.tasks.lock();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let intent = perform_leaf(&*host, cmd).await;

            if let Some(
                PostIntent::ResourceFetched { id, .. } | PostIntent::ResourceFetchFailed { id, .. },
            ) = &intent
            {
                let mut fetches = shared.fetches.lock();
                if fetches.get(id) == Some(&task_id) {
                    fetches.remove(id);
                }
            }

            if let Some(intent) = intent {
                if outbox.send(intent).is_err() {
                    tracing::warn!(kind, "Runtime queue closed, dropping effect result");
                }
            }
        });
        tasks.insert(task_id, handle.abort_handle());
        task_id
    }

    fn cancel_fetch(&self, id: ResourceId) {
        let Some(task_id) = self.shared.fetches.lock().remove(&id) else {
            tracing::debug!(id = %id, "Cancel requested for fetch that is not running");
            return;
        };
        let abort = self.shared.tasks.lock().get(&task_id).cloned();
        if let Some(abort) = abort {
            abort.abort();
        }
        tracing::info!(id = %id, task = %task_id, "Fetch cancelled");
        if self.outbox.send(PostIntent::FetchCancelled { id }).is_err() {
            tracing::warn!("Runtime queue closed, dropping cancellation");
        }
    }

    /// Number of tasks still running.
    pub fn outstanding(&self) -> usize {
        self.shared.tasks.lock().len()
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding() == 0
    }

    /// Resolves once no task is running.
    pub async fn idle(&self) {
        // Register with Notify before checking, otherwise a task finishing
        // in between would notify nobody.
        let notified = self.shared.idle.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_idle() {
            return;
        }
        notified.await;
    }

    /// Abort every running task. Aborted tasks deliver nothing.
    pub fn abort_all(&self) {
        self.shared.fetches.lock().clear();
        let handles: Vec<AbortHandle> = self.shared.tasks.lock().values().cloned().collect();
        for abort in &handles {
            abort.abort();
        }
        if !handles.is_empty() {
            tracing::info!(count = handles.len(), "Aborted outstanding effects");
        }
    }
}
