//! Per-entry load lifecycle.
//!
//! [`LoadController`] runs each load as a spawned task and reports the
//! result twice: to every holder of the shared [`LoadHandle`], and as a
//! [`LoadSettled`] message to the owning session. Only the session writes
//! [`LoadState`]; it commits a settlement only when the ticket is still the
//! current one for that entry, so a load cancelled by navigation can never
//! flash in late.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tokio::sync::{mpsc, oneshot};

use crate::error::LoadError;
use crate::model::{FileEntry, FileId};
use crate::provider::FileProvider;
use crate::render::{RenderHandle, Renderer};

/// Load status of one entry. Keyed by id, so it survives reordering.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loading,
    Loaded(RenderHandle),
    /// Terminal until the entry is explicitly retried.
    Failed(LoadError),
    /// No renderer handles this mime type; a placeholder is shown instead.
    Unsupported,
}

impl LoadState {
    /// `true` while the frame should show a loading indicator.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Pending | Self::Loading)
    }
}

/// How a single load ended.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(RenderHandle),
    Failed(LoadError),
    /// The load was aborted before it settled.
    Cancelled,
}

/// A settlement report sent to the session.
#[derive(Debug, Clone)]
pub struct LoadSettled {
    pub id: FileId,
    pub ticket: u64,
    pub outcome: LoadOutcome,
}

/// Awaitable, cloneable view of one in-flight load.
///
/// Every clone resolves to the same [`LoadOutcome`].
#[derive(Clone)]
pub struct LoadHandle {
    id: FileId,
    ticket: u64,
    outcome: Shared<BoxFuture<'static, LoadOutcome>>,
}

impl LoadHandle {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Future for LoadHandle {
    type Output = LoadOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.outcome).poll(cx)
    }
}

impl std::fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadHandle")
            .field("id", &self.id)
            .field("ticket", &self.ticket)
            .finish()
    }
}

struct InFlight {
    handle: LoadHandle,
    abort: AbortHandle,
    settled: Arc<AtomicBool>,
}

/// Starts, deduplicates and cancels entry loads.
pub struct LoadController {
    provider: Arc<dyn FileProvider>,
    in_flight: HashMap<FileId, InFlight>,
    next_ticket: u64,
    timeout: Option<Duration>,
    settled_tx: mpsc::UnboundedSender<LoadSettled>,
}

impl LoadController {
    pub fn new(
        provider: Arc<dyn FileProvider>,
        timeout: Option<Duration>,
        settled_tx: mpsc::UnboundedSender<LoadSettled>,
    ) -> Self {
        Self {
            provider,
            in_flight: HashMap::new(),
            next_ticket: 0,
            timeout,
            settled_tx,
        }
    }

    /// Starts loading `entry` with `renderer`.
    ///
    /// While a load for the same id is still running, its handle is returned
    /// instead of starting a second fetch.
    pub fn request(&mut self, entry: &FileEntry, renderer: Arc<dyn Renderer>) -> LoadHandle {
        let id = entry.id();
        if let Some(existing) = self.in_flight.get(&id) {
            if !existing.settled.load(Ordering::Acquire) {
                tracing::debug!(%id, ticket = existing.handle.ticket, "joining in-flight load");
                return existing.handle.clone();
            }
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let (abort, registration) = AbortHandle::new_pair();
        let (done_tx, done_rx) = oneshot::channel();
        let settled = Arc::new(AtomicBool::new(false));

        let task_entry = entry.clone();
        let provider = Arc::clone(&self.provider);
        let settled_tx = self.settled_tx.clone();
        let settled_flag = Arc::clone(&settled);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let load = async {
                let mount = renderer.mount(&task_entry, provider.as_ref());
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, mount)
                        .await
                        .unwrap_or(Err(LoadError::TimedOut)),
                    None => mount.await,
                }
            };
            let outcome = match Abortable::new(load, registration).await {
                Ok(Ok(handle)) => LoadOutcome::Loaded(handle),
                Ok(Err(err)) => LoadOutcome::Failed(err),
                Err(Aborted) => LoadOutcome::Cancelled,
            };
            settled_flag.store(true, Ordering::Release);
            let _ = done_tx.send(outcome.clone());
            let _ = settled_tx.send(LoadSettled {
                id: task_entry.id(),
                ticket,
                outcome,
            });
        });

        let outcome = done_rx
            .map(|received| {
                received.unwrap_or_else(|_| {
                    LoadOutcome::Failed(LoadError::Interrupted("load task dropped".to_string()))
                })
            })
            .boxed()
            .shared();
        let handle = LoadHandle {
            id,
            ticket,
            outcome,
        };
        tracing::debug!(%id, ticket, path = entry.path(), "load started");
        self.in_flight.insert(
            id,
            InFlight {
                handle: handle.clone(),
                abort,
                settled,
            },
        );
        handle
    }

    /// Aborts the load for `id`, if one is tracked. Its eventual settlement
    /// will no longer be current.
    pub fn cancel(&mut self, id: FileId) -> bool {
        match self.in_flight.remove(&id) {
            Some(flight) => {
                let was_running = !flight.settled.load(Ordering::Acquire);
                flight.abort.abort();
                if was_running {
                    tracing::debug!(%id, ticket = flight.handle.ticket, "load cancelled");
                }
                was_running
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        let ids: Vec<FileId> = self.in_flight.keys().copied().collect();
        for id in ids {
            self.cancel(id);
        }
    }

    /// `true` if `ticket` is the load currently tracked for `id`.
    pub fn is_current(&self, id: FileId, ticket: u64) -> bool {
        self.in_flight
            .get(&id)
            .is_some_and(|flight| flight.handle.ticket == ticket)
    }

    /// Stops tracking a settled load. Returns whether it was still current.
    pub fn finish(&mut self, id: FileId, ticket: u64) -> bool {
        if self.is_current(id, ticket) {
            self.in_flight.remove(&id);
            true
        } else {
            false
        }
    }

    /// Handle of the load tracked for `id`, if any.
    pub fn handle(&self, id: FileId) -> Option<LoadHandle> {
        self.in_flight.get(&id).map(|flight| flight.handle.clone())
    }

    /// `true` until the settlement of the load tracked for `id` has been
    /// [`finish`](Self::finish)ed or the load cancelled.
    pub fn is_tracked(&self, id: FileId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// `true` while a load for `id` is running.
    pub fn in_flight(&self, id: FileId) -> bool {
        self.in_flight
            .get(&id)
            .is_some_and(|flight| !flight.settled.load(Ordering::Acquire))
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .values()
            .filter(|flight| !flight.settled.load(Ordering::Acquire))
            .count()
    }
}

impl Drop for LoadController {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

static PENDING: LoadState = LoadState::Pending;

/// [`LoadState`] per entry id, retaining at most `capacity` loaded payloads.
pub struct LoadStates {
    states: HashMap<FileId, LoadState>,
    loaded: LruCache<FileId, ()>,
}

impl LoadStates {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            states: HashMap::new(),
            loaded: LruCache::new(capacity),
        }
    }

    /// State of `id`; entries never seen are `Pending`.
    pub fn get(&self, id: FileId) -> &LoadState {
        self.states.get(&id).unwrap_or(&PENDING)
    }

    /// Records a state. Returns a payload evicted to make room, whose entry
    /// is back to `Pending` and should be unmounted.
    pub fn set(&mut self, id: FileId, state: LoadState) -> Option<(FileId, RenderHandle)> {
        let loaded = matches!(state, LoadState::Loaded(_));
        self.states.insert(id, state);
        if !loaded {
            self.loaded.pop(&id);
            return None;
        }
        match self.loaded.push(id, ()) {
            Some((evicted, ())) if evicted != id => match self.states.insert(evicted, LoadState::Pending) {
                Some(LoadState::Loaded(handle)) => Some((evicted, handle)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Marks a loaded entry as most recently viewed.
    pub fn touch(&mut self, id: FileId) {
        self.loaded.promote(&id);
    }

    pub fn remove(&mut self, id: FileId) -> Option<LoadState> {
        self.loaded.pop(&id);
        self.states.remove(&id)
    }

    /// Drops every state, returning the loaded payloads for unmounting.
    pub fn clear(&mut self) -> Vec<(FileId, RenderHandle)> {
        self.loaded.clear();
        self.states
            .drain()
            .filter_map(|(id, state)| match state {
                LoadState::Loaded(handle) => Some((id, handle)),
                _ => None,
            })
            .collect()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{image, GatedRenderer, MemoryProvider};

    fn controller() -> (LoadController, mpsc::UnboundedReceiver<LoadSettled>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider: Arc<dyn FileProvider> = Arc::new(MemoryProvider::default());
        (LoadController::new(provider, None, tx), rx)
    }

    #[tokio::test]
    async fn duplicate_request_shares_one_fetch() {
        let (mut loads, mut settled) = controller();
        let renderer = Arc::new(GatedRenderer::new());
        let e = image(5, "five.jpg");
        renderer.hold(e.id());

        let first = loads.request(&e, renderer.clone());
        tokio::task::yield_now().await;
        let second = loads.request(&e, renderer.clone());
        assert_eq!(first.ticket(), second.ticket());
        assert!(loads.in_flight(e.id()));
        assert_eq!(loads.in_flight_count(), 1);

        renderer.release(e.id(), Ok(()));
        let (a, b) = tokio::join!(first, second);
        assert!(matches!(a, LoadOutcome::Loaded(_)));
        assert!(matches!(b, LoadOutcome::Loaded(_)));
        assert_eq!(renderer.mounts(e.id()), 1);

        let report = settled.recv().await.unwrap();
        assert_eq!(report.id, e.id());
        assert!(loads.finish(report.id, report.ticket));
        assert!(!loads.in_flight(e.id()));
    }

    #[tokio::test]
    async fn failure_reaches_every_holder() {
        let (mut loads, _settled) = controller();
        let renderer = Arc::new(GatedRenderer::new());
        let e = image(5, "five.jpg");
        renderer.hold(e.id());

        let first = loads.request(&e, renderer.clone());
        let second = loads.request(&e, renderer.clone());
        renderer.release(e.id(), Err(LoadError::Decode("bad".to_string())));

        let (a, b) = tokio::join!(first, second);
        assert!(matches!(a, LoadOutcome::Failed(LoadError::Decode(_))));
        assert!(matches!(b, LoadOutcome::Failed(LoadError::Decode(_))));
        assert_eq!(renderer.mounts(e.id()), 1);
    }

    #[tokio::test]
    async fn cancelled_load_is_no_longer_current() {
        let (mut loads, mut settled) = controller();
        let renderer = Arc::new(GatedRenderer::new());
        let e = image(1, "a.jpg");
        renderer.hold(e.id());

        let handle = loads.request(&e, renderer.clone());
        tokio::task::yield_now().await;
        assert!(loads.cancel(e.id()));
        assert!(!loads.is_current(e.id(), handle.ticket()));

        let report = settled.recv().await.unwrap();
        assert!(matches!(report.outcome, LoadOutcome::Cancelled));
        assert!(!loads.finish(report.id, report.ticket));
        assert!(matches!(handle.await, LoadOutcome::Cancelled));
    }

    #[tokio::test]
    async fn request_after_settlement_starts_new_ticket() {
        let (mut loads, mut settled) = controller();
        let renderer = Arc::new(GatedRenderer::new());
        let e = image(2, "b.jpg");

        let first = loads.request(&e, renderer.clone());
        let first_ticket = first.ticket();
        first.await;
        settled.recv().await.unwrap();

        let second = loads.request(&e, renderer.clone());
        assert_ne!(second.ticket(), first_ticket);
        second.await;
        assert_eq!(renderer.mounts(e.id()), 2);
    }

    #[tokio::test]
    async fn timeout_fails_the_load() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let provider: Arc<dyn FileProvider> = Arc::new(MemoryProvider::default());
        let mut loads = LoadController::new(provider, Some(Duration::from_millis(10)), tx);
        let renderer = Arc::new(GatedRenderer::new());
        let e = image(3, "slow.jpg");
        renderer.hold(e.id());

        let outcome = loads.request(&e, renderer).await;
        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::TimedOut)));
    }

    #[test]
    fn states_default_to_pending() {
        let states = LoadStates::new(2);
        assert!(matches!(states.get(FileId(1)), LoadState::Pending));
        assert!(states.get(FileId(1)).is_busy());
    }

    #[test]
    fn states_evict_least_recent_payload() {
        let mut states = LoadStates::new(2);
        let loaded = |id: u64| LoadState::Loaded(RenderHandle::new("t", image(id, "x.jpg"), ()));

        assert!(states.set(FileId(1), loaded(1)).is_none());
        assert!(states.set(FileId(2), loaded(2)).is_none());
        states.touch(FileId(1));
        let (evicted, _) = states.set(FileId(3), loaded(3)).unwrap();

        assert_eq!(evicted, FileId(2));
        assert!(matches!(states.get(FileId(2)), LoadState::Pending));
        assert!(matches!(states.get(FileId(1)), LoadState::Loaded(_)));
        assert_eq!(states.loaded_count(), 2);
    }

    #[test]
    fn reloading_same_id_does_not_evict_it() {
        let mut states = LoadStates::new(1);
        let loaded = |id: u64| LoadState::Loaded(RenderHandle::new("t", image(id, "x.jpg"), ()));
        states.set(FileId(1), loaded(1));
        assert!(states.set(FileId(1), loaded(1)).is_none());
        assert!(matches!(states.get(FileId(1)), LoadState::Loaded(_)));
    }

    #[test]
    fn failed_state_leaves_lru() {
        let mut states = LoadStates::new(2);
        states.set(
            FileId(1),
            LoadState::Loaded(RenderHandle::new("t", image(1, "x.jpg"), ())),
        );
        states.set(FileId(1), LoadState::Failed(LoadError::TimedOut));
        assert_eq!(states.loaded_count(), 0);
        assert!(states.clear().is_empty());
    }
}
