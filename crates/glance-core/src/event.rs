//! Event system between the viewer core and its host.
//!
//! The host publishes [`Mutation`]s about the file list (an entry deleted or
//! renamed in another view) into the session, and subscribes to [`Event`]s
//! the core emits as the session moves through its states. Mutations flow
//! **host → core**; events flow **core → host**.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::action::Action;
use crate::error::{ActionError, ResolutionError};
use crate::load::LoadState;
use crate::model::{FileEntry, FileId};

/// A change to the file list made outside the viewer.
///
/// The session is the only writer of its list; other components publish
/// these and the session applies them in order.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// The entry was deleted.
    Removed(FileId),
    /// A new snapshot of an existing entry (renamed, re-uploaded, permissions changed).
    Updated(FileEntry),
    /// A new file appeared in the listed directory.
    Added(FileEntry),
}

/// Sending half of a session's mutation channel.
pub type MutationSender = mpsc::UnboundedSender<Mutation>;

/// A notification the core sends to the host.
#[derive(Debug, Clone)]
pub enum Event {
    /// A session resolved its list and is ready.
    Opened {
        active: FileId,
        index: usize,
        len: usize,
    },
    /// The active entry changed.
    Navigated {
        from: FileId,
        to: FileId,
        index: usize,
    },
    /// The session ended.
    Closed,
    /// Opening failed; the session never became ready.
    Error(ResolutionError),
    LoadStateChanged {
        id: FileId,
        state: LoadState,
    },
    ActionStarted {
        action: Action,
        id: FileId,
    },
    ActionFailed {
        action: Action,
        id: FileId,
        error: ActionError,
    },
    /// An entry was replaced by a newer snapshot.
    EntryUpdated(FileEntry),
    /// An entry left the list.
    EntryRemoved(FileId),
}

/// Discriminant of [`Event`], used to subscribe to one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Opened,
    Navigated,
    Closed,
    Error,
    LoadStateChanged,
    ActionStarted,
    ActionFailed,
    EntryUpdated,
    EntryRemoved,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Opened { .. } => EventKind::Opened,
            Self::Navigated { .. } => EventKind::Navigated,
            Self::Closed => EventKind::Closed,
            Self::Error(_) => EventKind::Error,
            Self::LoadStateChanged { .. } => EventKind::LoadStateChanged,
            Self::ActionStarted { .. } => EventKind::ActionStarted,
            Self::ActionFailed { .. } => EventKind::ActionFailed,
            Self::EntryUpdated(_) => EventKind::EntryUpdated,
            Self::EntryRemoved(_) => EventKind::EntryRemoved,
        }
    }
}

/// Identifies one registered handler, for [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    list: Vec<Subscription>,
}

/// Cloneable fan-out of [`Event`]s to registered handlers.
///
/// Clones share one subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of `kind`.
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut subs = self.lock();
        subs.next_id += 1;
        let id = SubscriptionId(subs.next_id);
        subs.list.push(Subscription {
            id,
            kind,
            handler: Arc::new(handler),
        });
        id
    }

    /// Removes a handler. Returns `false` if it was not registered.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut subs = self.lock();
        let before = subs.list.len();
        subs.list.retain(|s| s.id != id);
        subs.list.len() != before
    }

    /// Calls every handler registered for the event's kind.
    ///
    /// Handlers run outside the lock, so they may subscribe or unsubscribe.
    pub fn emit(&self, event: Event) {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .lock()
            .list
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Arc::clone(&s.handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().list.len()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
