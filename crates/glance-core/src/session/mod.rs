//! The viewer session state machine.
//!
//! A [`Session`] owns one [`ViewList`], the active entry id, the per-entry
//! [`LoadState`] map and the session-wide UI flags. It is the only writer of
//! any of them: loads report back through a channel, external list changes
//! arrive as [`Mutation`]s, and both are applied by [`Session::pump`] or
//! [`Session::drain`] on the caller's task.
//!
//! A settlement is committed only when its ticket is still current and its
//! entry is still active, so rapid navigation can never let an older load
//! overwrite what the user is looking at now.

pub mod state;

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::config::settings::Config;
use crate::dispatch::Dispatcher;
use crate::error::{ActionError, ResolutionError};
use crate::event::{Event, EventBus, Mutation, MutationSender};
use crate::i18n::{fill, strings, Translate};
use crate::load::{LoadController, LoadHandle, LoadOutcome, LoadSettled, LoadState, LoadStates};
use crate::model::{FileEntry, FileId, ViewList};
use crate::nav::{cursor, FallbackPolicy, Resolution};
use crate::provider::{Download, EntryRef, FileProvider};
use crate::render::{RenderHandle, RendererRegistry};

pub use state::{Flags, Frame, LoadView, MenuItem, Notice, Phase};

/// What to open: a file in its directory, or an explicit list.
///
/// Deserialises from the host shape `{ path, list?, activeIndex? }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    pub path: String,
    #[serde(default)]
    pub list: Option<Vec<FileEntry>>,
    #[serde(default)]
    pub active_index: Option<usize>,
}

impl OpenRequest {
    /// Opens `path` among the other files of its directory.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Shows exactly `list` instead of listing a directory.
    pub fn with_list(self, list: Vec<FileEntry>) -> Self {
        Self {
            list: Some(list),
            ..self
        }
    }

    pub fn with_active_index(self, index: usize) -> Self {
        Self {
            active_index: Some(index),
            ..self
        }
    }
}

/// Collaborators a session is opened with.
#[derive(Clone)]
pub struct SessionContext {
    pub provider: Arc<dyn FileProvider>,
    pub registry: Arc<RendererRegistry>,
    pub config: Config,
    pub translator: Arc<dyn Translate>,
    pub events: EventBus,
}

/// What a dispatched action did.
#[derive(Debug)]
pub enum ActionOutcome {
    /// The new active entry, or `None` at a boundary.
    Navigated(Option<FileEntry>),
    /// Whether a new load was started.
    Retried(bool),
    Downloaded(Download),
    Deleted(FileId),
    /// The entry snapshot carrying the new etag.
    Saved(FileEntry),
    SidebarToggled(bool),
    MenuToggled(bool),
    Closed,
}

enum Inbound {
    Settled(LoadSettled),
    Mutation(Mutation),
}

/// One open viewer.
pub struct Session {
    list: ViewList,
    active: FileId,
    active_index: usize,
    phase: Phase,
    flags: Flags,
    notice: Option<Notice>,
    loads: LoadController,
    states: LoadStates,
    dispatcher: Dispatcher,
    registry: Arc<RendererRegistry>,
    translator: Arc<dyn Translate>,
    events: EventBus,
    fallback: FallbackPolicy,
    filter_unsupported: bool,
    settled_rx: mpsc::UnboundedReceiver<LoadSettled>,
    mutation_tx: MutationSender,
    mutation_rx: mpsc::UnboundedReceiver<Mutation>,
}

impl Session {
    /// Resolves the list and starts loading the active entry.
    ///
    /// The returned session is `Ready`; the active entry's load proceeds in
    /// the background.
    ///
    /// # Errors
    ///
    /// - [`ResolutionError::EmptyList`] if nothing viewable remains.
    /// - [`ResolutionError::Provider`] if the directory could not be listed.
    pub async fn open(request: OpenRequest, ctx: SessionContext) -> Result<Self, ResolutionError> {
        tracing::debug!(
            path = %request.path,
            explicit = request.list.is_some(),
            "opening session"
        );
        let (list, active) = resolve_list(&request, &ctx).await.map_err(|err| {
            tracing::warn!(path = %request.path, error = %err, "could not open viewer");
            err
        })?;

        let SessionContext {
            provider,
            registry,
            config,
            translator,
            events,
        } = ctx;
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        let active_index = list.position(active).unwrap_or(0);

        let mut session = Self {
            list,
            active,
            active_index,
            phase: Phase::Opening,
            flags: Flags {
                sidebar_open: config.viewer.sidebar_open,
                ..Flags::default()
            },
            notice: None,
            loads: LoadController::new(Arc::clone(&provider), config.load.timeout(), settled_tx),
            states: LoadStates::new(config.load.keep_loaded),
            dispatcher: Dispatcher::new(provider),
            registry,
            translator,
            events,
            fallback: config.viewer.fallback,
            filter_unsupported: config.viewer.filter_unsupported,
            settled_rx,
            mutation_tx,
            mutation_rx,
        };

        session.phase = Phase::Ready;
        tracing::info!(
            active = %active,
            index = active_index,
            len = session.list.len(),
            "viewer opened"
        );
        session.events.emit(Event::Opened {
            active,
            index: active_index,
            len: session.list.len(),
        });
        if let Some(entry) = session.list.get(active_index).cloned() {
            session.activate(&entry);
        }
        Ok(session)
    }

    // --- Accessors ---

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    pub fn list(&self) -> &ViewList {
        &self.list
    }

    pub fn active(&self) -> FileId {
        self.active
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_entry(&self) -> Option<&FileEntry> {
        self.list.find(self.active)
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn state(&self, id: FileId) -> &LoadState {
        self.states.get(id)
    }

    /// Handle of the active entry's running load, for hosts that want to await it.
    pub fn active_load(&self) -> Option<LoadHandle> {
        self.loads.handle(self.active)
    }

    /// A sender for publishing external list changes into this session.
    pub fn mutations(&self) -> MutationSender {
        self.mutation_tx.clone()
    }

    /// Takes the notice left by the last failed action.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    // --- Navigation ---

    /// Moves to the next entry. Returns `None` at the last entry.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<FileEntry> {
        if self.is_closed() {
            return None;
        }
        let target = cursor::next(&self.list, self.active)?.clone();
        self.navigate(&target);
        Some(target)
    }

    /// Moves to the previous entry. Returns `None` at the first entry.
    pub fn prev(&mut self) -> Option<FileEntry> {
        if self.is_closed() {
            return None;
        }
        let target = cursor::prev(&self.list, self.active)?.clone();
        self.navigate(&target);
        Some(target)
    }

    /// Makes `id` active. Re-selecting an entry whose load failed retries it.
    pub fn jump_to(&mut self, id: FileId) -> Option<FileEntry> {
        if self.is_closed() {
            return None;
        }
        let target = self.list.find(id)?.clone();
        self.navigate(&target);
        Some(target)
    }

    /// Reloads the active entry if its load failed (or never started).
    pub fn retry(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        let Some(entry) = self.active_entry().cloned() else {
            return false;
        };
        let retryable = match self.states.get(entry.id()) {
            LoadState::Pending | LoadState::Failed(_) => true,
            LoadState::Loading => !self.loads.in_flight(entry.id()),
            LoadState::Loaded(_) | LoadState::Unsupported => false,
        };
        if retryable {
            tracing::info!(id = %entry.id(), "retrying load");
            self.reload(&entry);
        }
        retryable
    }

    fn navigate(&mut self, target: &FileEntry) {
        let from = self.active;
        let to = target.id();
        self.phase = Phase::Navigating;
        if from != to {
            self.leave(from);
        }
        self.active = to;
        self.active_index = self.list.position(to).unwrap_or(0);
        self.activate(target);
        self.phase = Phase::Ready;
        if from != to {
            tracing::debug!(%from, %to, index = self.active_index, "navigated");
            self.events.emit(Event::Navigated {
                from,
                to,
                index: self.active_index,
            });
        }
    }

    fn leave(&mut self, id: FileId) {
        self.loads.cancel(id);
        if matches!(self.states.get(id), LoadState::Loading) {
            self.set_state(id, LoadState::Pending);
        }
        if self.flags.unsaved_changes {
            tracing::warn!(%id, "discarding unsaved changes");
            self.flags.unsaved_changes = false;
        }
        if let Some(renderer) = self.list.find(id).and_then(|e| self.registry.find(e.mime())) {
            renderer.clear_pending_changes(id);
        }
        self.flags.menu_open = false;
    }

    fn activate(&mut self, entry: &FileEntry) {
        let id = entry.id();
        let state = self.states.get(id);
        let loaded = matches!(state, LoadState::Loaded(_));
        let failed = matches!(state, LoadState::Failed(_));
        let settled_elsewhere = matches!(state, LoadState::Unsupported)
            || (matches!(state, LoadState::Loading) && self.loads.in_flight(id));

        if loaded {
            self.states.touch(id);
        } else if failed {
            tracing::info!(%id, "re-selected failed entry, retrying");
            self.start_load(entry);
        } else if !settled_elsewhere {
            self.start_load(entry);
        }
    }

    fn start_load(&mut self, entry: &FileEntry) {
        let id = entry.id();
        match self.registry.find(entry.mime()) {
            Some(renderer) => {
                let _ = self.loads.request(entry, renderer);
                self.set_state(id, LoadState::Loading);
            }
            None => {
                tracing::debug!(%id, mime = entry.mime(), "no renderer for entry");
                self.set_state(id, LoadState::Unsupported);
            }
        }
    }

    fn reload(&mut self, entry: &FileEntry) {
        self.loads.cancel(entry.id());
        self.drop_state(entry.id());
        self.start_load(entry);
    }

    fn set_state(&mut self, id: FileId, state: LoadState) {
        if let Some((evicted, handle)) = self.states.set(id, state.clone()) {
            tracing::debug!(%evicted, "releasing least recently viewed payload");
            self.unmount(&handle);
            self.events.emit(Event::LoadStateChanged {
                id: evicted,
                state: LoadState::Pending,
            });
        }
        self.events.emit(Event::LoadStateChanged { id, state });
    }

    /// Forgets the state of `id`, unmounting its payload.
    fn drop_state(&mut self, id: FileId) {
        if let Some(LoadState::Loaded(handle)) = self.states.remove(id) {
            self.unmount(&handle);
        }
    }

    fn unmount(&self, handle: &RenderHandle) {
        let entry = handle.entry();
        if let Some(renderer) = self.registry.find(entry.mime()) {
            renderer.unmount(entry.id());
        }
    }

    // --- Inbound messages ---

    /// Waits for the next load settlement or mutation and applies it.
    ///
    /// Returns `false` once the session is closed. Waits indefinitely when
    /// nothing is loading and no mutation arrives.
    pub async fn pump(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        let inbound = tokio::select! {
            biased;
            Some(settled) = self.settled_rx.recv() => Inbound::Settled(settled),
            Some(mutation) = self.mutation_rx.recv() => Inbound::Mutation(mutation),
            else => return false,
        };
        self.apply(inbound);
        true
    }

    /// Applies every message already queued without waiting. Returns how many.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while !self.is_closed() {
            let inbound = if let Ok(settled) = self.settled_rx.try_recv() {
                Inbound::Settled(settled)
            } else if let Ok(mutation) = self.mutation_rx.try_recv() {
                Inbound::Mutation(mutation)
            } else {
                break;
            };
            self.apply(inbound);
            applied += 1;
        }
        applied
    }

    /// Pumps until the active entry's current load has been applied.
    pub async fn settle(&mut self) {
        while !self.is_closed() && self.loads.is_tracked(self.active) {
            if !self.pump().await {
                break;
            }
        }
    }

    fn apply(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Settled(settled) => self.apply_settled(settled),
            Inbound::Mutation(mutation) => self.apply_mutation(mutation),
        }
    }

    fn apply_settled(&mut self, settled: LoadSettled) {
        let LoadSettled { id, ticket, outcome } = settled;
        let current = self.loads.finish(id, ticket);
        if !current || id != self.active {
            tracing::debug!(%id, ticket, "discarding stale load");
            if let LoadOutcome::Loaded(handle) = &outcome {
                // Renderers release by id: a newer load or committed payload owns it now.
                let owned = self.loads.is_tracked(id)
                    || matches!(self.states.get(id), LoadState::Loaded(_));
                if !owned {
                    self.unmount(handle);
                }
            }
            if current {
                self.set_state(id, LoadState::Pending);
            }
            return;
        }
        match outcome {
            LoadOutcome::Loaded(handle) => {
                tracing::debug!(%id, renderer = handle.renderer(), "entry loaded");
                self.set_state(id, LoadState::Loaded(handle));
            }
            LoadOutcome::Failed(error) => {
                tracing::warn!(%id, %error, "entry failed to load");
                self.set_state(id, LoadState::Failed(error));
            }
            LoadOutcome::Cancelled => self.set_state(id, LoadState::Pending),
        }
    }

    fn apply_mutation(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Removed(id) => self.remove_entry(id),
            Mutation::Updated(entry) => self.update_entry(entry),
            Mutation::Added(entry) => self.add_entry(entry),
        }
    }

    /// Removes `id` and, if it was active, moves to the fallback entry.
    fn remove_entry(&mut self, id: FileId) {
        let Some(index) = self.list.remove(id) else {
            tracing::debug!(%id, "ignoring removal of unknown entry");
            return;
        };
        self.loads.cancel(id);
        self.drop_state(id);
        self.events.emit(Event::EntryRemoved(id));

        if id != self.active {
            self.active_index = self.list.position(self.active).unwrap_or(0);
            return;
        }

        self.flags.unsaved_changes = false;
        self.flags.menu_open = false;
        match cursor::resolve(&self.list, self.active, index, self.fallback) {
            Resolution::Empty => {
                tracing::info!(%id, "last entry removed");
                self.close();
            }
            Resolution::Fallback(next) | Resolution::Unchanged(next) => {
                if let Some(target) = self.list.get(next).cloned() {
                    tracing::debug!(removed = %id, to = %target.id(), "active entry removed");
                    self.navigate(&target);
                }
            }
        }
    }

    fn update_entry(&mut self, entry: FileEntry) {
        let id = entry.id();
        let Some(previous) = self.list.replace(entry.clone()) else {
            tracing::debug!(%id, "ignoring update of unknown entry");
            return;
        };
        self.events.emit(Event::EntryUpdated(entry.clone()));

        let content_changed = previous.etag() != entry.etag() || previous.mime() != entry.mime();
        if !content_changed {
            return;
        }
        if id != self.active {
            self.loads.cancel(id);
            self.drop_state(id);
        } else if self.flags.unsaved_changes {
            tracing::warn!(%id, "entry changed while editing; saving will conflict");
        } else {
            tracing::debug!(%id, etag = entry.etag(), "active entry changed, reloading");
            self.reload(&entry);
        }
    }

    fn add_entry(&mut self, entry: FileEntry) {
        let id = entry.id();
        if self.filter_unsupported && !self.registry.supports(entry.mime()) {
            tracing::debug!(%id, mime = entry.mime(), "ignoring addition without renderer");
            return;
        }
        if self.list.push(entry) {
            tracing::debug!(%id, len = self.list.len(), "entry added");
        } else {
            tracing::debug!(%id, "ignoring addition");
        }
    }

    // --- Actions ---

    /// Runs `action` on the active entry.
    ///
    /// Failures are also recorded as a [`Notice`] and emitted as
    /// [`Event::ActionFailed`]; the session stays `Ready` and unchanged.
    pub async fn dispatch(&mut self, action: Action) -> Result<ActionOutcome, ActionError> {
        if self.is_closed() {
            return Err(ActionError::SessionClosed);
        }
        let Some(entry) = self.active_entry().cloned() else {
            return Err(ActionError::SessionClosed);
        };
        if let Err(error) = self.dispatcher.check(action, &entry) {
            return Err(self.fail(action, &entry, error));
        }
        match action {
            Action::Next => Ok(ActionOutcome::Navigated(self.next())),
            Action::Previous => Ok(ActionOutcome::Navigated(self.prev())),
            Action::Close => {
                self.close();
                Ok(ActionOutcome::Closed)
            }
            Action::Retry => Ok(ActionOutcome::Retried(self.retry())),
            Action::ToggleSidebar => Ok(ActionOutcome::SidebarToggled(self.toggle_sidebar())),
            Action::ToggleMenu => Ok(ActionOutcome::MenuToggled(self.toggle_menu())),
            Action::Download => self.download(entry).await,
            Action::Delete => self.delete(entry).await,
            Action::Save => self.save(entry).await,
        }
    }

    async fn download(&mut self, entry: FileEntry) -> Result<ActionOutcome, ActionError> {
        self.begin(Action::Download, &entry);
        let result = self.dispatcher.download(&entry).await;
        self.phase = Phase::Ready;
        match result {
            Ok(download) => Ok(ActionOutcome::Downloaded(download)),
            Err(error) => Err(self.fail(Action::Download, &entry, error)),
        }
    }

    async fn delete(&mut self, entry: FileEntry) -> Result<ActionOutcome, ActionError> {
        self.begin(Action::Delete, &entry);
        let result = self.dispatcher.delete(&entry).await;
        self.phase = Phase::Ready;
        match result {
            Ok(()) => {
                self.remove_entry(entry.id());
                Ok(ActionOutcome::Deleted(entry.id()))
            }
            Err(error) => Err(self.fail(Action::Delete, &entry, error)),
        }
    }

    async fn save(&mut self, entry: FileEntry) -> Result<ActionOutcome, ActionError> {
        let renderer = match self.registry.find(entry.mime()) {
            Some(renderer) if renderer.editable() => renderer,
            _ => {
                let error = ActionError::Unavailable("entry is not editable".to_string());
                return Err(self.fail(Action::Save, &entry, error));
            }
        };
        let Some(payload) = renderer.pending_changes(&entry) else {
            return Err(self.fail(Action::Save, &entry, ActionError::NothingToSave));
        };

        self.begin(Action::Save, &entry);
        let result = self.dispatcher.save(&entry, payload).await;
        self.phase = Phase::Ready;
        match result {
            Ok(saved) => {
                self.list.replace(saved.clone());
                renderer.clear_pending_changes(saved.id());
                self.flags.unsaved_changes = false;
                self.events.emit(Event::EntryUpdated(saved.clone()));
                Ok(ActionOutcome::Saved(saved))
            }
            Err(error) => Err(self.fail(Action::Save, &entry, error)),
        }
    }

    fn begin(&mut self, action: Action, entry: &FileEntry) {
        tracing::debug!(?action, id = %entry.id(), "action started");
        self.phase = Phase::ActionPending(action);
        self.notice = None;
        self.events.emit(Event::ActionStarted {
            action,
            id: entry.id(),
        });
    }

    fn fail(&mut self, action: Action, entry: &FileEntry, error: ActionError) -> ActionError {
        tracing::warn!(?action, id = %entry.id(), %error, "action failed");
        let label = self
            .dispatcher
            .actions()
            .descriptor_for(action)
            .map_or("", |descriptor| descriptor.label);
        let action_label = self.translator.translate(label).into_owned();
        let reason = error.to_string();
        let message = fill(
            &self.translator.translate(strings::ACTION_FAILED),
            &[("action", action_label.as_str()), ("reason", reason.as_str())],
        );
        self.notice = Some(Notice { action, message });
        self.events.emit(Event::ActionFailed {
            action,
            id: entry.id(),
            error: error.clone(),
        });
        error
    }

    // --- UI flags ---

    pub fn toggle_sidebar(&mut self) -> bool {
        self.flags.sidebar_open = !self.flags.sidebar_open;
        self.flags.sidebar_open
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.flags.menu_open = !self.flags.menu_open;
        self.flags.menu_open
    }

    /// Marks whether the active entry's editor holds unsaved changes.
    pub fn set_unsaved(&mut self, unsaved: bool) {
        self.flags.unsaved_changes = unsaved;
    }

    // --- Lifecycle ---

    /// Cancels every load, unmounts every payload, and ends the session.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.loads.cancel_all();
        for (_, handle) in self.states.clear() {
            self.unmount(&handle);
        }
        if self.flags.unsaved_changes {
            tracing::warn!(id = %self.active, "discarding unsaved changes");
        }
        if let Some(renderer) = self
            .active_entry()
            .and_then(|entry| self.registry.find(entry.mime()))
        {
            renderer.clear_pending_changes(self.active);
        }
        self.phase = Phase::Closed;
        self.flags = Flags::default();
        self.notice = None;
        tracing::info!(len = self.list.len(), "viewer closed");
        self.events.emit(Event::Closed);
    }

    /// View model of the modal, or `None` once closed.
    pub fn frame(&self) -> Option<Frame> {
        if self.is_closed() {
            return None;
        }
        let entry = self.active_entry()?.clone();
        let bounds = cursor::bounds(&self.list, self.active);
        let load = match self.states.get(self.active) {
            LoadState::Pending | LoadState::Loading => LoadView::Loading,
            LoadState::Loaded(handle) => LoadView::Loaded(handle.clone()),
            LoadState::Failed(_) => LoadView::Error {
                message: fill(
                    &self.translator.translate(strings::ERROR_LOADING),
                    &[("name", entry.basename())],
                ),
            },
            LoadState::Unsupported => LoadView::Unsupported {
                message: self.translator.translate(strings::NO_PLUGIN).into_owned(),
            },
        };
        let editable = self
            .registry
            .find(entry.mime())
            .is_some_and(|renderer| renderer.editable());
        let menu = self
            .dispatcher
            .actions()
            .menu_for(&entry)
            .into_iter()
            .filter(|descriptor| descriptor.action != Action::Save || editable)
            .map(|descriptor| MenuItem {
                action: descriptor.action,
                id: descriptor.id,
                label: self.translator.translate(descriptor.label).into_owned(),
            })
            .collect();

        Some(Frame {
            title: entry.basename().to_string(),
            index: self.active_index,
            len: self.list.len(),
            has_prev: bounds.has_prev,
            has_next: bounds.has_next,
            load,
            menu,
            flags: self.flags,
            notice: self.notice.clone(),
            entry,
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("active", &self.active)
            .field("active_index", &self.active_index)
            .field("len", &self.list.len())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

async fn resolve_list(
    request: &OpenRequest,
    ctx: &SessionContext,
) -> Result<(ViewList, FileId), ResolutionError> {
    if let Some(entries) = &request.list {
        let list = ViewList::explicit(entries.clone());
        let first = list.get(0).ok_or(ResolutionError::EmptyList)?;
        let active = request
            .active_index
            .and_then(|index| list.get(index))
            .or_else(|| list.entries().iter().find(|e| e.path() == request.path))
            .unwrap_or(first)
            .id();
        return Ok((list, active));
    }

    let opened = ctx
        .provider
        .get_entry(&EntryRef::Path(request.path.clone()))
        .await?;
    let directory = if opened.is_directory() {
        opened.path().to_string()
    } else {
        opened.parent_path().to_string()
    };
    let listing = ctx.provider.list_directory(&directory).await?;
    let mut entries: Vec<FileEntry> = listing
        .into_iter()
        .filter(|entry| {
            entry.id() == opened.id()
                || !ctx.config.viewer.filter_unsupported
                || ctx.registry.supports(entry.mime())
        })
        .collect();
    if !opened.is_directory() && !entries.iter().any(|e| e.id() == opened.id()) {
        entries.push(opened.clone());
    }

    let list = ViewList::directory(directory, entries);
    let active = if opened.is_directory() {
        list.get(0).map(FileEntry::id)
    } else {
        Some(opened.id())
    };
    match active {
        Some(id) if list.contains(id) => Ok((list, id)),
        _ => Err(ResolutionError::EmptyList),
    }
}
