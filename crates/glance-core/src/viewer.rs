//! Host embedding API.
//!
//! A [`Viewer`] is the single slot for the active session: opening a new
//! session closes the previous one first, and a session that closes itself
//! (its last entry deleted) is released from the slot.

use std::sync::Arc;

use crate::action::Action;
use crate::config::keymap::Keymap;
use crate::config::settings::Config;
use crate::error::{ActionError, ResolutionError};
use crate::event::{Event, EventBus, EventKind, SubscriptionId};
use crate::i18n::{Identity, Translate};
use crate::provider::FileProvider;
use crate::render::RendererRegistry;
use crate::session::{ActionOutcome, OpenRequest, Session, SessionContext};

pub struct Viewer {
    provider: Arc<dyn FileProvider>,
    registry: Arc<RendererRegistry>,
    config: Config,
    keymap: Keymap,
    translator: Arc<dyn Translate>,
    events: EventBus,
    session: Option<Session>,
}

impl Viewer {
    pub fn new(provider: Arc<dyn FileProvider>, registry: RendererRegistry, config: Config) -> Self {
        Self {
            provider,
            registry: Arc::new(registry),
            config,
            keymap: Keymap::default(),
            translator: Arc::new(Identity),
            events: EventBus::new(),
            session: None,
        }
    }

    /// Formats user-facing strings through `translator` instead of English.
    pub fn with_translator(self, translator: impl Translate + 'static) -> Self {
        Self {
            translator: Arc::new(translator),
            ..self
        }
    }

    pub fn with_keymap(self, keymap: Keymap) -> Self {
        Self { keymap, ..self }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn translator(&self) -> &dyn Translate {
        self.translator.as_ref()
    }

    /// Subscribes to events of `kind` from this and every later session.
    pub fn on(
        &self,
        kind: EventKind,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.events.on(kind, handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.events.off(id)
    }

    /// Opens a session, closing the current one first.
    ///
    /// A resolution failure is also emitted as [`Event::Error`]; the slot is
    /// then left empty.
    pub async fn open(&mut self, request: OpenRequest) -> Result<&mut Session, ResolutionError> {
        self.close();
        let ctx = SessionContext {
            provider: Arc::clone(&self.provider),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
            translator: Arc::clone(&self.translator),
            events: self.events.clone(),
        };
        match Session::open(request, ctx).await {
            Ok(session) => Ok(self.session.insert(session)),
            Err(err) => {
                self.events.emit(Event::Error(err.clone()));
                Err(err)
            }
        }
    }

    /// Closes the open session. Returns `false` if none was open.
    pub fn close(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) if !session.is_closed() => {
                session.close();
                true
            }
            _ => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session().is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref().filter(|session| !session.is_closed())
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.release_closed();
        self.session.as_mut()
    }

    /// Runs `action` on the open session.
    pub async fn dispatch(&mut self, action: Action) -> Result<ActionOutcome, ActionError> {
        let session = self.session_mut().ok_or(ActionError::SessionClosed)?;
        let result = session.dispatch(action).await;
        self.release_closed();
        result
    }

    /// Resolves `key` through the keymap and dispatches the bound action.
    ///
    /// Returns `None` for unbound keys.
    pub async fn handle_key(&mut self, key: &str) -> Option<Result<ActionOutcome, ActionError>> {
        let action = self.keymap.action_for_key(key)?;
        tracing::debug!(key, ?action, "key pressed");
        Some(self.dispatch(action).await)
    }

    fn release_closed(&mut self) {
        if self.session.as_ref().is_some_and(Session::is_closed) {
            tracing::debug!("releasing closed session");
            self.session = None;
        }
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("session", &self.session)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
