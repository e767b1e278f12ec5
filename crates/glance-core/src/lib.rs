//! Glance core library: UI-agnostic media viewer logic.
//!
//! `glance-core` implements the viewer that sits on top of a file listing:
//! it resolves the list of files to show, keeps a cursor on the active one,
//! loads it through a pluggable renderer, and runs contextual actions
//! against a storage backend. Nothing here draws pixels; a host renders the
//! [`Frame`](session::Frame) view model however it likes.
//!
//! # Modules
//!
//! - [`model`]: [`FileEntry`] snapshots and the [`ViewList`] they are shown from.
//! - [`nav`]: Navigation cursor with next/previous targets and fallback after removal.
//! - [`render`]: The [`Renderer`](render::Renderer) trait, mime-pattern registry, built-in image and text renderers.
//! - [`load`]: Per-entry load lifecycle with deduplication and cancellation.
//! - [`session`]: The viewer state machine.
//! - [`viewer`]: Host embedding API with a single session slot, events, key handling.
//! - [`dispatch`]: Permission-gated side effects (delete, download, save).
//! - [`provider`]: The [`FileProvider`](provider::FileProvider) seam and a local-disk implementation.
//! - [`event`]: Outbound events and inbound list mutations.
//! - [`i18n`]: Pluggable translation of user-facing strings.
//! - [`config`]: TOML settings and key bindings.
//! - [`error`]: Error types.

pub mod action;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod i18n;
pub mod load;
pub mod model;
pub mod nav;
pub mod provider;
pub mod render;
pub mod session;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_support;

pub use action::{Action, ActionCategory, ActionDescriptor, ActionRegistry};
pub use config::keymap::Keymap;
pub use config::settings::Config;
pub use error::{ActionError, CoreError, CoreResult, LoadError, ProviderError, ResolutionError};
pub use event::{Event, EventBus, EventKind, Mutation, MutationSender, SubscriptionId};
pub use i18n::{Catalog, Identity, Translate};
pub use load::{LoadHandle, LoadOutcome, LoadState};
pub use model::{FileEntry, FileId, Permission, Permissions, Provenance, ViewList};
pub use nav::FallbackPolicy;
pub use provider::{FileProvider, LocalProvider};
pub use render::{RenderHandle, Renderer, RendererRegistry};
pub use session::{ActionOutcome, Frame, LoadView, OpenRequest, Phase, Session};
pub use viewer::Viewer;
