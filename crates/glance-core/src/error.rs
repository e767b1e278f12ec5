//! Error types for `glance-core`.
//!
//! Configuration and I/O failures surface as [`CoreError`]. The viewer
//! itself distinguishes four failure scopes, each with its own type:
//!
//! - [`ProviderError`]: what a [`FileProvider`](crate::provider::FileProvider) call can fail with.
//! - [`ResolutionError`]: the list could not be resolved while opening; fatal to the session.
//! - [`LoadError`]: one entry failed to load; shown inline, terminal until retried.
//! - [`ActionError`]: a menu action failed or was refused; the session stays `Ready`.

use std::path::PathBuf;

use crate::action::Action;
use crate::model::entry::{FileId, Permission};

/// Unified error type for configuration and local I/O.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Failed to parse a configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used for configuration and catalog loading.
pub type CoreResult<T> = Result<T, CoreError>;

/// Failures reported by a file provider.
///
/// `Clone` so that one outcome can be handed to every caller sharing a load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("network error: {0}")]
    Network(String),

    /// The entry changed since it was read (etag mismatch on write).
    #[error("conflict: expected etag {expected}, found {actual}")]
    Conflict { expected: String, actual: String },
}

/// The viewer could not resolve a list to show.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolutionError {
    /// The explicit list, or the directory listing, contained nothing viewable.
    #[error("nothing to display")]
    EmptyList,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// One entry failed to load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The content was fetched but the renderer could not decode it.
    #[error("decode error: {0}")]
    Decode(String),

    /// The configured load timeout elapsed.
    #[error("load timed out")]
    TimedOut,

    /// The load task ended without reporting (runtime shut down or task panicked).
    #[error("load interrupted: {0}")]
    Interrupted(String),
}

/// A menu action failed or was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The entry's permission set lacks the capability the action requires.
    /// The provider was not contacted.
    #[error("{action:?} requires {permission:?} permission on entry {id}")]
    PermissionRequired {
        action: Action,
        permission: Permission,
        id: FileId,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Save was requested but the renderer holds no pending changes.
    #[error("no pending changes to save")]
    NothingToSave,

    /// The action is not applicable right now (e.g. another action is running).
    #[error("action unavailable: {0}")]
    Unavailable(String),

    #[error("session is closed")]
    SessionClosed,
}
