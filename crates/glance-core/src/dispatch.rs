//! Side-effecting actions against the file provider.
//!
//! Every call checks the entry's permissions first; a missing capability is
//! reported as [`ActionError::PermissionRequired`] and the provider is never
//! contacted. The dispatcher does not touch session state: the session
//! applies the outcome (removing a deleted entry, swapping in a saved one).

use std::sync::Arc;

use crate::action::{Action, ActionRegistry};
use crate::error::ActionError;
use crate::model::FileEntry;
use crate::provider::{Download, FileProvider};

pub struct Dispatcher {
    provider: Arc<dyn FileProvider>,
    actions: ActionRegistry,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn FileProvider>) -> Self {
        Self {
            provider,
            actions: ActionRegistry::new(),
        }
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Permission gate for `action` on `entry`.
    pub fn check(&self, action: Action, entry: &FileEntry) -> Result<(), ActionError> {
        let required = self
            .actions
            .descriptor_for(action)
            .and_then(|descriptor| descriptor.requires);
        match required {
            Some(permission) if !entry.can(permission) => Err(ActionError::PermissionRequired {
                action,
                permission,
                id: entry.id(),
            }),
            _ => Ok(()),
        }
    }

    pub async fn delete(&self, entry: &FileEntry) -> Result<(), ActionError> {
        self.check(Action::Delete, entry)?;
        self.provider.delete(entry.id()).await?;
        tracing::info!(id = %entry.id(), path = entry.path(), "entry deleted");
        Ok(())
    }

    pub async fn download(&self, entry: &FileEntry) -> Result<Download, ActionError> {
        self.check(Action::Download, entry)?;
        let stream = self.provider.download(entry.id()).await?;
        tracing::debug!(id = %entry.id(), "download started");
        Ok(Download {
            entry: entry.clone(),
            stream,
        })
    }

    /// Writes `payload` over `entry`, guarded by its etag.
    ///
    /// Returns the new snapshot of the entry carrying the provider's new etag.
    pub async fn save(&self, entry: &FileEntry, payload: Vec<u8>) -> Result<FileEntry, ActionError> {
        self.check(Action::Save, entry)?;
        let etag = self.provider.write(entry.id(), entry.etag(), payload).await?;
        tracing::info!(id = %entry.id(), %etag, "entry saved");
        Ok(entry.clone().with_etag(etag))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
