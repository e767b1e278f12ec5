//! Pluggable renderers.
//!
//! The viewer never knows how to display a file itself. A [`Renderer`]
//! declares a mime pattern in the [`registry::RendererRegistry`] and turns
//! an entry into a [`RenderHandle`] when mounted. Two built-in renderers
//! live in [`builtin`].

pub mod builtin;
pub mod registry;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LoadError;
use crate::model::{FileEntry, FileId};
use crate::provider::FileProvider;

pub use builtin::{ImageInfo, ImageRenderer, TextDocument, TextRenderer};
pub use registry::{MimePattern, RendererRegistry};

/// A mounted view of one entry, produced by a renderer.
///
/// Cheap to clone; the content is shared.
#[derive(Clone)]
pub struct RenderHandle {
    renderer: String,
    entry: FileEntry,
    content: Arc<dyn Any + Send + Sync>,
}

impl RenderHandle {
    pub fn new<T: Any + Send + Sync>(renderer: impl Into<String>, entry: FileEntry, content: T) -> Self {
        Self {
            renderer: renderer.into(),
            entry,
            content: Arc::new(content),
        }
    }

    /// Name of the renderer that produced this handle.
    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    /// The entry snapshot this handle was mounted from.
    pub fn entry(&self) -> &FileEntry {
        &self.entry
    }

    /// Borrows the renderer-specific content, if it is a `T`.
    pub fn content<T: Any>(&self) -> Option<&T> {
        self.content.downcast_ref::<T>()
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle")
            .field("renderer", &self.renderer)
            .field("entry", &self.entry.id())
            .finish_non_exhaustive()
    }
}

/// Something that can display one family of mime types.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short identifier, used in logs and handles.
    fn name(&self) -> &str;

    /// `true` for renderers that can hold unsaved edits.
    fn editable(&self) -> bool {
        false
    }

    /// Fetches and decodes `entry`.
    async fn mount(
        &self,
        entry: &FileEntry,
        provider: &dyn FileProvider,
    ) -> Result<RenderHandle, LoadError>;

    /// Releases whatever was retained for `id`.
    fn unmount(&self, _id: FileId) {}

    /// Unsaved content for `entry`, for editable renderers.
    fn pending_changes(&self, _entry: &FileEntry) -> Option<Vec<u8>> {
        None
    }

    /// Called after pending changes for `id` were written successfully.
    fn clear_pending_changes(&self, _id: FileId) {}
}
