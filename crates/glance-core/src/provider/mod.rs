//! The file-provider seam.
//!
//! The viewer owns no storage. Everything it knows about files, and every
//! side effect it performs on them, goes through a [`FileProvider`].
//! [`local::LocalProvider`] serves a directory tree on the local disk.

pub mod local;

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ProviderError;
use crate::model::{FileEntry, FileId};

pub use local::LocalProvider;

/// Streamed file content.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ProviderError>>;

/// How to address a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    Path(String),
    Id(FileId),
}

/// A download in progress.
pub struct Download {
    pub entry: FileEntry,
    pub stream: ByteStream,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

/// Storage backend consumed by the viewer.
///
/// Every call may fail with [`ProviderError::NotFound`],
/// [`ProviderError::PermissionDenied`], [`ProviderError::Network`] or,
/// for writes, [`ProviderError::Conflict`].
#[async_trait]
pub trait FileProvider: Send + Sync {
    /// Lists the viewable contents of a directory, in display order.
    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, ProviderError>;

    /// Fetches the current snapshot of one entry.
    async fn get_entry(&self, entry: &EntryRef) -> Result<FileEntry, ProviderError>;

    async fn delete(&self, id: FileId) -> Result<(), ProviderError>;

    async fn download(&self, id: FileId) -> Result<ByteStream, ProviderError>;

    /// Replaces the content of `id`, returning the new etag.
    ///
    /// Fails with [`ProviderError::Conflict`] when the stored etag no longer
    /// matches `expected_etag`.
    async fn write(
        &self,
        id: FileId,
        expected_etag: &str,
        payload: Vec<u8>,
    ) -> Result<String, ProviderError>;
}

/// Drains a [`ByteStream`] into memory.
pub async fn read_all(mut stream: ByteStream) -> Result<Vec<u8>, ProviderError> {
    use futures::StreamExt;

    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(bytes)
}
