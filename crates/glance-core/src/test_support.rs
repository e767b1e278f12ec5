//! Scripted collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::watch;

use crate::error::{LoadError, ProviderError};
use crate::model::{FileEntry, FileId, Permissions};
use crate::provider::{ByteStream, EntryRef, FileProvider};
use crate::render::{RenderHandle, Renderer};

pub fn entry(id: u64, path: &str, mime: &str, perms: &str) -> FileEntry {
    FileEntry::new(FileId(id), path, mime, Permissions::parse(perms)).with_etag(format!("etag-{id}"))
}

pub fn image(id: u64, name: &str) -> FileEntry {
    entry(id, &format!("/{name}"), "image/jpeg", "RWD")
}

/// In-memory provider with call counters and failure injection.
#[derive(Default)]
pub struct MemoryProvider {
    files: Mutex<Vec<(FileEntry, Vec<u8>)>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, ProviderError>>,
}

impl MemoryProvider {
    pub fn new(files: Vec<(FileEntry, Vec<u8>)>) -> Self {
        Self {
            files: Mutex::new(files),
            ..Self::default()
        }
    }

    pub fn with_entries(entries: Vec<FileEntry>) -> Self {
        Self::new(entries.into_iter().map(|e| (e, Vec::new())).collect())
    }

    /// Makes every later call to `op` fail with `err`.
    pub fn fail(&self, op: &'static str, err: ProviderError) {
        self.failures.lock().unwrap().insert(op, err);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.files.lock().unwrap().iter().any(|(e, _)| e.id() == id)
    }

    pub fn content(&self, id: FileId) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| e.id() == id)
            .map(|(_, c)| c.clone())
    }

    fn record(&self, op: &'static str) -> Result<(), ProviderError> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn lookup(&self, id: FileId) -> Result<(FileEntry, Vec<u8>), ProviderError> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| e.id() == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("file id {id}")))
    }
}

#[async_trait]
impl FileProvider for MemoryProvider {
    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, ProviderError> {
        self.record("list_directory")?;
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e.parent_path() == path)
            .map(|(e, _)| e.clone())
            .collect())
    }

    async fn get_entry(&self, entry: &EntryRef) -> Result<FileEntry, ProviderError> {
        self.record("get_entry")?;
        let files = self.files.lock().unwrap();
        let found = files.iter().find(|(e, _)| match entry {
            EntryRef::Path(path) => e.path() == path,
            EntryRef::Id(id) => e.id() == *id,
        });
        found
            .map(|(e, _)| e.clone())
            .ok_or_else(|| ProviderError::NotFound(format!("{entry:?}")))
    }

    async fn delete(&self, id: FileId) -> Result<(), ProviderError> {
        self.record("delete")?;
        self.lookup(id)?;
        self.files.lock().unwrap().retain(|(e, _)| e.id() != id);
        Ok(())
    }

    async fn download(&self, id: FileId) -> Result<ByteStream, ProviderError> {
        self.record("download")?;
        let (_, content) = self.lookup(id)?;
        Ok(futures::stream::iter(vec![Ok(content)]).boxed())
    }

    async fn write(
        &self,
        id: FileId,
        expected_etag: &str,
        payload: Vec<u8>,
    ) -> Result<String, ProviderError> {
        self.record("write")?;
        let mut files = self.files.lock().unwrap();
        let slot = files
            .iter_mut()
            .find(|(e, _)| e.id() == id)
            .ok_or_else(|| ProviderError::NotFound(format!("file id {id}")))?;
        if slot.0.etag() != expected_etag {
            return Err(ProviderError::Conflict {
                expected: expected_etag.to_string(),
                actual: slot.0.etag().to_string(),
            });
        }
        let etag = format!("{}+", slot.0.etag());
        slot.0 = slot.0.clone().with_etag(etag.clone());
        slot.1 = payload;
        Ok(etag)
    }
}

/// Renderer whose mounts resolve only when the test says so.
///
/// Ids not put on [`hold`](GatedRenderer::hold) resolve immediately.
pub struct GatedRenderer {
    held: Mutex<HashSet<FileId>>,
    released: Mutex<HashMap<FileId, Result<(), LoadError>>>,
    mounts: Mutex<HashMap<FileId, usize>>,
    unmounts: Mutex<Vec<FileId>>,
    wake: watch::Sender<u64>,
}

impl Default for GatedRenderer {
    fn default() -> Self {
        Self {
            held: Mutex::default(),
            released: Mutex::default(),
            mounts: Mutex::default(),
            unmounts: Mutex::default(),
            wake: watch::channel(0).0,
        }
    }
}

impl GatedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&self, id: FileId) {
        self.held.lock().unwrap().insert(id);
    }

    /// Lets a held mount for `id` finish with `outcome`.
    pub fn release(&self, id: FileId, outcome: Result<(), LoadError>) {
        self.held.lock().unwrap().remove(&id);
        self.released.lock().unwrap().insert(id, outcome);
        self.wake.send_modify(|v| *v += 1);
    }

    pub fn mounts(&self, id: FileId) -> usize {
        self.mounts.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub fn unmounted(&self) -> Vec<FileId> {
        self.unmounts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for GatedRenderer {
    fn name(&self) -> &str {
        "gated"
    }

    async fn mount(
        &self,
        entry: &FileEntry,
        _provider: &dyn FileProvider,
    ) -> Result<RenderHandle, LoadError> {
        let id = entry.id();
        *self.mounts.lock().unwrap().entry(id).or_default() += 1;
        let mut wake = self.wake.subscribe();
        loop {
            let released = self.released.lock().unwrap().remove(&id);
            if let Some(outcome) = released {
                return outcome.map(|_| RenderHandle::new("gated", entry.clone(), ()));
            }
            let held = self.held.lock().unwrap().contains(&id);
            if !held {
                return Ok(RenderHandle::new("gated", entry.clone(), ()));
            }
            if wake.changed().await.is_err() {
                return Err(LoadError::Interrupted("gate dropped".to_string()));
            }
        }
    }

    fn unmount(&self, id: FileId) {
        self.unmounts.lock().unwrap().push(id);
    }
}
