//! [`FileProvider`] backed by a directory on the local disk.
//!
//! Paths handed to the viewer are `/`-separated and relative to the provider
//! root, so `/photos/a.jpg` lives at `<root>/photos/a.jpg`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use crate::error::ProviderError;
use crate::model::{FileEntry, FileId, Permissions, DIRECTORY_MIME};
use crate::provider::{ByteStream, EntryRef, FileProvider};

/// Bidirectional path <-> id table. Ids are stable for the provider's lifetime.
#[derive(Debug, Default)]
struct IdTable {
    by_path: HashMap<String, FileId>,
    by_id: HashMap<FileId, String>,
    next: u64,
}

impl IdTable {
    fn id_for(&mut self, path: &str) -> FileId {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        self.next += 1;
        let id = FileId(self.next);
        self.by_path.insert(path.to_string(), id);
        self.by_id.insert(id, path.to_string());
        id
    }

    fn path_for(&self, id: FileId) -> Option<String> {
        self.by_id.get(&id).cloned()
    }

    fn forget(&mut self, id: FileId) {
        if let Some(path) = self.by_id.remove(&id) {
            self.by_path.remove(&path);
        }
    }
}

/// Serves files under `root`.
#[derive(Debug)]
pub struct LocalProvider {
    root: PathBuf,
    ids: Mutex<IdTable>,
}

impl LocalProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ids: Mutex::new(IdTable::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a viewer path to a location under the root, refusing `..` escapes.
    fn disk_path(&self, path: &str) -> Result<PathBuf, ProviderError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ProviderError::PermissionDenied(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn id_for(&self, path: &str) -> FileId {
        match self.ids.lock() {
            Ok(mut ids) => ids.id_for(path),
            Err(poisoned) => poisoned.into_inner().id_for(path),
        }
    }

    fn path_for(&self, id: FileId) -> Result<String, ProviderError> {
        let path = match self.ids.lock() {
            Ok(ids) => ids.path_for(id),
            Err(poisoned) => poisoned.into_inner().path_for(id),
        };
        path.ok_or_else(|| ProviderError::NotFound(format!("file id {id}")))
    }

    fn forget(&self, id: FileId) {
        match self.ids.lock() {
            Ok(mut ids) => ids.forget(id),
            Err(poisoned) => poisoned.into_inner().forget(id),
        }
    }

    async fn entry_at(&self, path: &str) -> Result<FileEntry, ProviderError> {
        let disk = self.disk_path(path)?;
        let metadata = tokio::fs::metadata(&disk)
            .await
            .map_err(|e| map_io(e, path))?;
        self.build_entry(path, &disk, &metadata)
            .await
            .map_err(|e| map_io(e, path))
    }

    async fn build_entry(
        &self,
        path: &str,
        disk: &Path,
        metadata: &std::fs::Metadata,
    ) -> std::io::Result<FileEntry> {
        let etag = etag_of(disk, metadata).await?;
        let id = self.id_for(path);
        let (mime, permissions) = if metadata.is_dir() {
            (DIRECTORY_MIME.to_string(), Permissions::parse("R"))
        } else {
            let mime = mime_guess::from_path(disk)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            let letters = if metadata.permissions().readonly() {
                "R"
            } else {
                "RWD"
            };
            (mime, Permissions::parse(letters))
        };
        let has_preview = mime.starts_with("image/");
        Ok(FileEntry::new(id, path, mime, permissions)
            .with_preview(has_preview)
            .with_etag(etag))
    }
}

/// Truncated SHA-256 over size, modification time and file content.
async fn etag_of(disk: &Path, metadata: &std::fs::Metadata) -> std::io::Result<String> {
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut hasher = Sha256::new();
    hasher.update(metadata.len().to_le_bytes());
    hasher.update(modified.to_le_bytes());
    if metadata.is_file() {
        let mut file = tokio::fs::File::open(disk).await?;
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
    }
    let digest = hasher.finalize();
    Ok(digest[..8].iter().map(|b| format!("{b:02x}")).collect())
}

fn map_io(e: std::io::Error, path: &str) -> ProviderError {
    match e.kind() {
        std::io::ErrorKind::NotFound => ProviderError::NotFound(path.to_string()),
        std::io::ErrorKind::PermissionDenied => ProviderError::PermissionDenied(path.to_string()),
        _ => ProviderError::Network(format!("{path}: {e}")),
    }
}

fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{dir}/{name}")
}

#[async_trait]
impl FileProvider for LocalProvider {
    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, ProviderError> {
        let disk = self.disk_path(path)?;
        let mut read_dir = tokio::fs::read_dir(&disk)
            .await
            .map_err(|e| map_io(e, path))?;

        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir.next_entry().await.map_err(|e| map_io(e, path))? {
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let metadata = match dir_entry.metadata().await {
                Ok(m) => m,
                Err(_) => continue,
            };
            let child = join(path, &name);
            match self.build_entry(&child, &dir_entry.path(), &metadata).await {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::debug!(path = %child, error = %e, "skipping unreadable file"),
            }
        }
        entries.sort_by(|a, b| a.basename().cmp(b.basename()));
        Ok(entries)
    }

    async fn get_entry(&self, entry: &EntryRef) -> Result<FileEntry, ProviderError> {
        let path = match entry {
            EntryRef::Path(path) => path.clone(),
            EntryRef::Id(id) => self.path_for(*id)?,
        };
        self.entry_at(&path).await
    }

    async fn delete(&self, id: FileId) -> Result<(), ProviderError> {
        let path = self.path_for(id)?;
        let disk = self.disk_path(&path)?;
        tokio::fs::remove_file(&disk)
            .await
            .map_err(|e| map_io(e, &path))?;
        self.forget(id);
        tracing::info!(%id, path, "deleted file");
        Ok(())
    }

    async fn download(&self, id: FileId) -> Result<ByteStream, ProviderError> {
        let path = self.path_for(id)?;
        let disk = self.disk_path(&path)?;
        let file = tokio::fs::File::open(&disk)
            .await
            .map_err(|e| map_io(e, &path))?;
        let stream = ReaderStream::new(file).map(move |chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| map_io(e, &path))
        });
        Ok(stream.boxed())
    }

    async fn write(
        &self,
        id: FileId,
        expected_etag: &str,
        payload: Vec<u8>,
    ) -> Result<String, ProviderError> {
        let path = self.path_for(id)?;
        let current = self.entry_at(&path).await?;
        if current.etag() != expected_etag {
            return Err(ProviderError::Conflict {
                expected: expected_etag.to_string(),
                actual: current.etag().to_string(),
            });
        }
        let disk = self.disk_path(&path)?;
        tokio::fs::write(&disk, payload)
            .await
            .map_err(|e| map_io(e, &path))?;
        let metadata = tokio::fs::metadata(&disk)
            .await
            .map_err(|e| map_io(e, &path))?;
        etag_of(&disk, &metadata)
            .await
            .map_err(|e| map_io(e, &path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Permission;
    use crate::provider::read_all;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalProvider) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.png"), b"png").unwrap();
        fs::write(tmp.path().join("a.txt"), b"hello").unwrap();
        fs::write(tmp.path().join(".hidden"), b"x").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let provider = LocalProvider::new(tmp.path());
        (tmp, provider)
    }

    #[tokio::test]
    async fn list_directory_sorted_without_hidden() {
        let (_tmp, provider) = setup();
        let entries = provider.list_directory("/").await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.basename()).collect();
        assert_eq!(names, vec!["a.txt", "b.png", "sub"]);
        assert_eq!(entries[0].mime(), "text/plain");
        assert_eq!(entries[1].mime(), "image/png");
        assert!(entries[1].has_preview());
        assert!(entries[2].is_directory());
        assert_eq!(entries[0].path(), "/a.txt");
    }

    #[tokio::test]
    async fn ids_are_stable_across_listings() {
        let (_tmp, provider) = setup();
        let first = provider.list_directory("/").await.unwrap();
        let second = provider.list_directory("/").await.unwrap();
        assert_eq!(first[0].id(), second[0].id());
        assert_ne!(first[0].id(), first[1].id());
        let by_path = provider
            .get_entry(&EntryRef::Path("/a.txt".to_string()))
            .await
            .unwrap();
        assert_eq!(by_path.id(), first[0].id());
    }

    #[tokio::test]
    async fn writable_files_get_full_permissions() {
        let (_tmp, provider) = setup();
        let entry = provider
            .get_entry(&EntryRef::Path("/a.txt".to_string()))
            .await
            .unwrap();
        assert!(entry.can(Permission::Read));
        assert!(entry.can(Permission::Write));
        assert!(entry.can(Permission::Delete));
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let (_tmp, provider) = setup();
        let err = provider
            .get_entry(&EntryRef::Path("/nope.jpg".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NotFound("/nope.jpg".to_string()));
    }

    #[tokio::test]
    async fn parent_escape_is_refused() {
        let (_tmp, provider) = setup();
        let err = provider.list_directory("/../etc").await.unwrap_err();
        assert!(matches!(err, ProviderError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn download_streams_content() {
        let (_tmp, provider) = setup();
        let entry = provider
            .get_entry(&EntryRef::Path("/a.txt".to_string()))
            .await
            .unwrap();
        let stream = provider.download(entry.id()).await.unwrap();
        assert_eq!(read_all(stream).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn delete_removes_file_and_forgets_id() {
        let (tmp, provider) = setup();
        let entry = provider
            .get_entry(&EntryRef::Path("/b.png".to_string()))
            .await
            .unwrap();
        provider.delete(entry.id()).await.unwrap();
        assert!(!tmp.path().join("b.png").exists());
        assert!(matches!(
            provider.delete(entry.id()).await.unwrap_err(),
            ProviderError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn write_with_current_etag_succeeds() {
        let (tmp, provider) = setup();
        let entry = provider
            .get_entry(&EntryRef::Path("/a.txt".to_string()))
            .await
            .unwrap();
        let new_etag = provider
            .write(entry.id(), entry.etag(), b"hello, world".to_vec())
            .await
            .unwrap();
        assert_ne!(new_etag, entry.etag());
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.txt")).unwrap(),
            "hello, world"
        );
    }

    #[tokio::test]
    async fn same_size_rewrite_within_one_mtime_tick_conflicts() {
        let (tmp, provider) = setup();
        let disk = tmp.path().join("a.txt");
        let entry = provider
            .get_entry(&EntryRef::Path("/a.txt".to_string()))
            .await
            .unwrap();

        let modified = fs::metadata(&disk).unwrap().modified().unwrap();
        fs::write(&disk, b"HELLO").unwrap();
        fs::File::options()
            .write(true)
            .open(&disk)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        let err = provider
            .write(entry.id(), entry.etag(), b"hello, world".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict { .. }));
        assert_eq!(fs::read_to_string(&disk).unwrap(), "HELLO");
    }

    #[tokio::test]
    async fn write_with_stale_etag_conflicts() {
        let (tmp, provider) = setup();
        let entry = provider
            .get_entry(&EntryRef::Path("/a.txt".to_string()))
            .await
            .unwrap();
        let err = provider
            .write(entry.id(), "stale", b"x".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict { .. }));
        assert_eq!(fs::read_to_string(tmp.path().join("a.txt")).unwrap(), "hello");
    }
}
