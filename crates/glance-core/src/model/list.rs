//! Ordered, id-unique list of entries backing one viewer session.

use std::collections::HashSet;

use crate::model::entry::{FileEntry, FileId};

/// Where a [`ViewList`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Listed from a directory by the file provider. May grow.
    Directory { path: String },
    /// Supplied by the caller. Fixed once created.
    Explicit,
}

/// Ordered sequence of [`FileEntry`], unique by id. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewList {
    entries: Vec<FileEntry>,
    provenance: Provenance,
}

impl ViewList {
    /// Builds a caller-supplied list. Folders and repeated ids are dropped (first wins).
    pub fn explicit(entries: Vec<FileEntry>) -> Self {
        Self {
            entries: dedup(entries),
            provenance: Provenance::Explicit,
        }
    }

    /// Builds a directory-backed list. Folders and repeated ids are dropped (first wins).
    pub fn directory(path: impl Into<String>, entries: Vec<FileEntry>) -> Self {
        Self {
            entries: dedup(entries),
            provenance: Provenance::Directory { path: path.into() },
        }
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn is_explicit(&self) -> bool {
        self.provenance == Provenance::Explicit
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    pub fn position(&self, id: FileId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn find(&self, id: FileId) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.position(id).is_some()
    }

    /// Swaps in a new snapshot of an entry at the position of the entry with the same id.
    ///
    /// Returns the replaced entry, or `None` (and leaves the list untouched)
    /// when the id is not present.
    pub fn replace(&mut self, entry: FileEntry) -> Option<FileEntry> {
        let index = self.position(entry.id())?;
        Some(std::mem::replace(&mut self.entries[index], entry))
    }

    /// Removes the entry with `id`, returning the index it occupied.
    pub fn remove(&mut self, id: FileId) -> Option<usize> {
        let index = self.position(id)?;
        self.entries.remove(index);
        Some(index)
    }

    /// Appends a newly discovered entry to a directory-backed list.
    ///
    /// Returns `false` for explicit lists, folders, and ids already present.
    pub fn push(&mut self, entry: FileEntry) -> bool {
        if self.is_explicit() || entry.is_directory() || self.contains(entry.id()) {
            return false;
        }
        self.entries.push(entry);
        true
    }
}

fn dedup(entries: Vec<FileEntry>) -> Vec<FileEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            if entry.is_directory() {
                return false;
            }
            if !seen.insert(entry.id()) {
                tracing::warn!(id = %entry.id(), path = entry.path(), "dropping duplicate list entry");
                return false;
            }
            true
        })
        .collect()
}
