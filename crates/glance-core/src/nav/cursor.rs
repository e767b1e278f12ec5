//! Cursor over a [`ViewList`] snapshot.
//!
//! All functions are pure: they read a list and an active id and compute
//! navigation targets. There is no wraparound; `next` on the last entry and
//! `prev` on the first both return `None`, and the caller hides the matching
//! control exactly then.

use serde::{Deserialize, Serialize};

use crate::model::{FileEntry, FileId, ViewList};

/// Which entry becomes active when the active one disappears from the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Stay at the same visual position, clamped to the new bounds.
    #[default]
    SameIndex,
    /// Step back to the entry before the removed one (first entry if none).
    Previous,
}

/// Result of re-resolving the active entry after the list changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The active id is still present at this index.
    Unchanged(usize),
    /// The active id is gone; this index is the fallback.
    Fallback(usize),
    /// Nothing is left to show.
    Empty,
}

/// Which navigation controls should be offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub has_prev: bool,
    pub has_next: bool,
}

/// Index of `active` in `list`, or `None` if it is not present.
pub fn current_index(list: &ViewList, active: FileId) -> Option<usize> {
    list.position(active)
}

/// Entry after `active`, or `None` at the last entry (or when `active` is absent).
pub fn next(list: &ViewList, active: FileId) -> Option<&FileEntry> {
    let index = current_index(list, active)?;
    list.get(index + 1)
}

/// Entry before `active`, or `None` at the first entry (or when `active` is absent).
pub fn prev(list: &ViewList, active: FileId) -> Option<&FileEntry> {
    let index = current_index(list, active)?;
    index.checked_sub(1).and_then(|i| list.get(i))
}

pub fn bounds(list: &ViewList, active: FileId) -> Bounds {
    Bounds {
        has_prev: prev(list, active).is_some(),
        has_next: next(list, active).is_some(),
    }
}

/// Re-resolves the active entry against a (possibly shrunken) list.
///
/// `previous_index` is where the active entry sat before the change.
pub fn resolve(
    list: &ViewList,
    active: FileId,
    previous_index: usize,
    policy: FallbackPolicy,
) -> Resolution {
    if let Some(index) = current_index(list, active) {
        return Resolution::Unchanged(index);
    }
    if list.is_empty() {
        return Resolution::Empty;
    }
    let last = list.len() - 1;
    let index = match policy {
        FallbackPolicy::SameIndex => previous_index.min(last),
        FallbackPolicy::Previous => previous_index.saturating_sub(1).min(last),
    };
    Resolution::Fallback(index)
}
