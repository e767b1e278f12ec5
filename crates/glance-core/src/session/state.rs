//! Session phases, UI flags, and the frame view model.

use crate::action::Action;
use crate::model::FileEntry;
use crate::render::RenderHandle;

/// Where a session is in its lifecycle.
///
/// `Opening → Ready → {Navigating, ActionPending} → Ready … → Closed`
///
/// `Opening`, `Navigating` and `ActionPending` only last while a
/// [`Session`](super::Session) method holds `&mut self`, so hosts never read
/// them through [`Session::phase`](super::Session::phase). A host that shows a
/// busy affordance marks the action busy on [`Event::ActionStarted`] and
/// clears it when `dispatch` returns.
///
/// [`Event::ActionStarted`]: crate::event::Event::ActionStarted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The list is being resolved; spans the `Session::open` future.
    Opening,
    Ready,
    /// Transient while the active entry changes.
    Navigating,
    /// A provider-backed action is running. Only that action is busy.
    ActionPending(Action),
    /// Terminal.
    Closed,
}

/// Session-wide UI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub menu_open: bool,
    pub sidebar_open: bool,
    /// The active entry's editor holds changes not yet saved.
    pub unsaved_changes: bool,
}

/// A transient message about a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub action: Action,
    pub message: String,
}

/// What the content area shows for the active entry.
#[derive(Debug, Clone)]
pub enum LoadView {
    /// Spinner over the frame.
    Loading,
    Loaded(RenderHandle),
    /// Inline error, e.g. "Error loading image.png". Navigation stays available.
    Error { message: String },
    /// No renderer for this mime type.
    Unsupported { message: String },
}

/// A menu entry offered for the active file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub action: Action,
    pub id: &'static str,
    /// Translated label.
    pub label: String,
}

/// UI-agnostic snapshot of everything the modal shows.
///
/// The frame is available as soon as the session is ready; it does not wait
/// for the active entry to load.
#[derive(Debug, Clone)]
pub struct Frame {
    pub entry: FileEntry,
    pub title: String,
    /// Zero-based.
    pub index: usize,
    pub len: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub load: LoadView,
    pub menu: Vec<MenuItem>,
    pub flags: Flags,
    pub notice: Option<Notice>,
}

impl Frame {
    /// One-based position, e.g. `"2/5"`.
    pub fn position(&self) -> String {
        format!("{}/{}", self.index + 1, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::image;

    #[test]
    fn position_is_one_based() {
        let frame = Frame {
            entry: image(1, "a.jpg"),
            title: "a.jpg".to_string(),
            index: 1,
            len: 5,
            has_prev: true,
            has_next: true,
            load: LoadView::Loading,
            menu: Vec::new(),
            flags: Flags::default(),
            notice: None,
        };
        assert_eq!(frame.position(), "2/5");
    }

    #[test]
    fn flags_start_cleared() {
        let flags = Flags::default();
        assert!(!flags.menu_open && !flags.sidebar_open && !flags.unsaved_changes);
    }
}
