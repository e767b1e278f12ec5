//! Unified action set for the viewer.
//!
//! Every user-triggerable action is represented by the [`Action`] enum.
//! [`ActionRegistry`] provides metadata (id, label, category) and the
//! permission each action requires on the active entry.

use serde::{Deserialize, Serialize};

use crate::i18n::strings;
use crate::model::{FileEntry, Permission};

/// Every user-triggerable action in the viewer.
///
/// Every action targets the active entry, so variants carry no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    // Navigation
    Next,
    Previous,
    Close,
    Retry,
    // File
    Download,
    Delete,
    Save,
    // View
    ToggleSidebar,
    ToggleMenu,
}

/// Broad category for grouping actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Navigation,
    File,
    View,
}

impl ActionCategory {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::File => "File",
            Self::View => "View",
        }
    }
}

/// Metadata for a single action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub action: Action,
    /// Snake-case identifier used in `keymap.toml` (e.g. `"next"`).
    pub id: &'static str,
    /// English source string, passed through the translator for display.
    pub label: &'static str,
    pub category: ActionCategory,
    /// Capability required on the active entry; `None` for pure UI actions.
    pub requires: Option<Permission>,
    /// Whether the action appears in the header menu.
    pub in_menu: bool,
}

impl ActionDescriptor {
    /// `true` if `entry` grants what this action requires.
    pub fn permitted_on(&self, entry: &FileEntry) -> bool {
        self.requires.map_or(true, |permission| entry.can(permission))
    }
}

/// Registry of all available actions.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    descriptors: Vec<ActionDescriptor>,
}

impl ActionRegistry {
    /// Builds the registry containing every known action.
    pub fn new() -> Self {
        let descriptors = vec![
            // Navigation
            ActionDescriptor {
                action: Action::Next,
                id: "next",
                label: strings::NEXT,
                category: ActionCategory::Navigation,
                requires: None,
                in_menu: false,
            },
            ActionDescriptor {
                action: Action::Previous,
                id: "previous",
                label: strings::PREVIOUS,
                category: ActionCategory::Navigation,
                requires: None,
                in_menu: false,
            },
            ActionDescriptor {
                action: Action::Close,
                id: "close",
                label: strings::CLOSE,
                category: ActionCategory::Navigation,
                requires: None,
                in_menu: false,
            },
            ActionDescriptor {
                action: Action::Retry,
                id: "retry",
                label: strings::RETRY,
                category: ActionCategory::Navigation,
                requires: Some(Permission::Read),
                in_menu: false,
            },
            // File
            ActionDescriptor {
                action: Action::Download,
                id: "download",
                label: strings::DOWNLOAD,
                category: ActionCategory::File,
                requires: Some(Permission::Read),
                in_menu: true,
            },
            ActionDescriptor {
                action: Action::Delete,
                id: "delete",
                label: strings::DELETE,
                category: ActionCategory::File,
                requires: Some(Permission::Delete),
                in_menu: true,
            },
            ActionDescriptor {
                action: Action::Save,
                id: "save",
                label: strings::SAVE,
                category: ActionCategory::File,
                requires: Some(Permission::Write),
                in_menu: true,
            },
            // View
            ActionDescriptor {
                action: Action::ToggleSidebar,
                id: "toggle_sidebar",
                label: strings::OPEN_SIDEBAR,
                category: ActionCategory::View,
                requires: None,
                in_menu: true,
            },
            ActionDescriptor {
                action: Action::ToggleMenu,
                id: "toggle_menu",
                label: strings::ACTIONS,
                category: ActionCategory::View,
                requires: None,
                in_menu: false,
            },
        ];
        Self { descriptors }
    }

    /// Returns every registered action descriptor.
    pub fn all(&self) -> &[ActionDescriptor] {
        &self.descriptors
    }

    /// Looks up an action by its snake-case id.
    pub fn find_by_id(&self, id: &str) -> Option<Action> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.action)
    }

    /// Returns the descriptor for a given action.
    pub fn descriptor_for(&self, action: Action) -> Option<&ActionDescriptor> {
        self.descriptors.iter().find(|d| d.action == action)
    }

    /// Menu actions `entry` permits, in registry order. Actions whose
    /// required capability is missing are never offered.
    pub fn menu_for(&self, entry: &FileEntry) -> Vec<&ActionDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.in_menu && d.permitted_on(entry))
            .collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
