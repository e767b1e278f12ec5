//! Key binding configuration.
//!
//! Key bindings map host key names (e.g. `"ArrowRight"`, `"Ctrl+s"`) to
//! [`Action`] values. TOML files use string action identifiers
//! (e.g. `"next"`); these are resolved via [`ActionRegistry::find_by_id`]
//! at load time.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionRegistry};
use crate::error::CoreResult;

/// Raw TOML representation, deserialized first and then resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawKeymap {
    #[serde(default)]
    bindings: HashMap<String, String>,
}

/// Complete set of key bindings.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, Action>,
    /// Reverse map: Action → key strings (for tooltips).
    reverse: HashMap<Action, Vec<String>>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut bindings = HashMap::new();

        // Navigation
        bindings.insert("ArrowRight".to_string(), Action::Next);
        bindings.insert("l".to_string(), Action::Next);
        bindings.insert("ArrowLeft".to_string(), Action::Previous);
        bindings.insert("h".to_string(), Action::Previous);
        bindings.insert("Escape".to_string(), Action::Close);
        bindings.insert("q".to_string(), Action::Close);

        // File
        bindings.insert("Delete".to_string(), Action::Delete);
        bindings.insert("d".to_string(), Action::Download);
        bindings.insert("Ctrl+s".to_string(), Action::Save);

        // View
        bindings.insert("i".to_string(), Action::ToggleSidebar);

        let reverse = build_reverse(&bindings);
        Self { bindings, reverse }
    }
}

fn build_reverse(bindings: &HashMap<String, Action>) -> HashMap<Action, Vec<String>> {
    let mut reverse: HashMap<Action, Vec<String>> = HashMap::new();
    for (key, action) in bindings {
        reverse.entry(*action).or_default().push(key.clone());
    }
    for keys in reverse.values_mut() {
        keys.sort();
    }
    reverse
}

impl Keymap {
    /// Reads a `[bindings]` table from `path`, replacing the defaults.
    ///
    /// Bindings naming an unknown action id are skipped with a warning.
    /// Fails the same way as [`Config::load`](super::settings::Config::load).
    pub fn load(path: &Path) -> CoreResult<Self> {
        super::read_toml(path).map(Self::from_raw)
    }

    fn from_raw(raw: RawKeymap) -> Self {
        let registry = ActionRegistry::new();
        let bindings: HashMap<String, Action> = raw
            .bindings
            .into_iter()
            .filter_map(|(key, action_id)| match registry.find_by_id(&action_id) {
                Some(action) => Some((key, action)),
                None => {
                    tracing::warn!(%key, action = %action_id, "ignoring unknown action in keymap");
                    None
                }
            })
            .collect();
        let reverse = build_reverse(&bindings);
        Self { bindings, reverse }
    }

    /// Returns the action mapped to `key`, or `None` if unbound.
    pub fn action_for_key(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    /// Returns the key(s) bound to a given action.
    pub fn keys_for_action(&self, action: Action) -> Option<&[String]> {
        self.reverse.get(&action).map(|v| v.as_slice())
    }

    pub fn bindings(&self) -> &HashMap<String, Action> {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_keymap_has_navigation_keys() {
        let keymap = Keymap::default();

        assert_eq!(keymap.action_for_key("ArrowRight"), Some(Action::Next));
        assert_eq!(keymap.action_for_key("l"), Some(Action::Next));
        assert_eq!(keymap.action_for_key("ArrowLeft"), Some(Action::Previous));
        assert_eq!(keymap.action_for_key("h"), Some(Action::Previous));
        assert_eq!(keymap.action_for_key("Escape"), Some(Action::Close));
        assert_eq!(keymap.action_for_key("q"), Some(Action::Close));
    }

    #[test]
    fn default_keymap_has_file_keys() {
        let keymap = Keymap::default();

        assert_eq!(keymap.action_for_key("Delete"), Some(Action::Delete));
        assert_eq!(keymap.action_for_key("d"), Some(Action::Download));
        assert_eq!(keymap.action_for_key("Ctrl+s"), Some(Action::Save));
        assert_eq!(keymap.action_for_key("i"), Some(Action::ToggleSidebar));
    }

    #[test]
    fn action_for_unknown_key_returns_none() {
        let keymap = Keymap::default();
        assert_eq!(keymap.action_for_key("z"), None);
        assert_eq!(keymap.action_for_key(""), None);
    }

    #[test]
    fn load_custom_keymap() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keymap.toml");
        fs::write(
            &path,
            r#"
[bindings]
j = "next"
k = "previous"
x = "close"
"#,
        )
        .unwrap();

        let keymap = Keymap::load(&path).unwrap();

        assert_eq!(keymap.action_for_key("j"), Some(Action::Next));
        assert_eq!(keymap.action_for_key("k"), Some(Action::Previous));
        assert_eq!(keymap.action_for_key("x"), Some(Action::Close));
        // A loaded keymap replaces the defaults
        assert_eq!(keymap.action_for_key("ArrowRight"), None);
    }

    #[test]
    fn load_custom_keymap_ignores_unknown_actions() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keymap.toml");
        fs::write(
            &path,
            r#"
[bindings]
j = "next"
x = "nonexistent_action"
"#,
        )
        .unwrap();

        let keymap = Keymap::load(&path).unwrap();
        assert_eq!(keymap.action_for_key("j"), Some(Action::Next));
        assert_eq!(keymap.action_for_key("x"), None);
    }

    #[test]
    fn load_nonexistent_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = Keymap::load(&tmp.path().join("nope.toml"));
        assert!(matches!(
            result.unwrap_err(),
            crate::error::CoreError::NotFound(_)
        ));
    }

    #[test]
    fn load_invalid_toml_returns_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keymap.toml");
        fs::write(&path, "invalid[[[toml").unwrap();

        let result = Keymap::load(&path);
        assert!(matches!(
            result.unwrap_err(),
            crate::error::CoreError::ConfigParse(_)
        ));
    }

    #[test]
    fn keys_for_action_returns_bound_keys() {
        let keymap = Keymap::default();
        let keys = keymap.keys_for_action(Action::Close).unwrap();
        assert_eq!(keys, ["Escape".to_string(), "q".to_string()]);
    }

    #[test]
    fn keys_for_action_unbound_returns_none() {
        let keymap = Keymap::default();
        assert!(keymap.keys_for_action(Action::Retry).is_none());
    }
}
