//! Localization.
//!
//! Every user-facing string the core produces is an English source string
//! from [`strings`], passed through a [`Translate`] implementation before it
//! reaches the host. [`Identity`] returns the source unchanged; [`Catalog`]
//! looks it up in a translation table loaded from JSON.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// English source strings used by the core.
pub mod strings {
    pub const VIEWER: &str = "Viewer";
    pub const DOWNLOAD: &str = "Download";
    pub const DELETE: &str = "Delete";
    pub const VIEW: &str = "View";
    pub const SAVE: &str = "Save";
    pub const BACK: &str = "Back";
    pub const CANCEL: &str = "Cancel";
    pub const CONTINUE: &str = "Continue";
    pub const ORIGINAL: &str = "Original";
    pub const POSITION: &str = "Position";
    pub const NEXT: &str = "Next";
    pub const PREVIOUS: &str = "Previous";
    pub const CLOSE: &str = "Close";
    pub const RETRY: &str = "Retry";
    pub const ACTIONS: &str = "Actions";
    pub const OPEN_SIDEBAR: &str = "Open sidebar";
    pub const UNSAVED_CHANGES: &str = "Unsaved changes";
    pub const LOADING: &str = "Loading…";
    /// Takes a `{name}` placeholder.
    pub const ERROR_LOADING: &str = "Error loading {name}";
    pub const NO_PLUGIN: &str = "There is no plugin available to display this file type";
    /// Takes `{action}` and `{reason}` placeholders.
    pub const ACTION_FAILED: &str = "{action} failed: {reason}";
    /// Plural pair; takes an `{count}` placeholder.
    pub const ITEMS_SINGULAR: &str = "{count} item";
    pub const ITEMS_PLURAL: &str = "{count} items";
}

/// A pluggable translation function keyed by the English source string.
pub trait Translate: Send + Sync {
    fn translate<'a>(&'a self, source: &'a str) -> Cow<'a, str>;

    /// Picks the plural form for `n` and translates it.
    fn translate_plural<'a>(&'a self, singular: &'a str, plural: &'a str, n: u64) -> Cow<'a, str> {
        Cow::Borrowed(if n != 1 { plural } else { singular })
    }
}

/// Returns source strings unchanged (English).
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Translate for Identity {
    fn translate<'a>(&'a self, source: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(source)
    }
}

/// Plural-form selection rule of a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PluralRule {
    /// `nplurals=2; plural=(n != 1);`
    #[default]
    NotOne,
    /// `nplurals=2; plural=(n > 1);`
    GreaterThanOne,
    /// `nplurals=1; plural=0;`
    Single,
}

impl PluralRule {
    /// Parses a gettext-style plural-forms header. Unknown headers fall back to
    /// [`PluralRule::NotOne`].
    pub fn parse(header: &str) -> Self {
        let compact: String = header.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = compact.trim_end_matches(';');
        match compact {
            "nplurals=2;plural=(n!=1)" | "nplurals=2;plural=n!=1" => Self::NotOne,
            "nplurals=2;plural=(n>1)" | "nplurals=2;plural=n>1" => Self::GreaterThanOne,
            "nplurals=1;plural=0" => Self::Single,
            _ => {
                tracing::warn!(header, "unsupported plural form, using n != 1");
                Self::NotOne
            }
        }
    }

    /// Index of the form to use for `n`.
    pub fn index(self, n: u64) -> usize {
        match self {
            Self::NotOne => usize::from(n != 1),
            Self::GreaterThanOne => usize::from(n > 1),
            Self::Single => 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Translation {
    Single(String),
    Plural(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    translations: HashMap<String, Translation>,
    #[serde(default, rename = "pluralForm")]
    plural_form: Option<String>,
}

/// Translation table for one language.
///
/// Plural entries are keyed `"_{singular}_::_{plural}_"` and hold one string
/// per plural form.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    translations: HashMap<String, Translation>,
    plural: PluralRule,
}

impl Catalog {
    /// Parses a catalog from its JSON representation.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let raw: RawCatalog =
            serde_json::from_str(json).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        Ok(Self {
            translations: raw.translations,
            plural: raw
                .plural_form
                .as_deref()
                .map(PluralRule::parse)
                .unwrap_or_default(),
        })
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::ConfigParse`] if the JSON is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        Self::from_json(&content)
    }

    pub fn plural_rule(&self) -> PluralRule {
        self.plural
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

impl Translate for Catalog {
    fn translate<'a>(&'a self, source: &'a str) -> Cow<'a, str> {
        match self.translations.get(source) {
            Some(Translation::Single(text)) => Cow::Borrowed(text.as_str()),
            Some(Translation::Plural(forms)) => forms
                .first()
                .map_or(Cow::Borrowed(source), |text| Cow::Borrowed(text.as_str())),
            None => Cow::Borrowed(source),
        }
    }

    fn translate_plural<'a>(&'a self, singular: &'a str, plural: &'a str, n: u64) -> Cow<'a, str> {
        let key = format!("_{singular}_::_{plural}_");
        let index = self.plural.index(n);
        match self.translations.get(&key) {
            Some(Translation::Plural(forms)) => match forms.get(index) {
                Some(text) => Cow::Borrowed(text.as_str()),
                None => Cow::Borrowed(if index == 0 { singular } else { plural }),
            },
            _ => Cow::Borrowed(if n != 1 { plural } else { singular }),
        }
    }
}

/// Substitutes `{key}` placeholders in `template`.
///
/// ```
/// use glance_core::i18n::fill;
///
/// assert_eq!(fill("Error loading {name}", &[("name", "a.png")]), "Error loading a.png");
/// ```
pub fn fill(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{key}}}"), value)
        })
}
