//! Viewable file descriptor.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Mime type the provider reports for folders. Folders are never viewable.
pub const DIRECTORY_MIME: &str = "httpd/unix-directory";

/// Stable identifier of a file for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single capability the current user holds on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    Read,
    Write,
    Delete,
    Create,
    Share,
}

impl Permission {
    /// Maps a permission letter (`R`, `W`, `D`, `C`, `S`) to a capability.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'R' => Some(Self::Read),
            'W' => Some(Self::Write),
            'D' => Some(Self::Delete),
            'C' => Some(Self::Create),
            'S' => Some(Self::Share),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::Read => 'R',
            Self::Write => 'W',
            Self::Delete => 'D',
            Self::Create => 'C',
            Self::Share => 'S',
        }
    }
}

/// The set of capabilities held on a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(BTreeSet<Permission>);

impl Permissions {
    /// An empty permission set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses a letter string such as `"RWD"`. Unknown letters are ignored.
    pub fn parse(letters: &str) -> Self {
        Self(letters.chars().filter_map(Permission::from_letter).collect())
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Returns a new set with `permission` added.
    pub fn with(&self, permission: Permission) -> Self {
        let mut set = self.0.clone();
        set.insert(permission);
        Self(set)
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for permission in &self.0 {
            write!(f, "{}", permission.letter())?;
        }
        Ok(())
    }
}

impl Serialize for Permissions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let letters = String::deserialize(deserializer)?;
        Ok(Self::parse(&letters))
    }
}

/// One viewable item.
///
/// `FileEntry` is immutable: a rename, delete or content change produces a
/// **new** entry that replaces the old one in its list, so anything still
/// holding the old value keeps seeing a consistent snapshot.
///
/// Deserializes from the host's file-info shape:
///
/// ```
/// use glance_core::FileEntry;
///
/// let entry: FileEntry = serde_json::from_str(r#"{
///     "fileid": 12, "filename": "/photos/image1.jpg", "mime": "image/jpeg",
///     "permissions": "RWD", "hasPreview": true, "etag": "123456789"
/// }"#).unwrap();
/// assert_eq!(entry.basename(), "image1.jpg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    #[serde(rename = "fileid")]
    id: FileId,
    #[serde(rename = "filename")]
    path: String,
    basename: String,
    mime: String,
    permissions: Permissions,
    #[serde(rename = "hasPreview")]
    has_preview: bool,
    etag: String,
}

#[derive(Deserialize)]
struct RawFileInfo {
    fileid: FileId,
    filename: String,
    #[serde(default)]
    basename: Option<String>,
    mime: String,
    #[serde(default)]
    permissions: Permissions,
    #[serde(default, rename = "hasPreview")]
    has_preview: bool,
    #[serde(default)]
    etag: String,
}

impl<'de> Deserialize<'de> for FileEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawFileInfo::deserialize(deserializer)?;
        let entry = Self::new(raw.fileid, raw.filename, raw.mime, raw.permissions)
            .with_preview(raw.has_preview)
            .with_etag(raw.etag);
        Ok(match raw.basename {
            Some(basename) if !basename.is_empty() => Self {
                basename: basename.nfc().collect(),
                ..entry
            },
            _ => entry,
        })
    }
}

impl FileEntry {
    /// Creates an entry; the basename is the last path component, NFC-normalised.
    pub fn new(
        id: FileId,
        path: impl Into<String>,
        mime: impl Into<String>,
        permissions: Permissions,
    ) -> Self {
        let path = path.into();
        let basename = basename_of(&path);
        Self {
            id,
            path,
            basename,
            mime: mime.into(),
            permissions,
            has_preview: false,
            etag: String::new(),
        }
    }

    /// Returns a copy with the given preview availability.
    pub fn with_preview(self, has_preview: bool) -> Self {
        Self {
            has_preview,
            ..self
        }
    }

    /// Returns a copy carrying a new version token.
    pub fn with_etag(self, etag: impl Into<String>) -> Self {
        Self {
            etag: etag.into(),
            ..self
        }
    }

    /// Returns a copy moved to `path`; the basename follows the new path.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            basename: basename_of(&path),
            path,
            ..self
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn has_preview(&self) -> bool {
        self.has_preview
    }

    /// Opaque version token; changes whenever the content changes.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn is_directory(&self) -> bool {
        self.mime == DIRECTORY_MIME
    }

    /// Parent directory of this entry's path (`"/"` for top-level files).
    pub fn parent_path(&self) -> &str {
        parent_of(&self.path)
    }
}

/// Last component of a `/`-separated path, NFC-normalised.
pub fn basename_of(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .nfc()
        .collect()
}

/// Parent of a `/`-separated path; `"/"` when the path has no parent.
pub fn parent_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &trimmed[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, path: &str) -> FileEntry {
        FileEntry::new(FileId(id), path, "image/jpeg", Permissions::parse("RWD"))
    }

    #[test]
    fn basename_is_last_component() {
        let e = entry(1, "/photos/2024/image1.jpg");
        assert_eq!(e.basename(), "image1.jpg");
        assert_eq!(e.parent_path(), "/photos/2024");
    }

    #[test]
    fn top_level_parent_is_root() {
        assert_eq!(entry(1, "/image.png").parent_path(), "/");
        assert_eq!(parent_of("image.png"), "/");
    }

    #[test]
    fn basename_is_nfc_normalised() {
        // "한" decomposed into Jamo
        let decomposed = "/docs/\u{1112}\u{1161}\u{11AB}.txt";
        let e = entry(1, decomposed);
        assert_eq!(e.basename(), "\u{D55C}.txt");
    }

    #[test]
    fn permissions_parse_known_letters_only() {
        let perms = Permissions::parse("RWDX");
        assert!(perms.contains(Permission::Read));
        assert!(perms.contains(Permission::Write));
        assert!(perms.contains(Permission::Delete));
        assert!(!perms.contains(Permission::Share));
        assert_eq!(perms.to_string(), "RWD");
    }

    #[test]
    fn read_only_permissions() {
        let e = FileEntry::new(FileId(3), "/image3.jpg", "image/jpeg", Permissions::parse("R"));
        assert!(e.can(Permission::Read));
        assert!(!e.can(Permission::Delete));
        assert!(!e.can(Permission::Write));
    }

    #[test]
    fn with_etag_returns_new_entry() {
        let original = entry(1, "/a.txt").with_etag("v1");
        let updated = original.clone().with_etag("v2");
        assert_eq!(original.etag(), "v1");
        assert_eq!(updated.etag(), "v2");
        assert_eq!(original.id(), updated.id());
    }

    #[test]
    fn with_path_updates_basename() {
        let renamed = entry(1, "/a.txt").with_path("/b/renamed.txt");
        assert_eq!(renamed.basename(), "renamed.txt");
        assert_eq!(renamed.path(), "/b/renamed.txt");
    }

    #[test]
    fn deserializes_host_file_info() {
        let json = r#"{
            "basename": "image3.jpg",
            "filename": "/image3.jpg",
            "hasPreview": true,
            "fileid": 42,
            "permissions": "R",
            "mime": "image/jpeg",
            "etag": "987654321"
        }"#;
        let e: FileEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.id(), FileId(42));
        assert_eq!(e.basename(), "image3.jpg");
        assert!(e.has_preview());
        assert!(e.can(Permission::Read));
        assert!(!e.can(Permission::Write));
        assert_eq!(e.etag(), "987654321");
    }

    #[test]
    fn deserialize_derives_missing_basename() {
        let json = r#"{"fileid": 1, "filename": "/x/y.png", "mime": "image/png"}"#;
        let e: FileEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.basename(), "y.png");
        assert!(e.permissions().iter().next().is_none());
    }

    #[test]
    fn serializes_permissions_as_letters() {
        let e = entry(5, "/a.jpg");
        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(value["permissions"], "RWD");
        assert_eq!(value["fileid"], 5);
    }

    #[test]
    fn directory_mime_detected() {
        let dir = FileEntry::new(FileId(9), "/photos", DIRECTORY_MIME, Permissions::none());
        assert!(dir.is_directory());
    }
}
