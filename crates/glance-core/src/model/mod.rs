//! Data model: [`entry::FileEntry`] snapshots and the [`list::ViewList`] they live in.

pub mod entry;
pub mod list;

pub use entry::{FileEntry, FileId, Permission, Permissions, DIRECTORY_MIME};
pub use list::{Provenance, ViewList};
