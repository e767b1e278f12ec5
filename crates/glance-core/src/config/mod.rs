//! Configuration management for Glance.
//!
//! Viewer preferences ([`settings::Config`]) and key bindings ([`keymap::Keymap`])
//! are stored as TOML files and loaded at startup.

pub mod keymap;
pub mod settings;

use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{CoreError, CoreResult};

/// Reads and parses the TOML document at `path`.
fn read_toml<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
        _ => CoreError::Io(err),
    })?;
    toml::from_str(&text).map_err(|err| CoreError::ConfigParse(format!("{}: {err}", path.display())))
}
