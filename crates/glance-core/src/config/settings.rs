//! Viewer configuration loaded from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::nav::FallbackPolicy;

/// Top-level viewer configuration.
///
/// All fields have defaults so the viewer works without a config file.
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

impl Config {
    /// Reads viewer settings from `path`. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` or `PermissionDenied` when the file cannot be
    /// read, `CoreError::ConfigParse` when it is not valid TOML.
    pub fn load(path: &Path) -> CoreResult<Self> {
        super::read_toml(path)
    }
}

/// Session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Where the cursor lands when the active entry is removed.
    #[serde(default)]
    pub fallback: FallbackPolicy,
    /// Drop directory entries no renderer can show (the opened file is always kept).
    #[serde(default = "default_true")]
    pub filter_unsupported: bool,
    #[serde(default)]
    pub sidebar_open: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::default(),
            filter_unsupported: true,
            sidebar_open: false,
        }
    }
}

/// Entry loading limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Milliseconds before a load fails with a timeout. `0` disables it.
    #[serde(default)]
    pub timeout_ms: u64,
    /// Loaded payloads kept mounted; the least recently viewed are released first.
    #[serde(default = "default_keep_loaded")]
    pub keep_loaded: usize,
}

impl LoadConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            keep_loaded: default_keep_loaded(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_keep_loaded() -> usize {
    8
}
