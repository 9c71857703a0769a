//! Configuration management for the image resize extension
//!
//! - **defaults**: built-in option groups
//! - **merge**: recursive JSON merge of defaults, passed options and host settings
//! - **options**: the typed, immutable `Options`

mod defaults;
pub mod merge;
mod options;

pub use options::Options;

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the options file used by the binary
pub fn default_options_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(crate::constants::config::APP_DIR);
    path.push(crate::constants::config::FILENAME);
    path
}

/// Read a JSON options file
pub fn load_options_file(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read options file {}", path.display()))?;
    serde_json::from_str(&contents)
        .context(format!("Failed to parse options file {}", path.display()))
}
