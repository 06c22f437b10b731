//! Shared utilities for the elm-ui build tool.
//!
//! This crate provides cross-cutting concerns used by all other elm-ui crates:
//! error types, filesystem helpers, process spawning, and terminal progress
//! indicators.

pub mod errors;
pub mod fs;
pub mod process;
pub mod progress;

use std::path::{Path, PathBuf};

/// Environment variable that overrides the elm-ui data directory.
pub const HOME_ENV: &str = "ELM_UI_HOME";

/// Returns the path to the elm-ui data directory (`~/.elm-ui/`).
///
/// `ELM_UI_HOME` takes precedence when set.
pub fn dirs_path() -> PathBuf {
    if let Ok(custom) = std::env::var(HOME_ENV) {
        if !custom.is_empty() {
            return PathBuf::from(custom);
        }
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".elm-ui")
}
