//! Core data types for the elm-ui build tool.
//!
//! This crate defines the files an elm-ui project is made of: the Elm
//! package manifest, the elm-ui tool configuration, the lock file, the
//! global and per-environment configuration, the embedded project template,
//! and the generated HTML shell.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod html;
pub mod lockfile;
pub mod manifest;
pub mod template;

/// Package whose stylesheets are put on the Sass load path during builds.
pub const ELM_UI_PACKAGE: &str = "gdotdesign/elm-ui";
