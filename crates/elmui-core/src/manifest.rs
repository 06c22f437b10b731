//! `elm-package.json`: the project's (and every package's) Elm manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use elmui_util::errors::ElmUiError;
use semver::Version;
use serde::{Deserialize, Serialize};

/// File name of the Elm package manifest.
pub const MANIFEST_FILE: &str = "elm-package.json";

/// A parsed `elm-package.json`.
///
/// Fields elm-ui does not know about are kept in `extra` so that rewriting the
/// manifest never drops them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElmPackage {
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,

    #[serde(default, rename = "source-directories")]
    pub source_directories: Vec<String>,

    #[serde(default, rename = "exposed-modules")]
    pub exposed_modules: Vec<String>,

    /// Package id (`owner/repo`) to version range, in Elm range syntax.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "elm-version", skip_serializing_if = "Option::is_none")]
    pub elm_version: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ElmPackage {
    /// Parse manifest JSON.
    pub fn parse(content: &str) -> miette::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            ElmUiError::Manifest {
                message: format!("Failed to parse {MANIFEST_FILE}: {e}"),
            }
            .into()
        })
    }

    /// Load and parse a manifest from disk.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ElmUiError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&content)
    }

    /// Write the manifest back as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let mut content = serde_json::to_string_pretty(self).map_err(|e| ElmUiError::Manifest {
            message: format!("Failed to serialize {MANIFEST_FILE}: {e}"),
        })?;
        content.push('\n');
        std::fs::write(path, content).map_err(ElmUiError::Io)?;
        Ok(())
    }

    /// The manifest's own `version` as a semantic version.
    pub fn semver(&self) -> miette::Result<Version> {
        Version::parse(self.version.trim()).map_err(|e| {
            ElmUiError::Manifest {
                message: format!("Invalid package version '{}': {e}", self.version),
            }
            .into()
        })
    }

    /// Replace (or add) the range declared for `package`.
    pub fn set_dependency(&mut self, package: impl Into<String>, range: impl Into<String>) {
        self.dependencies.insert(package.into(), range.into());
    }
}

/// Walk up from `start` to the directory holding `elm-package.json`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    elmui_util::fs::find_ancestor_with(start, MANIFEST_FILE)
}
