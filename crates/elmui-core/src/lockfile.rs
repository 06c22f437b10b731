use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use elmui_util::errors::ElmUiError;

/// Lock file location relative to the project root.
pub const LOCKFILE_PATH: &str = "elm-stuff/exact-dependencies.json";

/// Exact resolved versions, keyed by package id (`elm-stuff/exact-dependencies.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockfile {
    pub packages: BTreeMap<String, String>,
}

impl Lockfile {
    /// Build a lock file from `(package, version)` pairs.
    pub fn from_pairs<I, P, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        P: ToString,
        V: ToString,
    {
        Self {
            packages: pairs
                .into_iter()
                .map(|(p, v)| (p.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn path_in(project_root: &Path) -> PathBuf {
        project_root.join(LOCKFILE_PATH)
    }

    /// Load and parse a lock file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ElmUiError::Generic {
            message: format!("Failed to read lock file: {e}"),
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ElmUiError::Generic {
                message: format!("Failed to parse lock file: {e}"),
            }
            .into()
        })
    }

    /// Load the project's lock file if it exists.
    pub fn load(project_root: &Path) -> miette::Result<Option<Self>> {
        let path = Self::path_in(project_root);
        if !path.is_file() {
            return Ok(None);
        }
        Self::from_path(&path).map(Some)
    }

    /// Write pretty JSON, creating `elm-stuff/` if needed.
    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ElmUiError::Io)?;
        }
        let mut content = serde_json::to_string_pretty(self).map_err(|e| ElmUiError::Generic {
            message: format!("Failed to serialize lock file: {e}"),
        })?;
        content.push('\n');
        std::fs::write(path, content).map_err(ElmUiError::Io)?;
        Ok(())
    }

    pub fn version_of(&self, package: &str) -> Option<&str> {
        self.packages.get(package).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
