//! Package identifiers.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a package, conventionally `owner/repo`.
///
/// The resolver treats it as an opaque key; only the GitHub adapter cares
/// about the owner/repo split.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid package name '{0}': expected owner/repo")]
pub struct InvalidPackageId(pub String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a name read from a manifest, accepting only `owner/repo` where
    /// both segments are plain path components.
    pub fn parse(text: &str) -> Result<Self, InvalidPackageId> {
        let id = Self::new(text);
        if id.is_owner_repo() {
            Ok(id)
        } else {
            Err(InvalidPackageId(text.to_string()))
        }
    }

    /// Whether this id has exactly two segments, neither `.` nor `..`.
    pub fn is_owner_repo(&self) -> bool {
        let mut segments = self.0.split('/');
        let (Some(owner), Some(repo), None) = (segments.next(), segments.next(), segments.next()) else {
            return false;
        };
        [owner, repo].iter().all(|segment| {
            !segment.is_empty()
                && *segment != "."
                && *segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `/`, if any.
    pub fn owner(&self) -> Option<&str> {
        self.0.split_once('/').map(|(owner, _)| owner)
    }

    /// The part after the first `/`, if any.
    pub fn repo(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, repo)| repo)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PackageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for PackageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
