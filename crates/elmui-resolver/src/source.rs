//! The seam between the resolver and wherever versions actually come from.

use std::collections::BTreeMap;

use async_trait::async_trait;
use semver::Version;
use thiserror::Error;

use crate::package::PackageId;

/// A version source could not answer: network failure, timeout, or a
/// manifest that could not be retrieved or parsed.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where the resolver learns which versions exist and what they depend on.
///
/// Implementations own their retry policy; the resolver never retries.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// All published versions of `package`, in any order.
    ///
    /// A package without parseable version tags yields an empty list, not an error.
    async fn list_versions(&self, package: &PackageId) -> Result<Vec<Version>, FetchError>;

    /// The raw dependency ranges declared by `package` at `version`.
    async fn get_constraints(
        &self,
        package: &PackageId,
        version: &Version,
    ) -> Result<BTreeMap<PackageId, String>, FetchError>;
}
