//! Per-resolution memo of version lists and manifests.
//!
//! A [`SessionCache`] lives exactly as long as one `resolve` call, so repeated
//! or concurrent resolutions never share state.

use std::collections::{BTreeMap, HashMap};

use semver::Version;

use crate::package::PackageId;

type Manifest = BTreeMap<PackageId, String>;

#[derive(Debug, Default)]
pub struct SessionCache {
    versions: HashMap<PackageId, Vec<Version>>,
    manifests: HashMap<(PackageId, Version), Manifest>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_versions(&self, package: &PackageId) -> bool {
        self.versions.contains_key(package)
    }

    /// Store a version list, sorted highest first with duplicates removed.
    pub fn put_versions(&mut self, package: PackageId, mut versions: Vec<Version>) {
        versions.sort_by(|a, b| b.cmp(a));
        versions.dedup();
        self.versions.insert(package, versions);
    }

    /// Cached versions of `package`, highest first.
    pub fn versions(&self, package: &PackageId) -> Option<&[Version]> {
        self.versions.get(package).map(Vec::as_slice)
    }

    pub fn manifest(&self, package: &PackageId, version: &Version) -> Option<&Manifest> {
        self.manifests.get(&(package.clone(), version.clone()))
    }

    pub fn put_manifest(&mut self, package: PackageId, version: Version, manifest: Manifest) {
        self.manifests.insert((package, version), manifest);
    }
}
