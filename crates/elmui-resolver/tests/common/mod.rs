//! In-memory version source for resolver tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use elmui_resolver::source::{FetchError, VersionSource};
use elmui_resolver::PackageId;
use semver::Version;

#[derive(Default)]
pub struct MemorySource {
    versions: HashMap<PackageId, Vec<Version>>,
    manifests: HashMap<(PackageId, Version), BTreeMap<PackageId, String>>,
    broken: HashSet<(PackageId, Version)>,
    delay: Option<Duration>,
    pub list_calls: AtomicUsize,
    pub manifest_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `package` at each of `versions` with no dependencies.
    pub fn package(mut self, package: &str, versions: &[&str]) -> Self {
        let id = PackageId::from(package);
        for v in versions {
            let version = v.parse::<Version>().unwrap();
            self.manifests
                .entry((id.clone(), version.clone()))
                .or_default();
            self.versions.entry(id.clone()).or_default().push(version);
        }
        self.versions.entry(id).or_default();
        self
    }

    /// Declare that `package@version` depends on each `(dependency, range)`.
    pub fn depends(mut self, package: &str, version: &str, deps: &[(&str, &str)]) -> Self {
        let key = (PackageId::from(package), version.parse::<Version>().unwrap());
        let manifest = self.manifests.entry(key).or_default();
        for (dep, range) in deps {
            manifest.insert(PackageId::from(*dep), range.to_string());
        }
        self
    }

    /// Make the manifest of `package@version` unavailable.
    pub fn broken_manifest(mut self, package: &str, version: &str) -> Self {
        self.broken
            .insert((PackageId::from(package), version.parse::<Version>().unwrap()));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn manifest_calls(&self) -> usize {
        self.manifest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionSource for MemorySource {
    async fn list_versions(&self, package: &PackageId) -> Result<Vec<Version>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.versions.get(package).cloned().unwrap_or_default())
    }

    async fn get_constraints(
        &self,
        package: &PackageId,
        version: &Version,
    ) -> Result<BTreeMap<PackageId, String>, FetchError> {
        self.manifest_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = (package.clone(), version.clone());
        if self.broken.contains(&key) {
            return Err(FetchError::new("HTTP 404"));
        }
        self.manifests
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::new(format!("no manifest for {package} {version}")))
    }
}

pub fn root(entries: &[(&str, &str)]) -> BTreeMap<PackageId, elmui_resolver::Constraint> {
    entries
        .iter()
        .map(|(p, c)| (PackageId::from(*p), elmui_resolver::Constraint::parse(c).unwrap()))
        .collect()
}

pub fn v(s: &str) -> Version {
    s.parse().unwrap()
}
