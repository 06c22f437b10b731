//! Core resolution algorithm: greedy highest-version picks driven by a
//! worklist, with constraints propagated through each pick's manifest.
//!
//! Picks are never backtracked across packages. When a later constraint rules
//! out an earlier pick, that package is re-picked lower within its tightened
//! range and the abandoned pick is recorded in the [`ConflictReport`].

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::future::Future;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use semver::Version;

use crate::cache::SessionCache;
use crate::conflict::{ConflictReport, Repick, ResolveError};
use crate::graph::{DependencyGraph, Requirer, Tightening};
use crate::package::PackageId;
use crate::source::{FetchError, VersionSource};
use crate::version::Constraint;

pub const DEFAULT_JOBS: usize = 8;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Final mapping of every required package to one exact version.
pub type Resolution = BTreeMap<PackageId, Version>;

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Upper bound on concurrent version-list fetches.
    pub jobs: usize,
    /// Deadline applied to each individual source call.
    pub fetch_timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// The output of dependency resolution.
#[derive(Debug)]
pub struct ResolutionResult {
    pub resolution: Resolution,
    pub graph: DependencyGraph,
    pub repicks: ConflictReport,
}

impl ResolutionResult {
    /// Render the resolved dependency tree.
    pub fn tree(&self) -> String {
        self.graph.print_tree(&self.resolution)
    }
}

/// FIFO queue that holds each package at most once.
#[derive(Default)]
struct Worklist {
    queue: VecDeque<PackageId>,
    queued: HashSet<PackageId>,
}

impl Worklist {
    fn push(&mut self, package: PackageId) {
        if self.queued.insert(package.clone()) {
            self.queue.push_back(package);
        }
    }

    fn pop(&mut self) -> Option<PackageId> {
        let package = self.queue.pop_front()?;
        self.queued.remove(&package);
        Some(package)
    }

    fn iter(&self) -> impl Iterator<Item = &PackageId> {
        self.queue.iter()
    }
}

/// Resolve `root` against `source`.
///
/// Returns the first fatal error encountered; no partial resolution is
/// produced on failure.
pub async fn resolve(
    root: &BTreeMap<PackageId, Constraint>,
    source: &dyn VersionSource,
    options: &ResolveOptions,
) -> Result<ResolutionResult, ResolveError> {
    let mut graph = DependencyGraph::new();
    let mut cache = SessionCache::new();
    let mut repicks = ConflictReport::new();
    let mut picks = Resolution::new();
    let mut worklist = Worklist::default();

    for (package, constraint) in root {
        graph.constrain(&Requirer::Root, package, constraint.clone())?;
        worklist.push(package.clone());
    }

    loop {
        prefetch_versions(&worklist, &mut cache, source, options).await?;

        let Some(package) = worklist.pop() else {
            break;
        };
        let Some(constraint) = graph.constraint_of(&package).cloned() else {
            continue;
        };

        let versions = cache.versions(&package).unwrap_or(&[]);
        let Some(pick) = versions.iter().find(|v| constraint.allows(v)).cloned() else {
            return Err(ResolveError::NoSatisfyingVersion {
                available: versions.len(),
                required_by: graph.describe_dependents(&package),
                package,
                constraint,
            });
        };

        match picks.insert(package.clone(), pick.clone()) {
            Some(previous) if previous == pick => continue,
            Some(previous) => {
                tracing::debug!("Re-picking {package}: {previous} -> {pick} ({constraint})");
                repicks.add(Repick {
                    package: package.clone(),
                    abandoned: previous,
                    picked: pick.clone(),
                    constraint: constraint.clone(),
                });
            }
            None => tracing::debug!("Picked {package} {pick} ({constraint})"),
        }

        let manifest = manifest_of(&package, &pick, &mut cache, source, options).await?;
        let requirer = Requirer::Package {
            id: package.clone(),
            version: pick,
        };
        for (dependency, raw) in manifest {
            let range = Constraint::parse(&raw).map_err(|e| ResolveError::Parse {
                package: dependency.clone(),
                requirer: requirer.to_string(),
                raw: raw.clone(),
                reason: e.to_string(),
            })?;
            match graph.constrain(&requirer, &dependency, range)? {
                Tightening::New | Tightening::Tightened => worklist.push(dependency),
                Tightening::Unchanged => {}
            }
        }
    }

    let reachable = graph.reachable(&picks);
    let before = picks.len();
    picks.retain(|package, _| reachable.contains(package));
    if picks.len() < before {
        tracing::debug!("Pruned {} package(s) only required by abandoned picks", before - picks.len());
    }

    Ok(ResolutionResult {
        resolution: picks,
        graph,
        repicks,
    })
}

/// Fetch version lists for every queued package not yet cached, at most
/// `options.jobs` in flight.
async fn prefetch_versions(
    worklist: &Worklist,
    cache: &mut SessionCache,
    source: &dyn VersionSource,
    options: &ResolveOptions,
) -> Result<(), ResolveError> {
    let missing: Vec<PackageId> = worklist
        .iter()
        .filter(|p| !cache.has_versions(p))
        .cloned()
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    tracing::debug!("Fetching version lists for {} package(s)", missing.len());

    let timeout = options.fetch_timeout;
    let mut fetches = stream::iter(missing)
        .map(|package| async move {
            let result = with_timeout(timeout, source.list_versions(&package)).await;
            (package, result)
        })
        .buffer_unordered(options.jobs.max(1));

    while let Some((package, result)) = fetches.next().await {
        let versions = result.map_err(|e| ResolveError::Fetch {
            package: package.clone(),
            version: None,
            message: e.message,
        })?;
        cache.put_versions(package, versions);
    }
    Ok(())
}

async fn manifest_of(
    package: &PackageId,
    version: &Version,
    cache: &mut SessionCache,
    source: &dyn VersionSource,
    options: &ResolveOptions,
) -> Result<BTreeMap<PackageId, String>, ResolveError> {
    if let Some(manifest) = cache.manifest(package, version) {
        return Ok(manifest.clone());
    }
    let manifest = with_timeout(options.fetch_timeout, source.get_constraints(package, version))
        .await
        .map_err(|e| ResolveError::Fetch {
            package: package.clone(),
            version: Some(version.clone()),
            message: e.message,
        })?;
    cache.put_manifest(package.clone(), version.clone(), manifest.clone());
    Ok(manifest)
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::new(format!(
            "timed out after {}s",
            limit.as_secs_f64()
        ))),
    }
}
