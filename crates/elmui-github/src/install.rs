//! Materialise a resolution into the package cache.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use elmui_resolver::source::FetchError;
use elmui_resolver::{PackageId, Resolution};
use semver::Version;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::archive;
use crate::cache::PackageCache;

/// Where package archives come from.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// The zip archive of `package` at `version`.
    async fn fetch_archive(&self, package: &PackageId, version: &Version) -> Result<Vec<u8>, FetchError>;
}

/// One package that could not be installed.
#[derive(Debug, Clone)]
pub struct InstallFailure {
    pub package: PackageId,
    pub version: Version,
    pub message: String,
}

impl fmt::Display for InstallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.package, self.version, self.message)
    }
}

/// Outcome of an [`Installer::install`] run.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub installed: Vec<(PackageId, Version)>,
    pub up_to_date: Vec<(PackageId, Version)>,
    pub failures: Vec<InstallFailure>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} installed, {} up to date, {} failed",
            self.installed.len(),
            self.up_to_date.len(),
            self.failures.len()
        )
    }
}

pub struct Installer {
    cache: PackageCache,
    source: Arc<dyn ArchiveSource>,
    jobs: usize,
}

impl Installer {
    pub fn new(cache: PackageCache, source: Arc<dyn ArchiveSource>, jobs: usize) -> Self {
        Self {
            cache,
            source,
            jobs: jobs.max(1),
        }
    }

    /// Make every `(package, version)` of `resolution` present in the cache.
    ///
    /// Already-cached packages cost no network access. A failing package is
    /// recorded in the report and does not stop the others.
    pub async fn install(&self, resolution: &Resolution) -> InstallReport {
        let mut report = InstallReport::default();
        let missing: Vec<(PackageId, Version)> = resolution
            .iter()
            .filter_map(|(package, version)| {
                if self.cache.has(package, version) {
                    tracing::debug!("{package} {version} already installed");
                    report.up_to_date.push((package.clone(), version.clone()));
                    None
                } else {
                    Some((package.clone(), version.clone()))
                }
            })
            .collect();
        if missing.is_empty() {
            return report;
        }

        let pending = missing.clone();
        let pb = elmui_util::progress::progress_bar(missing.len() as u64, "Installing");
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut set = JoinSet::new();
        for (package, version) in missing {
            let permit_pool = semaphore.clone();
            let source = self.source.clone();
            let cache = self.cache.clone();
            set.spawn(async move {
                let result = match permit_pool.acquire_owned().await {
                    Ok(_permit) => install_one(&cache, source.as_ref(), &package, &version).await,
                    Err(e) => Err(e.to_string()),
                };
                (package, version, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            pb.inc(1);
            match joined {
                Ok((package, version, Ok(()))) => {
                    tracing::info!("Installed {package} {version}");
                    report.installed.push((package, version));
                }
                Ok((package, version, Err(message))) => {
                    tracing::warn!("Failed to install {package} {version}: {message}");
                    report.failures.push(InstallFailure {
                        package,
                        version,
                        message,
                    });
                }
                Err(e) => tracing::warn!("Install task failed: {e}"),
            }
        }
        pb.finish_and_clear();

        for (package, version) in pending {
            let accounted = report.installed.iter().any(|(p, _)| *p == package)
                || report.failures.iter().any(|f| f.package == package);
            if !accounted {
                report.failures.push(InstallFailure {
                    package,
                    version,
                    message: "install task aborted".to_string(),
                });
            }
        }

        report.installed.sort();
        report.failures.sort_by(|a, b| a.package.cmp(&b.package));
        report
    }
}

async fn install_one(
    cache: &PackageCache,
    source: &dyn ArchiveSource,
    package: &PackageId,
    version: &Version,
) -> Result<(), String> {
    let bytes = source
        .fetch_archive(package, version)
        .await
        .map_err(|e| e.message)?;

    let cache = cache.clone();
    let package = package.clone();
    let version = version.clone();
    tokio::task::spawn_blocking(move || -> miette::Result<()> {
        let staged = cache.staging_dir()?;
        archive::unpack(&bytes, staged.path())?;
        cache.commit(staged, &package, &version)?;
        Ok(())
    })
    .await
    .map_err(|e| format!("unpack task failed: {e}"))?
    .map_err(|e| e.to_string())
}
