//! Operation: pin GitHub dependencies, resolve, lock, and install packages.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use elmui_core::config::{ElmUiConfig, GlobalConfig};
use elmui_core::lockfile::Lockfile;
use elmui_core::manifest::{ElmPackage, MANIFEST_FILE};
use elmui_github::cache::PackageCache;
use elmui_github::install::{ArchiveSource, InstallReport, Installer};
use elmui_github::source::{call_deadline, GithubSource};
use elmui_resolver::resolver::{DEFAULT_FETCH_TIMEOUT, DEFAULT_JOBS};
use elmui_resolver::source::VersionSource;
use elmui_resolver::{resolve, Constraint, PackageId, Resolution, ResolveOptions};
use elmui_util::errors::ElmUiError;
use elmui_util::progress::{spinner, status, status_warn};

/// Options for an install run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub jobs: usize,
    pub fetch_timeout: Duration,
    /// Print the dependency tree and any re-picked versions.
    pub verbose: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            verbose: false,
        }
    }
}

impl InstallOptions {
    pub fn from_config(config: &GlobalConfig, verbose: bool) -> Self {
        Self {
            jobs: config.network.jobs.max(1),
            fetch_timeout: call_deadline(&config.network),
            verbose,
        }
    }
}

/// What an install run produced.
pub struct InstallOutcome {
    pub resolution: Resolution,
    pub report: InstallReport,
}

/// `elm-ui install` against GitHub.
///
/// Interrupting with Ctrl-C stops the run. The lock file is only written once
/// resolution has completed, and the rewritten manifest only once every
/// package is installed.
pub async fn install(project_root: &Path, config: &GlobalConfig, verbose: bool) -> miette::Result<()> {
    let manifest_path = project_root.join(MANIFEST_FILE);
    let mut manifest = ElmPackage::from_path(&manifest_path)?;
    let ui_config = ElmUiConfig::load(project_root)?;
    let source = Arc::new(GithubSource::from_config(&config.network)?);
    let options = InstallOptions::from_config(config, verbose);

    let work = async {
        let pinned = pin_github_dependencies(&source, &mut manifest, &ui_config).await?;
        let outcome = run_install(project_root, &manifest, source.as_ref(), source.clone(), &options).await?;
        save_pinned_manifest(&manifest_path, &manifest, pinned, &outcome)?;
        Ok::<_, miette::Report>(outcome)
    };

    let outcome = tokio::select! {
        outcome = work => outcome?,
        _ = tokio::signal::ctrl_c() => {
            return Err(ElmUiError::Generic {
                message: "Interrupted".to_string(),
            }
            .into());
        }
    };

    finish(&outcome)
}

/// Resolve `GithubSource` pins for every `github-dependencies` entry.
///
/// Each pinned package's manifest is read at its ref to learn its version;
/// the root manifest's range for it is narrowed to that exact patch release.
/// Returns the number of pinned packages.
pub async fn pin_github_dependencies(
    source: &GithubSource,
    manifest: &mut ElmPackage,
    ui_config: &ElmUiConfig,
) -> miette::Result<usize> {
    for (package, git_ref) in &ui_config.github_dependencies {
        let id = parse_package(package)?;
        let remote = source.manifest_at(&id, git_ref).await?;
        let version = remote.semver()?;
        tracing::info!("Pinning {package} to {version} at '{git_ref}'");

        let constraint = Constraint::exact_patch(&version).map_err(|e| ElmUiError::Manifest {
            message: format!("Cannot pin {package}: {e}"),
        })?;
        let range = constraint.elm_syntax().unwrap_or_else(|| constraint.to_string());
        manifest.set_dependency(package.clone(), range);
        source.pin(id, version, git_ref.clone());
    }
    Ok(ui_config.github_dependencies.len())
}

/// Write back a manifest whose ranges were pinned, unless some package failed
/// to install. Returns whether the file was written.
pub fn save_pinned_manifest(
    path: &Path,
    manifest: &ElmPackage,
    pinned: usize,
    outcome: &InstallOutcome,
) -> miette::Result<bool> {
    if pinned == 0 || !outcome.report.is_success() {
        return Ok(false);
    }
    manifest.write_to(path)?;
    Ok(true)
}

/// Parse the root manifest's dependency ranges.
pub fn root_constraints(manifest: &ElmPackage) -> miette::Result<BTreeMap<PackageId, Constraint>> {
    manifest
        .dependencies
        .iter()
        .map(|(package, range)| {
            let constraint = Constraint::parse(range).map_err(|e| ElmUiError::Manifest {
                message: format!("Invalid version range '{range}' for {package}: {e}"),
            })?;
            Ok((parse_package(package)?, constraint))
        })
        .collect()
}

fn parse_package(name: &str) -> miette::Result<PackageId> {
    PackageId::parse(name).map_err(|e| {
        ElmUiError::Manifest {
            message: e.to_string(),
        }
        .into()
    })
}

/// Resolve `manifest`, write the lock file, and install every package.
pub async fn run_install(
    project_root: &Path,
    manifest: &ElmPackage,
    versions: &dyn VersionSource,
    archives: Arc<dyn ArchiveSource>,
    options: &InstallOptions,
) -> miette::Result<InstallOutcome> {
    let root = root_constraints(manifest)?;

    let sp = spinner("Resolving dependencies...");
    let resolve_options = ResolveOptions {
        jobs: options.jobs,
        fetch_timeout: options.fetch_timeout,
    };
    let result = resolve(&root, versions, &resolve_options).await;
    sp.finish_and_clear();
    let result = result?;

    if options.verbose {
        eprint!("{}", result.tree());
        if !result.repicks.is_empty() {
            eprintln!("{}", result.repicks);
        }
    }

    let lockfile = Lockfile::from_pairs(&result.resolution);
    lockfile.write_to(&Lockfile::path_in(project_root))?;
    tracing::debug!("Wrote lock file with {} packages", lockfile.len());

    let installer = Installer::new(PackageCache::new(project_root), archives, options.jobs);
    let report = installer.install(&result.resolution).await;

    Ok(InstallOutcome {
        resolution: result.resolution,
        report,
    })
}

fn finish(outcome: &InstallOutcome) -> miette::Result<()> {
    for (package, version) in &outcome.report.installed {
        status("Installed", &format!("{package} {version}"));
    }
    if outcome.report.is_success() {
        status("Finished", &outcome.report.to_string());
        return Ok(());
    }

    for failure in &outcome.report.failures {
        status_warn("Failed", &failure.to_string());
    }
    Err(ElmUiError::Network {
        message: format!(
            "{} of {} packages could not be installed",
            outcome.report.failures.len(),
            outcome.resolution.len()
        ),
    }
    .into())
}
