//! Project-local package cache at `elm-stuff/packages/<owner>/<repo>/<version>/`.

use std::fs;
use std::path::{Path, PathBuf};

use elmui_resolver::PackageId;
use elmui_util::errors::ElmUiError;
use semver::Version;
use tempfile::TempDir;

#[derive(Debug, Clone)]
pub struct PackageCache {
    root: PathBuf,
}

impl PackageCache {
    /// Create a cache rooted at `project_root/elm-stuff/packages/`.
    pub fn new(project_root: &Path) -> Self {
        Self::at(project_root.join("elm-stuff").join("packages"))
    }

    /// Create a cache rooted directly at `root`.
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `package` at `version`.
    ///
    /// Fails for ids that are not a plain `owner/repo`, so a name taken from
    /// a remote manifest can never point outside the cache.
    pub fn package_dir(&self, package: &PackageId, version: &Version) -> miette::Result<PathBuf> {
        if !package.is_owner_repo() {
            return Err(ElmUiError::Manifest {
                message: format!("invalid package name '{package}': expected owner/repo"),
            }
            .into());
        }
        let mut dir = self.root.clone();
        for segment in package.as_str().split('/') {
            dir.push(segment);
        }
        Ok(dir.join(version.to_string()))
    }

    /// Whether `package` at `version` is already unpacked.
    pub fn has(&self, package: &PackageId, version: &Version) -> bool {
        self.package_dir(package, version)
            .map(|dir| dir.is_dir())
            .unwrap_or(false)
    }

    /// Fresh scratch directory inside the cache, on the same filesystem as
    /// the final location so [`Self::commit`] can rename.
    pub fn staging_dir(&self) -> miette::Result<TempDir> {
        fs::create_dir_all(&self.root).map_err(ElmUiError::Io)?;
        tempfile::Builder::new()
            .prefix(".download-")
            .tempdir_in(&self.root)
            .map_err(|e| ElmUiError::Io(e).into())
    }

    /// Move a fully unpacked staging directory into place.
    ///
    /// If another installer got there first, its copy is kept.
    pub fn commit(&self, staged: TempDir, package: &PackageId, version: &Version) -> miette::Result<PathBuf> {
        let target = self.package_dir(package, version)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(ElmUiError::Io)?;
        }
        let staged_path = staged.into_path();
        if let Err(e) = fs::rename(&staged_path, &target) {
            let _ = fs::remove_dir_all(&staged_path);
            if !target.is_dir() {
                return Err(ElmUiError::Io(e).into());
            }
        }
        Ok(target)
    }
}
