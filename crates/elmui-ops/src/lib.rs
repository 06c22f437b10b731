pub mod ops_build;
pub mod ops_config;
pub mod ops_install;
pub mod ops_new;
pub mod ops_server;

use std::path::{Path, PathBuf};

use elmui_core::manifest::{find_project_root, MANIFEST_FILE};
use elmui_util::errors::ElmUiError;

/// Locate the project containing `cwd`, or fail with a manifest error.
pub fn project_root(cwd: &Path) -> miette::Result<PathBuf> {
    find_project_root(cwd).ok_or_else(|| {
        ElmUiError::Manifest {
            message: format!("No {MANIFEST_FILE} found in {} or any parent directory", cwd.display()),
        }
        .into()
    })
}
