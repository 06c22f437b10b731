//! Zip unpacking for package archives.
//!
//! GitHub wraps every archive in a single `<repo>-<ref>/` directory, which
//! [`flatten_single_child`] strips after extraction.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use elmui_util::errors::ElmUiError;

/// Extract an in-memory zip archive into `dest`.
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> miette::Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ElmUiError::Network {
        message: format!("Downloaded archive is not a valid zip: {e}"),
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ElmUiError::Generic {
            message: format!("Zip entry error: {e}"),
        })?;

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry '{}'", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(ElmUiError::Io)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(ElmUiError::Io)?;
        }
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).map_err(|e| ElmUiError::Generic {
            message: format!("Failed to read zip entry '{}': {e}", entry.name()),
        })?;
        fs::write(&out_path, &buf).map_err(ElmUiError::Io)?;
    }
    Ok(())
}

/// If `dir` holds exactly one entry and it is a directory, move that
/// directory's contents up into `dir`.
pub fn flatten_single_child(dir: &Path) -> miette::Result<()> {
    let entries: Vec<_> = fs::read_dir(dir)
        .map_err(ElmUiError::Io)?
        .filter_map(|e| e.ok())
        .collect();

    let [only] = entries.as_slice() else {
        return Ok(());
    };
    if !only.path().is_dir() {
        return Ok(());
    }

    // Rename first so a grandchild sharing the wrapper's name cannot collide.
    let wrapper = dir.join(".elm-ui-unwrap");
    fs::rename(only.path(), &wrapper).map_err(ElmUiError::Io)?;
    for entry in fs::read_dir(&wrapper).map_err(ElmUiError::Io)? {
        let entry = entry.map_err(ElmUiError::Io)?;
        fs::rename(entry.path(), dir.join(entry.file_name())).map_err(ElmUiError::Io)?;
    }
    fs::remove_dir(&wrapper).map_err(ElmUiError::Io)?;
    Ok(())
}

/// Extract `bytes` into `dest` and strip the wrapper directory.
pub fn unpack(bytes: &[u8], dest: &Path) -> miette::Result<()> {
    extract_zip(bytes, dest)?;
    flatten_single_child(dest)
}
