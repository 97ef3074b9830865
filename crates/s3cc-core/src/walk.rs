//! Recursive enumeration of the local tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An entry below the base directory that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkError {
    /// Path relative to the base directory, `/` separated.
    pub path: String,
    pub message: String,
}

/// Result of walking a tree: the files found and the entries that failed.
#[derive(Debug, Default)]
pub struct Listing {
    pub files: Vec<PathBuf>,
    pub errors: Vec<WalkError>,
}

/// Regular files under `base_dir`, as paths relative to it, sorted.
///
/// Directories are descended but not returned. Symlinks are not followed
/// into directories; a symlink that points at a regular file is listed,
/// since its content is what would have been uploaded.
///
/// Unreadable entries below `base_dir` are collected in `errors` and the walk
/// goes on. Only a `base_dir` that cannot be read at all is an `Err`.
pub fn find_files(base_dir: &Path) -> Result<Listing> {
    let mut listing = Listing::default();
    for entry in WalkDir::new(base_dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| format!("walk {}", base_dir.display()));
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| rel_string(p.strip_prefix(base_dir).unwrap_or(p)))
                    .unwrap_or_default();
                tracing::error!("{}: cannot list: {}", path, err);
                listing.errors.push(WalkError {
                    path,
                    message: err.to_string(),
                });
                continue;
            }
        };
        let ft = entry.file_type();
        let is_file = if ft.is_symlink() {
            fs::metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false)
        } else {
            ft.is_file()
        };
        if !is_file {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(base_dir)
            .with_context(|| format!("{} is outside {}", entry.path().display(), base_dir.display()))?;
        listing.files.push(rel.to_path_buf());
    }
    listing.files.sort();
    tracing::debug!(
        "found {} files under {} ({} unreadable entries)",
        listing.files.len(),
        base_dir.display(),
        listing.errors.len()
    );
    Ok(listing)
}

/// `rel` with `/` separators, as used in object keys and reports.
fn rel_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
