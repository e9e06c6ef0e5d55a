// src/fs/mod.rs

//! Read-only filesystem view used to count produced tiles.
//!
//! Progress polling walks the whole output tree on every tick; going through
//! [`FileSystem`] lets tests drive it with [`mock::MockFileSystem`].

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::trace;

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;

    /// True for real directories only; a symlink to a directory is not one,
    /// so walks never descend through links.
    fn is_dir(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

/// Count files under `root` whose extension matches `ext` (case-insensitive).
///
/// Directories that disappear or cannot be read mid-walk are skipped; the
/// backend is writing into this tree while we count. Symlinked directories
/// are not followed.
pub fn count_files_with_extension(fs: &dyn FileSystem, root: &Path, ext: &str) -> u64 {
    let ext = ext.trim_start_matches('.');
    let mut count = 0;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                trace!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };

        for entry in entries {
            if fs.is_dir(&entry) {
                pending.push(entry);
            } else if has_extension(&entry, ext) && fs.is_file(&entry) {
                count += 1;
            }
        }
    }

    count
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
