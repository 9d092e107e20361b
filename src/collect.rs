// Path collection for uploads: expands the path given on the command line
// into the ordered list of files to send.

use crate::error::{CliError, Result};
use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files come before directories, then names sort lexicographically. With a
/// depth-first walk this yields every file of a directory before anything
/// found in its subdirectories.
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Absolute form of `path` with `.` and `..` resolved lexically, so one
/// file always maps to one remote name.
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Absolute paths of the regular files under `path`.
///
/// A file yields itself. A directory yields its direct files, or every file
/// at any depth when `recursive` is set. Symlinks are followed everywhere,
/// the root included; entries closing a symlink loop are skipped.
pub fn collect(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let root = normalize(path)?;
    let meta = std::fs::metadata(&root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CliError::NotFound(root.clone()),
        _ => CliError::Io(e),
    })?;

    if meta.is_file() {
        return Ok(vec![root]);
    }
    if !meta.is_dir() {
        return Err(CliError::NotAFile(root));
    }

    let mut walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(true)
        .sort_by(files_first);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.loop_ancestor().is_some() => {
                tracing::warn!(error = %e, "skipping symlink loop");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    tracing::debug!(root = %root.display(), count = files.len(), recursive, "collected files");
    Ok(files)
}
