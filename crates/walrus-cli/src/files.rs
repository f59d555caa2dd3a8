//! Source discovery and archiving of originals.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use uuid::Uuid;
use walkdir::WalkDir;

const EXTENSIONS: [&str; 2] = ["py", "pyw"];

fn is_python_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Python sources named by `paths`, searching folders recursively.
///
/// Symbolic links met while walking a folder are skipped. The result is
/// sorted and free of duplicates.
pub fn collect(paths: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let metadata = fs::metadata(path)?;
        if metadata.is_dir() {
            for entry in WalkDir::new(path).follow_links(false) {
                let entry = entry?;
                if entry.file_type().is_file() && is_python_source(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if metadata.is_file() && is_python_source(path) {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Where the original of `path` is kept inside `root`: the same relative
/// location, with a fresh uuid appended to the file stem.
pub fn archive_path(path: &Path, root: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    let stem = relative.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
    let mut name = format!("{stem}-{}", Uuid::new_v4());
    if let Some(ext) = relative.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    root.join(relative.with_file_name(name))
}

/// Copies `path` into the archive under `root`, returning the copy's path.
pub fn archive(path: &Path, root: &Path) -> io::Result<PathBuf> {
    let destination = archive_path(path, root);
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(path, &destination)?;
    Ok(destination)
}
