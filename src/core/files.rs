use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::error::{UtilError, UtilResult};

/// Absolute form of `path` without touching the filesystem.
///
/// Falls back to the path as given when the working directory is unavailable.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Recursively list every regular file under `dir`, sorted by path.
///
/// A directory that does not exist yields an empty list. Anything that exists
/// but is not a directory is rejected.
pub fn list_files(dir: &Path) -> UtilResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    if !dir.is_dir() {
        return Err(UtilError::InvalidArgument(format!(
            "Path must be directory: {}",
            absolute(dir).display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            UtilError::io(path, e.into())
        })?;

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Create the parent directories of `path` if they are missing.
pub fn ensure_parent(path: &Path) -> UtilResult<()> {
    let path = absolute(path);
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| UtilError::io(parent, e))?;
        }
    }
    Ok(())
}

/// Create `path` as a directory, along with any missing parents.
pub fn ensure(path: &Path) -> UtilResult<()> {
    ensure_parent(path)?;
    if !path.is_dir() {
        std::fs::create_dir(path).map_err(|e| UtilError::io(path, e))?;
    }
    Ok(())
}
