use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::function::HashFunction;
use crate::core::error::{UtilError, UtilResult};
use crate::core::files::absolute;

/// Hash `file` with every function in one pass over its bytes.
///
/// Returns `None` when the file does not exist.
pub fn bulk_hash(file: &Path, functions: &[HashFunction]) -> UtilResult<Option<Vec<String>>> {
    if !file.exists() {
        return Ok(None);
    }

    let mut hashers: Vec<_> = functions.iter().map(HashFunction::hasher).collect();
    let mut stream = File::open(file).map_err(|e| UtilError::io(file, e))?;
    let mut buffer = [0u8; 8192];
    loop {
        let count = stream.read(&mut buffer).map_err(|e| UtilError::io(file, e))?;
        if count == 0 {
            break;
        }
        for hasher in &mut hashers {
            hasher.update(&buffer[..count]);
        }
    }

    let hashes = functions
        .iter()
        .zip(hashers)
        .map(|(function, hasher)| function.pad(&hasher.finish()))
        .collect();
    Ok(Some(hashes))
}

/// Path of the side-car file holding `function`'s digest of `target`.
pub fn sidecar_path(target: &Path, function: HashFunction) -> PathBuf {
    let mut name = absolute(target).into_os_string();
    name.push(".");
    name.push(function.extension());
    PathBuf::from(name)
}

/// Bring the side-car files of `target` in line with its current contents.
///
/// When `target` is gone every side-car is removed, otherwise each one is
/// rewritten with the bare hex digest.
pub fn update_hash(target: &Path, functions: &[HashFunction]) -> UtilResult<()> {
    let Some(hashes) = bulk_hash(target, functions)? else {
        for function in functions {
            let cache = sidecar_path(target, *function);
            match std::fs::remove_file(&cache) {
                Ok(()) => debug!("Removed stale hash file {:?}", cache),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(UtilError::io(cache, e)),
            }
        }
        return Ok(());
    };

    for (function, hash) in functions.iter().zip(hashes) {
        let cache = sidecar_path(target, *function);
        std::fs::write(&cache, hash.as_bytes()).map_err(|e| UtilError::io(&cache, e))?;
    }
    Ok(())
}

/// [`update_hash`] with every known function.
pub fn update_hash_all(target: &Path) -> UtilResult<()> {
    update_hash(target, &HashFunction::values())
}
