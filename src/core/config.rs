use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{UtilError, UtilResult};
use crate::core::hash::HashFunction;

/// Settings shared by the hash cache, the archive helpers and logging.
///
/// Passed explicitly to whatever needs it; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilsConfig {
    /// Algorithm used by hash stores built from this config.
    pub hash_function: HashFunction,
    /// Drop signature files and manifest digests when merging jars.
    pub strip_signatures: bool,
    /// Stamp written zip entries with the fixed epoch instead of the zip epoch.
    pub stable_timestamps: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for UtilsConfig {
    fn default() -> Self {
        Self {
            hash_function: HashFunction::Sha1,
            strip_signatures: true,
            stable_timestamps: true,
            log_filter: "info,forge_utils=debug".to_string(),
        }
    }
}

impl UtilsConfig {
    /// Read a JSON config. A missing file yields the defaults.
    pub fn load(path: &Path) -> UtilResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(UtilError::io(path, e)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> UtilResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| UtilError::io(path, e))
    }
}
