// ─── Hash Store ───
// Persistent key → hash table used to decide whether a build step's inputs
// changed since the last run.
//
// Lifecycle: construct (optionally `load` a previous table), `add*` the
// current inputs, ask `is_same*`, then `save` once the work is done.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::function::HashFunction;
use crate::core::config::UtilsConfig;
use crate::core::error::{UtilError, UtilResult};
use crate::core::files::{absolute, list_files};

/// A single cache file's worth of hashes.
///
/// `old_hashes` is the baseline read by [`load`](Self::load) and is never
/// modified afterwards; `new_hashes` collects what the current run adds.
///
/// A store is owned by one caller. Sharing one across threads is not
/// supported and nothing here guards against it.
#[derive(Debug, Clone)]
pub struct HashStore {
    function: HashFunction,
    root: String,
    old_hashes: BTreeMap<String, String>,
    new_hashes: BTreeMap<String, String>,
    target: Option<PathBuf>,
}

impl Default for HashStore {
    /// A store with no root: keys are full absolute paths.
    fn default() -> Self {
        Self {
            function: HashFunction::Sha1,
            root: String::new(),
            old_hashes: BTreeMap::new(),
            new_hashes: BTreeMap::new(),
            target: None,
        }
    }
}

impl HashStore {
    /// A store whose keys are relative to `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalized(root.as_ref()),
            ..Self::default()
        }
    }

    /// A store rooted at `root` hashing with the configured function.
    pub fn from_config(config: &UtilsConfig, root: impl AsRef<Path>) -> Self {
        Self::new(root).with_function(config.hash_function)
    }

    /// Cache for a single output file, stored next to it as `<file>.cache`.
    pub fn from_file(path: &Path) -> Self {
        let path = absolute(path);
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut cache_name = path.file_name().unwrap_or_default().to_os_string();
        cache_name.push(".cache");

        let mut store = Self::new(&parent);
        store.load(&parent.join(cache_name));
        store
    }

    /// Cache for a whole directory, stored inside it as `.cache`.
    pub fn from_dir(path: &Path) -> Self {
        let mut store = Self::new(path);
        store.load(&path.join(".cache"));
        store
    }

    pub fn with_function(mut self, function: HashFunction) -> Self {
        self.function = function;
        self
    }

    pub fn function(&self) -> HashFunction {
        self.function
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Where [`save`](Self::save) writes, once known.
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn old_hashes(&self) -> &BTreeMap<String, String> {
        &self.old_hashes
    }

    pub fn new_hashes(&self) -> &BTreeMap<String, String> {
        &self.new_hashes
    }

    /// Whether the cache file this store was loaded from is on disk.
    pub fn exists(&self) -> bool {
        self.target.as_deref().is_some_and(Path::exists)
    }

    // ── Baseline ────────────────────────────────────────

    /// Replace the baseline with the table persisted at `file`.
    ///
    /// A missing file leaves the baseline empty. An unreadable or malformed
    /// file is logged and also leaves the baseline empty, so every input is
    /// reported as changed rather than the load failing.
    pub fn load(&mut self, file: &Path) -> &mut Self {
        self.target = Some(file.to_path_buf());
        self.old_hashes.clear();
        if !file.exists() {
            return self;
        }

        let raw = match std::fs::read_to_string(file) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read cache file {:?}. It will be ignored: {}", file, e);
                return self;
            }
        };

        for (number, line) in raw.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let Some((key, hash)) = line.split_once('=') else {
                warn!(
                    "Corrupt cache file {:?} (line {} has no '='). It will be ignored.",
                    file,
                    number + 1
                );
                self.old_hashes.clear();
                return self;
            };
            self.old_hashes.insert(key.to_string(), hash.to_string());
        }

        debug!("Loaded {} cached hashes from {:?}", self.old_hashes.len(), file);
        self
    }

    // ── Adding inputs ───────────────────────────────────

    /// Record `data` under `key`. Empty strings are ignored.
    pub fn add_str(&mut self, key: &str, data: &str) -> &mut Self {
        self.add_bytes(key, data.as_bytes())
    }

    /// Record `data` under `key`. Empty data is ignored.
    pub fn add_bytes(&mut self, key: &str, data: &[u8]) -> &mut Self {
        if !data.is_empty() {
            self.new_hashes
                .insert(key.to_string(), self.function.hash_bytes(data));
        }
        self
    }

    /// Record a file, or every file under a directory.
    ///
    /// Without a key the root-relative path is used. Files under a directory
    /// are stored as `"<key> - <path inside the directory>"`.
    pub fn add_file(&mut self, key: Option<&str>, path: &Path) -> UtilResult<&mut Self> {
        let key = match key {
            Some(key) => key.to_string(),
            None => self.key_for(path),
        };

        if path.is_dir() {
            let prefix = self.key_for(path);
            for file in list_files(path)? {
                let full = self.key_for(&file);
                let suffix = full.strip_prefix(prefix.as_str()).unwrap_or(full.as_str());
                let hash = self.function.hash_file(&file)?;
                self.new_hashes.insert(format!("{key} - {suffix}"), hash);
            }
        } else {
            let hash = self.function.hash_file(path)?;
            self.new_hashes.insert(key, hash);
        }

        Ok(self)
    }

    pub fn add_path(&mut self, path: &Path) -> UtilResult<&mut Self> {
        self.add_file(None, path)
    }

    pub fn add_paths<I, P>(&mut self, paths: I) -> UtilResult<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self.add_file(None, path.as_ref())?;
        }
        Ok(self)
    }

    /// Forget everything added in this run. The baseline stays loaded.
    pub fn clear(&mut self) -> &mut Self {
        self.new_hashes.clear();
        self
    }

    // ── Queries ─────────────────────────────────────────

    /// Whether `path` still matches the baseline.
    ///
    /// With no baseline entry the answer is `true` only if the file is also
    /// absent. A file that had an entry but was deleted counts as changed.
    /// The current hash is recorded whenever the file exists.
    pub fn is_same_file(&mut self, path: &Path) -> UtilResult<bool> {
        let key = self.key_for(path);

        if !path.exists() {
            return Ok(!self.old_hashes.contains_key(&key));
        }

        let hash = self.function.hash_file(path)?;
        let same = self.old_hashes.get(&key) == Some(&hash);
        self.new_hashes.insert(key, hash);
        Ok(same)
    }

    /// Whether every file still matches, stopping at the first that doesn't.
    pub fn are_same<I, P>(&mut self, paths: I) -> UtilResult<bool>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            if !self.is_same_file(path.as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether this run's table equals the baseline exactly: same keys, same
    /// hashes, nothing missing on either side.
    pub fn is_same(&self) -> bool {
        self.old_hashes == self.new_hashes
    }

    // ── Persistence ─────────────────────────────────────

    /// Write this run's table to the file it was loaded from.
    pub fn save(&self) -> UtilResult<()> {
        let Some(target) = &self.target else {
            return Err(UtilError::IllegalState(
                "HashStore::save() called without load() so there is no target; use load() or save_to()"
                    .into(),
            ));
        };
        self.save_to(target)
    }

    /// Write this run's table to `file` as sorted `key=hash` lines.
    pub fn save_to(&self, file: &Path) -> UtilResult<()> {
        let mut buf = String::new();
        for (key, hash) in &self.new_hashes {
            buf.push_str(key);
            buf.push('=');
            buf.push_str(hash);
            buf.push('\n');
        }

        std::fs::write(file, buf.as_bytes()).map_err(|e| UtilError::io(file, e))
    }

    /// Root-relative, `/`-separated key for `path`. Directories end in `/`.
    fn key_for(&self, path: &Path) -> String {
        let full = normalized(path);
        let relative = full.strip_prefix(self.root.as_str()).unwrap_or(full.as_str());

        let mut key = relative.replace('\\', "/");
        if path.is_dir() && !key.ends_with('/') {
            key.push('/');
        }
        key
    }
}

/// Absolute path string with trailing separators and `.` segments removed,
/// so `build`, `build/` and `./build` all give the same string.
fn normalized(path: &Path) -> String {
    absolute(path)
        .components()
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}
