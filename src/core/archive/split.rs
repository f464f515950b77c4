use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use tracing::debug;
use zip::{ZipArchive, ZipWriter};

use super::entry_options;
use super::whitelist::load_class_whitelist;
use crate::core::config::UtilsConfig;
use crate::core::error::{UtilError, UtilResult};
use crate::core::files::ensure_parent;

/// Copy one half of the jar at `raw` into `output`.
///
/// A class is whitelisted when its name without `.class` is in `whitelist`.
/// The slim half (`slim == true`) holds every class that is *not*
/// whitelisted; the other half holds the whitelisted classes plus every
/// non-class entry. Together the two halves contain each class exactly once.
///
/// `stable` stamps entries with the fixed epoch, otherwise with the zip epoch.
pub fn split_jar(
    raw: &Path,
    whitelist: &HashSet<String>,
    output: &Path,
    slim: bool,
    stable: bool,
) -> UtilResult<()> {
    if raw.is_dir() {
        return Err(UtilError::UnsupportedOperation(format!(
            "Only jar files can be split, {} is a directory",
            raw.display()
        )));
    }

    let input = File::open(raw).map_err(|e| UtilError::io(raw, e))?;
    let mut archive = ZipArchive::new(input)?;

    ensure_parent(output)?;
    let out = File::create(output).map_err(|e| UtilError::io(output, e))?;
    let mut writer = ZipWriter::new(out);

    let mut written = 0usize;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        let keep = match name.strip_suffix(".class") {
            Some(class) => slim != whitelist.contains(class),
            None => !slim,
        };
        if !keep {
            continue;
        }

        if entry.is_dir() {
            writer.add_directory(name.as_str(), entry_options(stable))?;
        } else {
            writer.start_file(name.as_str(), entry_options(stable))?;
            std::io::copy(&mut entry, &mut writer).map_err(|e| UtilError::io(raw, e))?;
        }
        written += 1;
    }

    writer.finish()?;
    debug!(
        "Split {:?} into {:?} ({} entries, {})",
        raw,
        output,
        written,
        if slim { "slim" } else { "extra" }
    );
    Ok(())
}

/// [`split_jar`] taking the timestamp policy from `config`.
pub fn split_jar_with(
    config: &UtilsConfig,
    raw: &Path,
    whitelist: &HashSet<String>,
    output: &Path,
    slim: bool,
) -> UtilResult<()> {
    split_jar(raw, whitelist, output, slim, config.stable_timestamps)
}

/// [`split_jar`] with the whitelist read from a mappings file.
pub fn split_jar_with_mappings(
    raw: &Path,
    mappings: &Path,
    output: &Path,
    slim: bool,
    stable: bool,
) -> UtilResult<()> {
    let whitelist = load_class_whitelist(mappings)?;
    split_jar(raw, &whitelist, output, slim, stable)
}
