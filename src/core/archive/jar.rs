use std::fs::File;
use std::path::{Path, PathBuf};

use zip::ZipWriter;

use super::{entry_name, entry_options};
use crate::core::error::{UtilError, UtilResult};
use crate::core::files::{absolute, ensure_parent, list_files};

/// Pack compiled classes and their sources into `jar`.
///
/// Every file under `classes` is written first, then each of `sources`
/// (named relative to `sources_dir`); both groups sorted by path. Returns the
/// jar path for chaining into further steps.
pub fn make_jar(
    classes: &Path,
    sources_dir: &Path,
    sources: &[PathBuf],
    jar: &Path,
) -> UtilResult<PathBuf> {
    ensure_parent(jar)?;
    let out = File::create(jar).map_err(|e| UtilError::io(jar, e))?;
    let mut writer = ZipWriter::new(out);

    let classes_root = absolute(classes);
    let mut class_files: Vec<PathBuf> = list_files(classes)?.iter().map(|f| absolute(f)).collect();
    class_files.sort();
    write_tree(&mut writer, &classes_root, &class_files)?;

    let sources_root = absolute(sources_dir);
    let mut source_files: Vec<PathBuf> = sources.iter().map(|f| absolute(f)).collect();
    source_files.sort();
    write_tree(&mut writer, &sources_root, &source_files)?;

    writer.finish()?;
    Ok(jar.to_path_buf())
}

fn write_tree(writer: &mut ZipWriter<File>, root: &Path, files: &[PathBuf]) -> UtilResult<()> {
    for file in files {
        let name = entry_name(root, file)?;
        writer.start_file(name.as_str(), entry_options(true))?;
        let mut input = File::open(file).map_err(|e| UtilError::io(file, e))?;
        std::io::copy(&mut input, writer).map_err(|e| UtilError::io(file, e))?;
    }
    Ok(())
}
