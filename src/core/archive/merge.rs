use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::{ZipArchive, ZipWriter};

use super::manifest::Manifest;
use super::{entry_name, entry_options, is_block_or_sf, MANIFEST_NAME, SERVICES_PREFIX};
use crate::core::config::UtilsConfig;
use crate::core::error::{UtilError, UtilResult};
use crate::core::files::{ensure_parent, list_files};

/// Decides whether `entry` of `input` takes part in a merge.
pub type EntryFilter<'a> = &'a dyn Fn(&Path, &str) -> bool;

/// Where an entry's bytes live until the output is written.
enum Source {
    File(PathBuf),
    Zip { archive: usize, index: usize },
}

struct Info {
    name: String,
    source: Source,
}

/// Merge `inputs` (jars, zips or directory trees) into one jar at `output`.
///
/// The first input providing a name wins, except for the manifest (first one
/// kept, stored separately) and `META-INF/services/*`, whose contents are
/// joined with `\n` in input order. Output order is manifest, signature files,
/// services, then everything else, each group sorted by name, all stamped
/// with the stable time.
///
/// With `strip_signatures` the signature files are dropped and the manifest
/// loses its `*-Digest` attributes.
pub fn merge_jars<P: AsRef<Path>>(
    output: &Path,
    strip_signatures: bool,
    filter: Option<EntryFilter<'_>>,
    inputs: &[P],
) -> UtilResult<()> {
    if output.exists() {
        std::fs::remove_file(output).map_err(|e| {
            UtilError::IllegalState(format!(
                "Could not delete existing output {}: {}",
                output.display(),
                e
            ))
        })?;
    }
    ensure_parent(output)?;

    // Dropped on every return path, releasing the input handles.
    let mut archives: Vec<ZipArchive<File>> = Vec::new();

    let mut manifest: Option<Info> = None;
    let mut signatures: BTreeMap<String, Info> = BTreeMap::new();
    let mut services: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut entries: BTreeMap<String, Info> = BTreeMap::new();

    for input in inputs {
        let input = input.as_ref();
        let mut found = Vec::new();

        if input.is_dir() {
            for file in list_files(input)? {
                let name = entry_name(input, &file)?;
                if filter.is_some_and(|accept| !accept(input, &name)) {
                    continue;
                }
                found.push(Info {
                    name,
                    source: Source::File(file),
                });
            }
        } else {
            let file = File::open(input).map_err(|e| UtilError::io(input, e))?;
            let mut archive = ZipArchive::new(file)?;
            let archive_index = archives.len();

            for index in 0..archive.len() {
                let entry = archive.by_index(index)?;
                if entry.is_dir() {
                    continue;
                }
                let name = entry.name().to_string();
                if filter.is_some_and(|accept| !accept(input, &name)) {
                    continue;
                }
                found.push(Info {
                    name,
                    source: Source::Zip {
                        archive: archive_index,
                        index,
                    },
                });
            }
            archives.push(archive);
        }

        for info in found {
            if info.name.eq_ignore_ascii_case(MANIFEST_NAME) {
                if manifest.is_none() {
                    manifest = Some(info);
                }
            } else if info.name.starts_with(SERVICES_PREFIX) {
                let data = read_source(&mut archives, &info.source)?;
                match services.get_mut(&info.name) {
                    Some(existing) => {
                        existing.push(b'\n');
                        existing.extend_from_slice(&data);
                    }
                    None => {
                        services.insert(info.name, data);
                    }
                }
            } else if is_block_or_sf(&info.name) {
                signatures.entry(info.name.clone()).or_insert(info);
            } else {
                entries.entry(info.name.clone()).or_insert(info);
            }
        }
    }

    let out = File::create(output).map_err(|e| UtilError::io(output, e))?;
    let mut writer = ZipWriter::new(out);

    if let Some(info) = &manifest {
        writer.start_file(info.name.as_str(), entry_options(true))?;
        if strip_signatures {
            let mut parsed = Manifest::parse(&read_source(&mut archives, &info.source)?)?;
            parsed.strip_digests();
            writer.write_all(&parsed.to_bytes())
                .map_err(|e| UtilError::io(output, e))?;
        } else {
            copy_source(&mut archives, &info.source, &mut writer)?;
        }
    }

    if !strip_signatures {
        for info in signatures.values() {
            writer.start_file(info.name.as_str(), entry_options(true))?;
            copy_source(&mut archives, &info.source, &mut writer)?;
        }
    }

    for (name, data) in &services {
        writer.start_file(name.as_str(), entry_options(true))?;
        writer.write_all(data).map_err(|e| UtilError::io(output, e))?;
    }

    for info in entries.values() {
        writer.start_file(info.name.as_str(), entry_options(true))?;
        copy_source(&mut archives, &info.source, &mut writer)?;
    }

    writer.finish()?;

    debug!(
        "Merged {} inputs into {:?}: {} entries, {} services, {} signatures{}",
        inputs.len(),
        output,
        entries.len(),
        services.len(),
        signatures.len(),
        if strip_signatures { " (stripped)" } else { "" }
    );
    Ok(())
}

/// [`merge_jars`] taking the signature policy from `config`.
pub fn merge_jars_with<P: AsRef<Path>>(
    config: &UtilsConfig,
    output: &Path,
    filter: Option<EntryFilter<'_>>,
    inputs: &[P],
) -> UtilResult<()> {
    merge_jars(output, config.strip_signatures, filter, inputs)
}

fn read_source(archives: &mut [ZipArchive<File>], source: &Source) -> UtilResult<Vec<u8>> {
    let mut data = Vec::new();
    copy_source(archives, source, &mut data)?;
    Ok(data)
}

fn copy_source<W: Write>(
    archives: &mut [ZipArchive<File>],
    source: &Source,
    out: &mut W,
) -> UtilResult<()> {
    match source {
        Source::File(path) => {
            let mut file = File::open(path).map_err(|e| UtilError::io(path, e))?;
            std::io::copy(&mut file, out).map_err(|e| UtilError::io(path, e))?;
        }
        Source::Zip { archive, index } => {
            let archive = archives.get_mut(*archive).ok_or_else(|| {
                UtilError::IllegalState(format!("No open archive #{archive} for entry #{index}"))
            })?;
            let mut entry = archive.by_index(*index)?;
            std::io::copy(&mut entry, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{names, read_zip, scratch, write_zip};
    use super::*;

    fn content(path: &Path, name: &str) -> Vec<u8> {
        read_zip(path)
            .into_iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, data)| data)
            .unwrap_or_else(|| panic!("{name} missing"))
    }

    #[test]
    fn first_input_wins_and_output_is_sorted() {
        let dir = scratch("merge-first-wins");
        let a = dir.join("a.jar");
        let b = dir.join("b.jar");
        write_zip(&a, &[("z/Last.class", "a-last"), ("shared.txt", "from a")]);
        write_zip(&b, &[("shared.txt", "from b"), ("a/First.class", "b-first")]);

        let out = dir.join("out/merged.jar");
        merge_jars(&out, true, None, &[&a, &b]).unwrap();

        assert_eq!(
            names(&out),
            vec!["a/First.class", "shared.txt", "z/Last.class"]
        );
        assert_eq!(content(&out, "shared.txt"), b"from a");

        let swapped = dir.join("out/swapped.jar");
        merge_jars(&swapped, true, None, &[&b, &a]).unwrap();
        assert_eq!(content(&swapped, "shared.txt"), b"from b");
        assert_eq!(content(&swapped, "a/First.class"), b"b-first");
        assert_eq!(content(&swapped, "z/Last.class"), b"a-last");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn merging_twice_is_byte_identical() {
        let dir = scratch("merge-deterministic");
        let a = dir.join("a.jar");
        let b = dir.join("b.jar");
        write_zip(&a, &[("pkg/A.class", "AAAA"), ("META-INF/services/x.Y", "a.Impl")]);
        write_zip(&b, &[("pkg/B.class", "BBBB"), ("META-INF/services/x.Y", "b.Impl")]);

        let first = dir.join("first.jar");
        let second = dir.join("second.jar");
        merge_jars(&first, true, None, &[&a, &b]).unwrap();
        merge_jars(&second, true, None, &[&a, &b]).unwrap();

        let first_bytes = std::fs::read(&first).unwrap();
        assert_eq!(first_bytes, std::fs::read(&second).unwrap());

        // First local header: time then date of 1989-11-26 in MS-DOS encoding
        assert_eq!(&first_bytes[10..14], &[0x00, 0x00, 0x7a, 0x13]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn services_are_concatenated_in_input_order() {
        let dir = scratch("merge-services");
        let a = dir.join("a.jar");
        let b = dir.join("b.jar");
        write_zip(&a, &[("META-INF/services/com.X", "first.Impl")]);
        write_zip(&b, &[("META-INF/services/com.X", "second.Impl")]);

        let out = dir.join("merged.jar");
        merge_jars(&out, false, None, &[&a, &b]).unwrap();
        assert_eq!(
            content(&out, "META-INF/services/com.X"),
            b"first.Impl\nsecond.Impl"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn manifest_and_signatures_come_first() {
        let dir = scratch("merge-signed");
        let signed = dir.join("signed.jar");
        let manifest = "Manifest-Version: 1.0\r\n\r\nName: a/A.class\r\nSHA-256-Digest: xyz=\r\n\r\n";
        write_zip(
            &signed,
            &[
                ("a/A.class", "A"),
                ("META-INF/SERVICES/ignored", ""),
                ("META-INF/FORGE.SF", "sf"),
                ("META-INF/FORGE.RSA", "rsa"),
                ("META-INF/MANIFEST.MF", manifest),
                ("META-INF/services/com.X", "impl"),
            ],
        );
        let other = dir.join("other.jar");
        write_zip(&other, &[("META-INF/manifest.mf", "Manifest-Version: 2.0\r\n\r\n")]);

        let kept = dir.join("kept.jar");
        merge_jars(&kept, false, None, &[&signed, &other]).unwrap();
        assert_eq!(
            names(&kept),
            vec![
                "META-INF/MANIFEST.MF",
                "META-INF/FORGE.RSA",
                "META-INF/FORGE.SF",
                "META-INF/services/com.X",
                "META-INF/SERVICES/ignored",
                "a/A.class",
            ]
        );
        assert_eq!(content(&kept, "META-INF/MANIFEST.MF"), manifest.as_bytes());

        let stripped = dir.join("stripped.jar");
        merge_jars(&stripped, true, None, &[&signed, &other]).unwrap();
        let stripped_names = names(&stripped);
        assert_eq!(stripped_names[0], "META-INF/MANIFEST.MF");
        assert!(!stripped_names.iter().any(|name| is_block_or_sf(name)));
        let text = String::from_utf8(content(&stripped, "META-INF/MANIFEST.MF")).unwrap();
        assert_eq!(text, "Manifest-Version: 1.0\r\n\r\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directories_and_filters_take_part() {
        let dir = scratch("merge-dirs");
        let classes = dir.join("classes");
        std::fs::create_dir_all(classes.join("net/minecraft")).unwrap();
        std::fs::write(classes.join("net/minecraft/Main.class"), b"main").unwrap();
        std::fs::write(classes.join("skip.txt"), b"skip").unwrap();
        let jar = dir.join("lib.jar");
        write_zip(&jar, &[("lib/", ""), ("lib/Util.class", "util"), ("net/minecraft/Main.class", "dupe")]);

        let out = dir.join("merged.jar");
        let filter = |_: &Path, name: &str| !name.ends_with(".txt");
        merge_jars(&out, true, Some(&filter), &[&classes, &jar]).unwrap();

        assert_eq!(names(&out), vec!["lib/Util.class", "net/minecraft/Main.class"]);
        assert_eq!(content(&out, "net/minecraft/Main.class"), b"main");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn existing_output_is_replaced() {
        let dir = scratch("merge-replace");
        let a = dir.join("a.jar");
        write_zip(&a, &[("A.class", "a")]);
        let out = dir.join("out.jar");
        std::fs::write(&out, b"stale").unwrap();

        let config = UtilsConfig::default();
        merge_jars_with(&config, &out, None, &[&a]).unwrap();
        assert_eq!(names(&out), vec!["A.class"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn undeletable_output_is_illegal_state() {
        let dir = scratch("merge-undeletable");
        let a = dir.join("a.jar");
        write_zip(&a, &[("A.class", "a")]);
        let out = dir.join("is-a-dir.jar");
        std::fs::create_dir_all(out.join("child")).unwrap();

        let err = merge_jars(&out, true, None, &[&a]).unwrap_err();
        assert!(matches!(err, UtilError::IllegalState(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
