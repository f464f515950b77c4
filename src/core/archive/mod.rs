// ─── Archives ───
// Reproducible jar/zip writing: merging, splitting and packing.
//
// Every entry written here carries a fixed timestamp so identical inputs
// produce byte-identical archives, which keeps hash caches over them stable.

mod jar;
mod manifest;
mod merge;
mod split;
mod whitelist;

use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime};

use crate::core::error::{UtilError, UtilResult};

pub use jar::make_jar;
pub use manifest::{Manifest, ManifestSection};
pub use merge::{merge_jars, merge_jars_with, EntryFilter};
pub use split::{split_jar, split_jar_with, split_jar_with_mappings};
pub use whitelist::{load_class_whitelist, parse_class_whitelist};

/// Name of the jar manifest entry. Matched case-insensitively.
pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";

/// Prefix of service-loader registrations, which are concatenated on merge.
pub const SERVICES_PREFIX: &str = "META-INF/services/";

/// The stable entry time, 1989-11-26 00:00:00 GMT, in epoch milliseconds.
pub const ZIP_TIME_MILLIS: i64 = 628_041_600_000;

/// [`ZIP_TIME_MILLIS`] as an MS-DOS zip timestamp.
pub fn stable_time() -> DateTime {
    DateTime::from_date_and_time(1989, 11, 26, 0, 0, 0).unwrap_or_default()
}

/// Options for a written entry: deflated, stamped with [`stable_time`] when
/// `stable`, otherwise with the zip epoch (1980-01-01).
pub(crate) fn entry_options(stable: bool) -> SimpleFileOptions {
    let time = if stable {
        stable_time()
    } else {
        DateTime::default()
    };
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(time)
}

/// Whether `name` is a jar signature file or signature block.
pub fn is_block_or_sf(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    if !upper.starts_with("META-INF/") {
        return false;
    }
    upper.ends_with(".SF")
        || upper.ends_with(".DSA")
        || upper.ends_with(".RSA")
        || upper.ends_with(".EC")
}

/// Entry name of `file` inside the tree rooted at `base`, `/`-separated.
pub(crate) fn entry_name(base: &Path, file: &Path) -> UtilResult<String> {
    let relative = file.strip_prefix(base).map_err(|_| {
        UtilError::InvalidArgument(format!(
            "{} is not inside {}",
            file.display(),
            base.display()
        ))
    })?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_files_are_recognised() {
        assert!(is_block_or_sf("META-INF/FORGE.SF"));
        assert!(is_block_or_sf("META-INF/forge.rsa"));
        assert!(is_block_or_sf("meta-inf/KEY.DSA"));
        assert!(is_block_or_sf("META-INF/KEY.EC"));
        assert!(!is_block_or_sf("META-INF/MANIFEST.MF"));
        assert!(!is_block_or_sf("net/minecraft/Client.SF"));
    }

    #[test]
    fn stable_time_is_the_fixed_epoch() {
        let time = stable_time();
        assert_eq!(
            (time.year(), time.month(), time.day()),
            (1989, 11, 26)
        );
        assert_eq!((time.hour(), time.minute(), time.second()), (0, 0, 0));
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let base = Path::new("/work/classes");
        let file = base.join("net").join("minecraft").join("Main.class");
        assert_eq!(entry_name(base, &file).unwrap(), "net/minecraft/Main.class");
        assert!(entry_name(base, Path::new("/elsewhere/A.class")).is_err());
    }
}
