use std::collections::HashSet;
use std::path::Path;

use crate::core::error::{UtilError, UtilResult};

/// Original (left-hand) class names from a mappings file.
pub fn load_class_whitelist(path: &Path) -> UtilResult<HashSet<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| UtilError::io(path, e))?;
    Ok(parse_class_whitelist(&text))
}

/// Collect original class names from SRG, TSRG (v1 and v2) or ProGuard text.
///
/// Member and package lines are ignored; only class mappings count.
pub fn parse_class_whitelist(text: &str) -> HashSet<String> {
    let mut classes = HashSet::new();

    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        // SRG
        if let Some(rest) = line.strip_prefix("CL:") {
            if let Some(original) = rest.split_whitespace().next() {
                classes.insert(original.to_string());
            }
            continue;
        }
        if ["PK:", "FD:", "MD:"].iter().any(|tag| line.starts_with(tag)) {
            continue;
        }

        // Members are indented in TSRG and ProGuard
        if line.starts_with(char::is_whitespace) || line.starts_with("tsrg2 ") {
            continue;
        }

        // ProGuard: `net.minecraft.Foo -> a:`
        if let Some((original, _)) = line.split_once(" -> ") {
            if line.ends_with(':') {
                classes.insert(original.trim().replace('.', "/"));
            }
            continue;
        }

        // TSRG: `a net/minecraft/Foo`, packages end with `/`
        if let Some(original) = line.split_whitespace().next() {
            if !original.ends_with('/') {
                classes.insert(original.to_string());
            }
        }
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(set: HashSet<String>) -> Vec<String> {
        let mut names: Vec<_> = set.into_iter().collect();
        names.sort();
        names
    }

    #[test]
    fn srg_class_lines() {
        let text = "PK: ./ net/minecraft\nCL: a net/minecraft/A\nFD: a/b net/minecraft/A/field\nCL: b$c net/minecraft/B$C\n";
        assert_eq!(sorted(parse_class_whitelist(text)), vec!["a", "b$c"]);
    }

    #[test]
    fn tsrg_class_lines() {
        let v1 = "a net/minecraft/A\n\tb field_1\n\tc ()V method_1\nnet/ net/\nd net/minecraft/D\n";
        assert_eq!(sorted(parse_class_whitelist(v1)), vec!["a", "d"]);

        let v2 = "tsrg2 obf srg\na net/minecraft/A\n\tb field_1\n";
        assert_eq!(sorted(parse_class_whitelist(v2)), vec!["a"]);
    }

    #[test]
    fn proguard_class_lines() {
        let text = "# comment\nnet.minecraft.client.Main -> a:\n    int field -> b\n";
        assert_eq!(
            sorted(parse_class_whitelist(text)),
            vec!["net/minecraft/client/Main"]
        );
    }

    #[test]
    fn missing_mappings_file_is_an_io_error() {
        let path = std::env::temp_dir().join("forge-utils-no-such-mappings.tsrg");
        assert!(matches!(
            load_class_whitelist(&path),
            Err(UtilError::Io { .. })
        ));
    }
}
