// ─── Jar Manifest ───
// Minimal reader/writer for `META-INF/MANIFEST.MF`, enough to strip stale
// signature digests while keeping every other attribute.

use crate::core::error::{UtilError, UtilResult};

const LINE_LIMIT: usize = 72;

/// A named `Name: ...` section and its attributes, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSection {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

/// Parsed manifest: main attributes followed by per-entry sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub main: Vec<(String, String)>,
    pub sections: Vec<ManifestSection>,
}

impl Manifest {
    pub fn parse(bytes: &[u8]) -> UtilResult<Self> {
        let text = String::from_utf8_lossy(bytes);
        let mut manifest = Manifest::default();

        // Unfold continuation lines first; each block is one section.
        let mut blocks: Vec<Vec<String>> = vec![Vec::new()];
        for line in text.lines() {
            if line.is_empty() {
                if blocks.last().is_some_and(|block| !block.is_empty()) {
                    blocks.push(Vec::new());
                }
                continue;
            }

            let block = blocks.last_mut().ok_or_else(|| invalid("empty manifest"))?;
            if let Some(rest) = line.strip_prefix(' ') {
                let previous = block
                    .last_mut()
                    .ok_or_else(|| invalid("continuation line without a header"))?;
                previous.push_str(rest);
            } else {
                block.push(line.to_string());
            }
        }

        for (index, block) in blocks.into_iter().enumerate() {
            if block.is_empty() {
                continue;
            }

            let mut attributes = Vec::with_capacity(block.len());
            for line in &block {
                let (key, value) = line
                    .split_once(": ")
                    .ok_or_else(|| invalid(&format!("invalid header field: {line}")))?;
                attributes.push((key.to_string(), value.to_string()));
            }

            if index == 0 {
                manifest.main = attributes;
                continue;
            }

            let (first_key, name) = attributes.remove(0);
            if !first_key.eq_ignore_ascii_case("Name") {
                return Err(invalid(&format!(
                    "section must start with Name, found {first_key}"
                )));
            }
            manifest.sections.push(ManifestSection { name, attributes });
        }

        Ok(manifest)
    }

    /// Remove every `*-Digest` attribute, then any section left empty.
    pub fn strip_digests(&mut self) {
        fn is_digest((key, _): &(String, String)) -> bool {
            key.to_ascii_lowercase().ends_with("-digest")
        }

        self.main.retain(|attribute| !is_digest(attribute));
        for section in &mut self.sections {
            section.attributes.retain(|attribute| !is_digest(attribute));
        }
        self.sections.retain(|section| !section.attributes.is_empty());
    }

    /// Serialize with CRLF line endings and 72-byte line wrapping.
    ///
    /// The version attribute, if any, is written first in the main section.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        let is_version = |key: &str| {
            key.eq_ignore_ascii_case("Manifest-Version")
                || key.eq_ignore_ascii_case("Signature-Version")
        };
        for (key, value) in self.main.iter().filter(|(key, _)| is_version(key.as_str())) {
            write_header(&mut out, key, value);
        }
        for (key, value) in self.main.iter().filter(|(key, _)| !is_version(key.as_str())) {
            write_header(&mut out, key, value);
        }
        out.extend_from_slice(b"\r\n");

        for section in &self.sections {
            write_header(&mut out, "Name", &section.name);
            for (key, value) in &section.attributes {
                write_header(&mut out, key, value);
            }
            out.extend_from_slice(b"\r\n");
        }

        out
    }
}

fn write_header(out: &mut Vec<u8>, key: &str, value: &str) {
    let line = format!("{key}: {value}");
    let mut budget = LINE_LIMIT;
    let mut current = 0;

    for (offset, ch) in line.char_indices() {
        let end = offset + ch.len_utf8();
        if end - current > budget {
            out.extend_from_slice(line[current..offset].as_bytes());
            out.extend_from_slice(b"\r\n ");
            current = offset;
            budget = LINE_LIMIT - 1;
        }
    }
    out.extend_from_slice(line[current..].as_bytes());
    out.extend_from_slice(b"\r\n");
}

fn invalid(message: &str) -> UtilError {
    UtilError::io(
        super::MANIFEST_NAME,
        std::io::Error::new(std::io::ErrorKind::InvalidData, message.to_string()),
    )
}
