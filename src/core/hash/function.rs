// ─── Hash Functions ───
// Content → fixed-width lowercase hex digest for every supported algorithm.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::core::error::{UtilError, UtilResult};

const BUFFER_SIZE: usize = 8192;

/// The closed set of digest and checksum algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFunction {
    Adler32,
    Crc32,
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashFunction {
    /// Every algorithm, in the order side-car files are written.
    pub const fn values() -> [HashFunction; 6] {
        [
            HashFunction::Adler32,
            HashFunction::Crc32,
            HashFunction::Md5,
            HashFunction::Sha1,
            HashFunction::Sha256,
            HashFunction::Sha512,
        ]
    }

    /// Extension token used for side-car files (`<file>.<extension>`).
    pub fn extension(&self) -> &'static str {
        match self {
            HashFunction::Adler32 => "adler32",
            HashFunction::Crc32 => "crc32",
            HashFunction::Md5 => "md5",
            HashFunction::Sha1 => "sha1",
            HashFunction::Sha256 => "sha256",
            HashFunction::Sha512 => "sha512",
        }
    }

    /// Width of a padded digest in hex characters.
    pub fn width(&self) -> usize {
        match self {
            HashFunction::Adler32 | HashFunction::Crc32 => 8,
            HashFunction::Md5 => 32,
            HashFunction::Sha1 => 40,
            HashFunction::Sha256 => 64,
            HashFunction::Sha512 => 128,
        }
    }

    /// Left-pad a raw hex value with zeros up to [`width`](Self::width).
    ///
    /// Checksums print without leading zeros, so `"a1"` becomes `"000000a1"`
    /// for CRC32. Digests are already full width and pass through untouched.
    pub fn pad(&self, hash: &str) -> String {
        format!("{:0>width$}", hash, width = self.width())
    }

    pub fn hash_bytes(&self, bytes: &[u8]) -> String {
        let mut hasher = self.hasher();
        hasher.update(bytes);
        self.pad(&hasher.finish())
    }

    pub fn hash_str(&self, data: &str) -> String {
        self.hash_bytes(data.as_bytes())
    }

    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<String> {
        let mut hasher = self.hasher();
        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            let count = reader.read(&mut buffer)?;
            if count == 0 {
                break;
            }
            hasher.update(&buffer[..count]);
        }
        Ok(self.pad(&hasher.finish()))
    }

    /// Hash a single file. A missing file is an IO error here; use
    /// [`hash_files`](Self::hash_files) for the lenient variant.
    pub fn hash_file(&self, path: &Path) -> UtilResult<String> {
        let file = File::open(path).map_err(|e| UtilError::io(path, e))?;
        self.hash_reader(file).map_err(|e| UtilError::io(path, e))
    }

    /// Hash the concatenated contents of `files` in iteration order.
    ///
    /// Files that do not exist contribute nothing instead of failing.
    pub fn hash_files<I, P>(&self, files: I) -> UtilResult<String>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut hasher = self.hasher();
        let mut buffer = [0u8; BUFFER_SIZE];

        for path in files {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }

            let mut file = File::open(path).map_err(|e| UtilError::io(path, e))?;
            loop {
                let count = file.read(&mut buffer).map_err(|e| UtilError::io(path, e))?;
                if count == 0 {
                    break;
                }
                hasher.update(&buffer[..count]);
            }
        }

        Ok(self.pad(&hasher.finish()))
    }

    pub(crate) fn hasher(&self) -> Hasher {
        match self {
            HashFunction::Adler32 => Hasher::Adler32(Adler32::new()),
            HashFunction::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
            HashFunction::Md5 => Hasher::Md5(Md5::new()),
            HashFunction::Sha1 => Hasher::Sha1(Sha1::new()),
            HashFunction::Sha256 => Hasher::Sha256(Sha256::new()),
            HashFunction::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for HashFunction {
    type Err = UtilError;

    /// Accepts the extension token and the usual spellings (`SHA-1`, `md-5`).
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "adler32" => Ok(HashFunction::Adler32),
            "crc32" => Ok(HashFunction::Crc32),
            "md5" => Ok(HashFunction::Md5),
            "sha1" => Ok(HashFunction::Sha1),
            "sha256" => Ok(HashFunction::Sha256),
            "sha512" => Ok(HashFunction::Sha512),
            _ => Err(UtilError::UnsupportedAlgorithm(name.to_string())),
        }
    }
}

/// Running state of one algorithm.
pub(crate) enum Hasher {
    Adler32(Adler32),
    Crc32(crc32fast::Hasher),
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Adler32(h) => h.update(data),
            Hasher::Crc32(h) => h.update(data),
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    /// Raw hex output, not yet padded.
    pub(crate) fn finish(self) -> String {
        match self {
            Hasher::Adler32(h) => format!("{:x}", h.finalize()),
            Hasher::Crc32(h) => format!("{:x}", h.finalize()),
            Hasher::Md5(h) => hex::encode(h.finalize()),
            Hasher::Sha1(h) => hex::encode(h.finalize()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
            Hasher::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// Incremental Adler-32 as used by zlib.
pub(crate) struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    const MOD: u32 = 65521;
    // Largest n such that 255n(n+1)/2 + (n+1)(MOD-1) <= 2^32-1
    const NMAX: usize = 5552;

    fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    fn update(&mut self, data: &[u8]) {
        for chunk in data.chunks(Self::NMAX) {
            for &byte in chunk {
                self.a += byte as u32;
                self.b += self.a;
            }
            self.a %= Self::MOD;
            self.b %= Self::MOD;
        }
    }

    fn finalize(&self) -> u32 {
        (self.b << 16) | self.a
    }
}
