//! SHA-256 helpers shared by the executor's fingerprinting.

use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hex-encoded SHA-256 of a file's content.
pub fn sha256_file(path: impl AsRef<Path>) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(sha256_hex(&bytes))
}

/// Incremental hasher over labelled parts.
///
/// Each part is length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
#[derive(Default)]
pub struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(&mut self, label: &str, value: &[u8]) -> &mut Self {
        for chunk in [label.as_bytes(), value] {
            self.hasher.update((chunk.len() as u64).to_le_bytes());
            self.hasher.update(chunk);
        }
        self
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
