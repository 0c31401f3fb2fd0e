use sha2::{Digest, Sha256};
use std::path::Path;

/// SHA-256 of raw bytes, lower-case hex
#[must_use]
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Fingerprint a file's content; metadata such as mtime never participates
pub fn fingerprint_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(fingerprint_bytes(&bytes))
}

/// Fingerprint of a sequence of string parts, with a separator so `("ab","c")` and `("a","bc")` differ
#[must_use]
pub fn fingerprint_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            fingerprint_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parts_are_length_prefixed() {
        assert_ne!(fingerprint_parts(["ab", "c"]), fingerprint_parts(["a", "bc"]));
        assert_eq!(fingerprint_parts(["x", "y"]), fingerprint_parts(["x", "y"]));
    }
}
