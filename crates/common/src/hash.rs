//! Content digests.
//!
//! Uploaded files are identified by the SHA-1 digest of their bytes; the
//! digest doubles as the permanent storage key and the dedupe identity.

use sha1::{Digest, Sha1};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::{AppError, AppResult};

/// Read chunk size for streaming digests.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the lowercase hex SHA-1 digest of a file, streaming its contents.
pub async fn hash_file(path: &Path) -> AppResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to open {}: {e}", path.display())))?;

    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read {}: {e}", path.display())))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the lowercase hex SHA-1 digest of an in-memory buffer.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Validate a client-supplied content hash: lowercase/uppercase hex,
/// 5 to 40 characters. Lookups remain exact-match; the length range only
/// mirrors the accepted input shape.
#[must_use]
pub fn is_valid_hash(hash: &str) -> bool {
    (5..=40).contains(&hash.len()) && hash.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_bytes_known_digest() {
        // SHA-1("abc")
        assert_eq!(hash_bytes(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[tokio::test]
    async fn test_hash_file_matches_bytes() {
        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        tmp.write_all(b"hello mediarium").expect("write");

        let from_file = hash_file(tmp.path()).await.expect("hash");
        assert_eq!(from_file, hash_bytes(b"hello mediarium"));
        assert_eq!(from_file.len(), 40);
    }

    #[test]
    fn test_is_valid_hash() {
        assert!(is_valid_hash("abc12"));
        assert!(is_valid_hash("a9993e364706816aba3e25717850c26c9cd0d89d"));
        assert!(!is_valid_hash("abcd")); // too short
        assert!(!is_valid_hash(&"a".repeat(41))); // too long
        assert!(!is_valid_hash("zzzzzz")); // not hex
    }
}
