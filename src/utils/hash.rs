//! Content fingerprints using blake3.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let fp = hash::fingerprint_file(path)?;
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Number of hex characters embedded in revisioned filenames.
pub const HASH_LEN: usize = 10;

/// Compute the fingerprint of in-memory content.
#[cfg(test)]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let hash = blake3::hash(data.as_ref());
    hex::encode(&hash.as_bytes()[..HASH_LEN / 2])
}

/// Compute the fingerprint of a file (streaming, for large bundles).
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(&hasher.finalize().as_bytes()[..HASH_LEN / 2]))
}

/// Check whether a string looks like a fingerprint produced by this module.
pub fn is_fingerprint(s: &str) -> bool {
    s.len() == HASH_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
