//! Content digests for manifest entries.
//!
//! - SHA-256 over the full file contents, streamed through a fixed buffer
//!   (peak memory does not depend on file size).
//! - Output is 64 uppercase hex characters, the format stored in checksums.json.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

use crate::consts::HASH_BUF_SIZE;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Stream a file through SHA-256 and return the uppercase hex digest.
pub fn sha256_file_hex(path: &Path) -> Result<String> {
    let mut f = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("open for hashing {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read for hashing {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode_upper(hasher.finalize()))
}

/// SHA-256 of an in-memory buffer (uppercase hex).
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(bytes))
}

/// Compare two hex digests ignoring case.
#[inline]
pub fn digest_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.eq_ignore_ascii_case(b)
}
