//! SHA-256 helpers.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

/// Read granularity for hashing and streaming downloads.
pub const READ_BUFFER_SIZE: usize = 32 * 1024;

/// Lowercase hex encoding of a finished digest.
pub fn hex_digest(hasher: Sha256) -> String {
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of an in-memory buffer.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_digest(hasher)
}

/// Stream a file through SHA-256 in [`READ_BUFFER_SIZE`] chunks.
pub async fn file_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex_digest(hasher))
}
