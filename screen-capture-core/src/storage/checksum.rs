use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;

/// Compute the SHA-256 hex digest of a file, streaming it in 64 KiB chunks.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let mut file = File::open(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to open file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
