//! Checksum verification for downloaded release archives.
//!
//! The sidecar published next to each archive carries the expected SHA-256
//! digest as its first whitespace-delimited token (`sha256sum` format). The
//! archive is hashed locally and the two must agree before anything is
//! extracted.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use sha2::{Digest, Sha256};

use crate::error::{InstallError, reason};
use crate::runtime::Runtime;

/// Expected digest from the sidecar paired with the digest of the bytes on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub expected: String,
    pub actual: String,
}

impl VerificationRecord {
    /// Hex digests are compared case-insensitively.
    pub fn is_match(&self) -> bool {
        self.expected.eq_ignore_ascii_case(&self.actual)
    }
}

/// Extracts the expected digest from sidecar contents.
///
/// Returns a description of the problem when the sidecar is empty or its
/// first token is not a 64-character hex string.
pub fn parse_sidecar(contents: &str) -> Result<String, String> {
    let first_line = contents.lines().next().unwrap_or_default();
    let Some(token) = first_line.split_whitespace().next() else {
        return Err("checksum file is empty".to_string());
    };

    if token.len() != 64 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("'{}' is not a SHA-256 hex digest", token));
    }

    Ok(token.to_string())
}

/// Computes the SHA-256 of a file as a lowercase hex string.
pub fn compute_sha256<R: Runtime>(runtime: &R, path: &Path) -> Result<String> {
    let mut reader = runtime
        .open(path)
        .with_context(|| format!("Failed to open {:?} for checksum", path))?;

    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)
        .with_context(|| format!("Failed to read {:?} for checksum", path))?;

    Ok(hex::encode(hasher.finalize()))
}

/// Checks a downloaded archive against its sidecar.
///
/// `archive_name` is only used in error messages.
#[tracing::instrument(skip(runtime))]
pub fn verify_archive<R: Runtime>(
    runtime: &R,
    archive: &Path,
    sidecar: &Path,
    archive_name: &str,
) -> Result<VerificationRecord, InstallError> {
    let unavailable = |why: String| InstallError::ChecksumUnavailable {
        archive: archive_name.to_string(),
        reason: why,
    };

    let contents = runtime
        .read_to_string(sidecar)
        .map_err(|e| unavailable(reason(&e)))?;
    let expected = parse_sidecar(&contents).map_err(unavailable)?;

    let actual = compute_sha256(runtime, archive).map_err(|e| unavailable(reason(&e)))?;

    let record = VerificationRecord { expected, actual };
    debug!(
        "Checksum expected {} actual {}",
        record.expected, record.actual
    );

    if !record.is_match() {
        return Err(InstallError::ChecksumMismatch {
            archive: archive_name.to_string(),
            expected: record.expected,
            actual: record.actual,
        });
    }

    Ok(record)
}
