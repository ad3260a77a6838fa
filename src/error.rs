//! Terminal failures of an install run.
//!
//! Every variant aborts the run. Nothing is retried and nothing is installed
//! after an error has been raised.

use std::fmt;

use thiserror::Error;

/// Which of the two downloaded assets a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Archive,
    Checksum,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Archive => write!(f, "archive"),
            AssetKind::Checksum => write!(f, "checksum"),
        }
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("failed to query releases from {url}: {reason}")]
    ReleaseQueryFailed { url: String, reason: String },

    #[error("no suitable release found for target {target}")]
    NotFound { target: String },

    #[error("failed to download {asset} from {url}: {reason}")]
    DownloadFailed {
        asset: AssetKind,
        url: String,
        reason: String,
    },

    #[error("checksum unavailable for {archive}: {reason}")]
    ChecksumUnavailable { archive: String, reason: String },

    #[error("checksum mismatch for {archive}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        archive: String,
        expected: String,
        actual: String,
    },

    #[error("failed to extract {archive}: {reason}")]
    ExtractionFailed { archive: String, reason: String },

    #[error("archive {archive} does not contain the '{binary}' binary")]
    ArchiveMissingBinary { archive: String, binary: String },

    #[error("failed to install {binary}: {reason}")]
    InstallFailed { binary: String, reason: String },

    #[error("failed to prepare working directory under {parent}: {reason}")]
    WorkDir { parent: String, reason: String },
}

impl InstallError {
    /// Short machine-readable name, used in debug logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InstallError::MissingDependency(_) => "MissingDependency",
            InstallError::UnsupportedPlatform { .. } => "UnsupportedPlatform",
            InstallError::ReleaseQueryFailed { .. } => "ReleaseQueryFailed",
            InstallError::NotFound { .. } => "NotFound",
            InstallError::DownloadFailed { .. } => "DownloadFailed",
            InstallError::ChecksumUnavailable { .. } => "ChecksumUnavailable",
            InstallError::ChecksumMismatch { .. } => "ChecksumMismatch",
            InstallError::ExtractionFailed { .. } => "ExtractionFailed",
            InstallError::ArchiveMissingBinary { .. } => "ArchiveMissingBinary",
            InstallError::InstallFailed { .. } => "InstallFailed",
            InstallError::WorkDir { .. } => "WorkDir",
        }
    }
}

/// Formats an anyhow chain on one line for embedding in an [`InstallError`].
pub(crate) fn reason(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
