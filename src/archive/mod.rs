mod tar_gz;

use crate::runtime::Runtime;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub use tar_gz::TarGzExtractor;

/// Unpacks a downloaded release archive.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor: Send + Sync {
    /// Extract the archive into `extract_to`.
    ///
    /// Returns the regular files written, relative to `extract_to`.
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<Vec<PathBuf>>;
}

/// Find the extracted binary named `name`.
///
/// The binary may sit at the archive root or inside one top-level
/// directory (`ferromon-v0.3.1/ferro`); a root-level entry wins.
pub fn find_binary<'a>(entries: &'a [PathBuf], name: &str) -> Option<&'a PathBuf> {
    let named = |p: &&PathBuf| p.file_name().is_some_and(|f| f == name);

    entries
        .iter()
        .filter(named)
        .find(|p| p.components().count() == 1)
        .or_else(|| {
            entries
                .iter()
                .filter(named)
                .find(|p| p.components().count() == 2)
        })
}
