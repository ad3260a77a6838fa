//! Platform detection and build target resolution
//!
//! This module reads the host's OS and machine architecture and maps the
//! pair onto one of the build targets Ferromon publishes. Anything outside
//! the supported table is rejected; there is no best-effort guessing.

mod detection;
mod target;

pub use detection::{HostPlatformDetector, Platform, PlatformDetector};
pub use target::Target;

use crate::error::InstallError;

/// Resolve a raw OS/architecture pair to a supported build target.
///
/// Both inputs are lowercased before matching.
#[tracing::instrument]
pub fn resolve(os: &str, arch: &str) -> Result<Target, InstallError> {
    let os_lower = os.trim().to_lowercase();
    let arch_lower = arch.trim().to_lowercase();

    match (os_lower.as_str(), arch_lower.as_str()) {
        ("linux", "x86_64") => Ok(Target::X86_64LinuxMusl),
        ("darwin", "arm64" | "aarch64") => Ok(Target::Aarch64Darwin),
        ("darwin", "x86_64") => Ok(Target::X86_64Darwin),
        _ => Err(InstallError::UnsupportedPlatform {
            os: os_lower,
            arch: arch_lower,
        }),
    }
}

/// Resolve the target for this run, honoring an explicit override.
///
/// The override must name a supported target verbatim; otherwise the run
/// fails the same way an unrecognized host does.
pub fn resolve_target(
    detector: &dyn PlatformDetector,
    target_override: Option<&str>,
) -> Result<Target, InstallError> {
    if let Some(requested) = target_override {
        return requested.parse::<Target>();
    }

    let platform = detector.detect();
    resolve(&platform.os, &platform.arch)
}
