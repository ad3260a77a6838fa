//! Candidate install locations, tried in order.

use anyhow::{Context, Result, bail};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Mode given to the installed binary.
pub const BINARY_MODE: u32 = 0o755;

/// Elevation tool looked up on `PATH`.
pub const ELEVATION_TOOL: &str = "sudo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMethod {
    System,
    Elevated,
    User,
}

impl fmt::Display for PlacementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementMethod::System => write!(f, "system directory"),
            PlacementMethod::Elevated => write!(f, "system directory via {}", ELEVATION_TOOL),
            PlacementMethod::User => write!(f, "user directory"),
        }
    }
}

/// One way of putting the binary somewhere on the system.
///
/// `is_available` must not change anything; `place` does the copy and
/// returns the final path of the binary.
pub trait PlacementStrategy<R: Runtime>: Send + Sync {
    fn method(&self) -> PlacementMethod;
    fn destination_dir(&self) -> &Path;
    fn is_available(&self, runtime: &R) -> bool;
    fn place(&self, runtime: &R, binary: &Path, file_name: &str) -> Result<PathBuf>;
}

/// Where the new binary is written before it replaces `file_name`.
fn staging_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(format!(".{}.new", file_name))
}

/// Copies `binary` into `dir` under a staging name and renames it over
/// `file_name`. A running copy of the old binary keeps its inode.
fn copy_executable<R: Runtime>(
    runtime: &R,
    binary: &Path,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let staged = staging_path(dir, file_name);
    let dest = dir.join(file_name);

    let swapped = runtime
        .copy(binary, &staged)
        .with_context(|| format!("Failed to copy binary to {:?}", staged))
        .and_then(|_| {
            runtime
                .set_permissions(&staged, BINARY_MODE)
                .with_context(|| format!("Failed to mark {:?} executable", staged))
        })
        .and_then(|_| {
            runtime
                .rename(&staged, &dest)
                .with_context(|| format!("Failed to move binary into place at {:?}", dest))
        });

    if let Err(e) = swapped {
        if let Err(cleanup) = runtime.remove_file(&staged) {
            debug!("Leaving {:?} behind: {:#}", staged, cleanup);
        }
        return Err(e);
    }
    Ok(dest)
}

/// Fixed system-wide directory the process can already write to.
pub struct SystemDir {
    dir: PathBuf,
}

impl SystemDir {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl<R: Runtime> PlacementStrategy<R> for SystemDir {
    fn method(&self) -> PlacementMethod {
        PlacementMethod::System
    }

    fn destination_dir(&self) -> &Path {
        &self.dir
    }

    fn is_available(&self, runtime: &R) -> bool {
        runtime.is_writable(&self.dir)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn place(&self, runtime: &R, binary: &Path, file_name: &str) -> Result<PathBuf> {
        copy_executable(runtime, binary, &self.dir, file_name)
    }
}

/// The same system directory, written through the elevation tool.
pub struct Elevated {
    dir: PathBuf,
}

impl Elevated {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn run_elevated<R: Runtime>(runtime: &R, tool: &Path, args: Vec<String>) -> Result<()> {
        debug!("Running {} {:?}", tool.display(), args);
        if !runtime.run_interactive(tool, &args)? {
            bail!(
                "`{} {}` failed (elevation declined or not permitted)",
                ELEVATION_TOOL,
                args.join(" ")
            );
        }
        Ok(())
    }
}

impl<R: Runtime> PlacementStrategy<R> for Elevated {
    fn method(&self) -> PlacementMethod {
        PlacementMethod::Elevated
    }

    fn destination_dir(&self) -> &Path {
        &self.dir
    }

    /// Elevating is pointless when already privileged.
    fn is_available(&self, runtime: &R) -> bool {
        !runtime.is_privileged() && runtime.which(ELEVATION_TOOL).is_some()
    }

    #[tracing::instrument(skip(self, runtime))]
    fn place(&self, runtime: &R, binary: &Path, file_name: &str) -> Result<PathBuf> {
        let tool = runtime
            .which(ELEVATION_TOOL)
            .with_context(|| format!("{} is no longer available", ELEVATION_TOOL))?;
        let dest = self.dir.join(file_name);

        Self::run_elevated(
            runtime,
            &tool,
            vec![
                "mkdir".into(),
                "-p".into(),
                self.dir.display().to_string(),
            ],
        )?;
        Self::run_elevated(
            runtime,
            &tool,
            vec![
                "install".into(),
                "-m".into(),
                format!("{:o}", BINARY_MODE),
                binary.display().to_string(),
                dest.display().to_string(),
            ],
        )?;

        Ok(dest)
    }
}

/// Per-user binary directory, created when missing.
pub struct UserDir {
    dir: PathBuf,
}

impl UserDir {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl<R: Runtime> PlacementStrategy<R> for UserDir {
    fn method(&self) -> PlacementMethod {
        PlacementMethod::User
    }

    fn destination_dir(&self) -> &Path {
        &self.dir
    }

    fn is_available(&self, _runtime: &R) -> bool {
        true
    }

    #[tracing::instrument(skip(self, runtime))]
    fn place(&self, runtime: &R, binary: &Path, file_name: &str) -> Result<PathBuf> {
        if !runtime.is_dir(&self.dir) {
            runtime
                .create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create {:?}", self.dir))?;
        }
        copy_executable(runtime, binary, &self.dir, file_name)
    }
}
