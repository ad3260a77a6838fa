//! The install run: preflight, resolve, locate, fetch, verify, place.
//!
//! Stages run strictly in order and the first failure ends the run. All
//! downloads and extraction happen inside a [`ScopedWorkDir`], which is
//! gone by the time [`Installer::run`] returns.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::archive::{ArchiveExtractor, find_binary};
use crate::cleanup::{SharedCleanupContext, interruptible};
use crate::config::Config;
use crate::download::download_file;
use crate::error::{AssetKind, InstallError, reason};
use crate::http::HttpStatusError;
use crate::install::{
    BINARY_MODE, Placement, PlacementMethod, PlacementStrategy, default_strategies, place_binary,
    probe_version,
};
use crate::platform::{PlatformDetector, Target, resolve_target};
use crate::release::{ReleaseSource, SelectedRelease, locate, order_releases};
use crate::runtime::Runtime;
use crate::verify::verify_archive;
use crate::workdir::ScopedWorkDir;

/// What a dry run would do.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallPlan {
    pub repo: String,
    pub target: Target,
    pub tag: String,
    pub archive_url: String,
    pub checksum_url: String,
    /// Candidate locations in the order they would be tried.
    pub locations: Vec<(PlacementMethod, PathBuf)>,
}

impl fmt::Display for InstallPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Install Plan ===")?;
        writeln!(f)?;
        writeln!(f, "Repository: {}", self.repo)?;
        writeln!(f, "Target:     {}", self.target)?;
        writeln!(f, "Release:    {}", self.tag)?;
        writeln!(f, "Archive:    {}", self.archive_url)?;
        writeln!(f, "Checksum:   {}", self.checksum_url)?;
        writeln!(f)?;
        writeln!(f, "Install locations (first available wins):")?;
        for (i, (method, dir)) in self.locations.iter().enumerate() {
            writeln!(f, "  {}. {} ({})", i + 1, dir.display(), method)?;
        }
        Ok(())
    }
}

/// Result of a completed install.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallReport {
    pub binary: String,
    pub tag: String,
    pub target: Target,
    pub method: PlacementMethod,
    pub path: PathBuf,
    /// First line of `<binary> --version`, when the probe worked.
    pub version: Option<String>,
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "✓ Installed {} {} ({}) to {}",
            self.binary,
            self.tag,
            self.target,
            self.path.display()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Planned(InstallPlan),
    Installed(InstallReport),
}

pub struct Installer<R: Runtime + 'static, S: ReleaseSource, E: ArchiveExtractor> {
    config: Config<R, S, E>,
    cleanup_ctx: SharedCleanupContext,
}

impl<R: Runtime + 'static, S: ReleaseSource, E: ArchiveExtractor> Installer<R, S, E> {
    pub fn new(config: Config<R, S, E>, cleanup_ctx: SharedCleanupContext) -> Self {
        Self {
            config,
            cleanup_ctx,
        }
    }

    #[tracing::instrument(skip(self, detector))]
    pub async fn run(&self, detector: &dyn PlatformDetector) -> Result<Outcome, InstallError> {
        let Config {
            runtime, options, ..
        } = &self.config;

        let (work_parent, user_dir) = self.preflight()?;

        let target = resolve_target(detector, options.target.as_deref())?;
        println!("→ Target: {}", target);

        let workdir = ScopedWorkDir::create(&work_parent, self.cleanup_ctx.clone())?;

        let selected = self.locate_release(target).await?;
        println!("→ Release: {}", selected.tag);

        let strategies: Vec<Box<dyn PlacementStrategy<R>>> =
            default_strategies(&options.system_dir, &user_dir, options.allow_elevation);

        if options.dry_run {
            return Ok(Outcome::Planned(InstallPlan {
                repo: options.repo.to_string(),
                target,
                tag: selected.tag,
                archive_url: selected.archive.download_url,
                checksum_url: selected.checksum_url,
                locations: strategies
                    .iter()
                    .map(|s| (s.method(), s.destination_dir().to_path_buf()))
                    .collect(),
            }));
        }

        let archive_path = self.fetch(&workdir, &selected).await?;
        let binary = interruptible(|| self.unpack(&workdir, &archive_path, &selected))?;

        let Placement { method, path } = interruptible(|| {
            place_binary(runtime, &strategies, &binary, &options.binary_name)
        })?;
        println!("→ Installed to {} ({})", path.display(), method);
        if method == PlacementMethod::User {
            println!("→ Note: make sure {} is on your PATH", user_dir.display());
        }

        let version = interruptible(|| probe_version(runtime, &path));
        if let Some(version) = &version {
            println!("→ Reports: {}", version);
        }

        Ok(Outcome::Installed(InstallReport {
            binary: options.binary_name.clone(),
            tag: selected.tag,
            target,
            method,
            path,
            version,
        }))
    }

    /// Checks host capabilities the run depends on before any network use.
    /// Returns the parent for the working directory and the user install dir.
    fn preflight(&self) -> Result<(PathBuf, PathBuf), InstallError> {
        let Config {
            runtime, options, ..
        } = &self.config;

        let temp = runtime.temp_dir();
        if !runtime.is_writable(&temp) {
            return Err(InstallError::MissingDependency(format!(
                "no writable temporary directory ({})",
                temp.display()
            )));
        }

        let user_dir = options.resolve_user_dir(runtime)?;
        debug!("Preflight ok: temp {:?}, user dir {:?}", temp, user_dir);
        Ok((temp, user_dir))
    }

    async fn locate_release(&self, target: Target) -> Result<SelectedRelease, InstallError> {
        let Config {
            source, options, ..
        } = &self.config;

        println!("→ Querying releases of {}", options.repo);
        let releases = source.list_releases().await.map_err(|e| {
            let why = match e.downcast_ref::<HttpStatusError>() {
                Some(HttpStatusError::NotFound) => {
                    format!("repository {} not found (HTTP 404)", options.repo)
                }
                _ => reason(&e),
            };
            InstallError::ReleaseQueryFailed {
                url: source.listing_url(),
                reason: why,
            }
        })?;
        info!("{} release(s) listed", releases.len());

        let ordered = order_releases(releases, options.order);
        locate(&ordered, target, options.tag.as_deref())
    }

    /// Downloads the archive and its sidecar, then verifies the archive.
    async fn fetch(
        &self,
        workdir: &ScopedWorkDir,
        selected: &SelectedRelease,
    ) -> Result<PathBuf, InstallError> {
        let Config {
            runtime,
            http_client,
            ..
        } = &self.config;

        let archive_path = workdir.file(&selected.archive.name);
        let sidecar_path = workdir.file(&selected.checksum_name());

        let downloads = [
            (AssetKind::Archive, &selected.archive.download_url, &archive_path),
            (AssetKind::Checksum, &selected.checksum_url, &sidecar_path),
        ];
        for (asset, url, dest) in downloads {
            println!("→ Downloading {} {}", asset, url);
            download_file(runtime, url, dest, http_client)
                .await
                .map_err(|e| InstallError::DownloadFailed {
                    asset,
                    url: url.clone(),
                    reason: reason(&e),
                })?;
        }

        let record = interruptible(|| {
            verify_archive(runtime, &archive_path, &sidecar_path, &selected.archive.name)
        })?;
        println!("→ Checksum verified (sha256 {})", record.actual);

        Ok(archive_path)
    }

    /// Extracts the verified archive and returns the executable binary.
    fn unpack(
        &self,
        workdir: &ScopedWorkDir,
        archive_path: &Path,
        selected: &SelectedRelease,
    ) -> Result<PathBuf, InstallError> {
        let Config {
            runtime,
            extractor,
            options,
            ..
        } = &self.config;

        let extraction_failed = |e: anyhow::Error| InstallError::ExtractionFailed {
            archive: selected.archive.name.clone(),
            reason: reason(&e),
        };

        let extract_dir = workdir.extract_dir();
        runtime
            .create_dir_all(&extract_dir)
            .map_err(extraction_failed)?;
        let entries = extractor
            .extract(runtime, archive_path, &extract_dir)
            .map_err(extraction_failed)?;

        let relative = find_binary(&entries, &options.binary_name).ok_or_else(|| {
            InstallError::ArchiveMissingBinary {
                archive: selected.archive.name.clone(),
                binary: options.binary_name.clone(),
            }
        })?;
        let binary = extract_dir.join(relative);
        debug!("Found {} at {:?}", options.binary_name, binary);

        runtime
            .set_permissions(&binary, BINARY_MODE)
            .map_err(|e| InstallError::InstallFailed {
                binary: options.binary_name.clone(),
                reason: reason(&e),
            })?;

        Ok(binary)
    }
}
