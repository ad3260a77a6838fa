use anyhow::Result;
use clap::Parser;
use ferromon_install::{
    InstallError,
    cleanup::{new_shared, spawn_interrupt_handler},
    config::{Config, DEFAULT_API_URL, DEFAULT_REPO, DEFAULT_SYSTEM_DIR, InstallOptions},
    pipeline::{Installer, Outcome},
    platform::HostPlatformDetector,
    release::{ReleaseOrder, RepoId},
    runtime::RealRuntime,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// ferromon-install - install the Ferromon monitoring tool
///
/// Detects this machine's platform, finds the newest Ferromon release that
/// ships a build for it, verifies the download against its published
/// SHA-256 checksum and installs the `ferro` binary.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for avoiding API rate limits.
///
/// Examples:
///   ferromon-install                 # Install the latest release
///   ferromon-install --tag v0.3.1    # Install a specific release
///   ferromon-install --dry-run       # Show what would be installed
#[derive(Parser, Debug)]
#[command(author, version = env!("FERROMON_INSTALL_VERSION"), about)]
struct Cli {
    /// Repository publishing the releases
    #[arg(long, env = "FERROMON_REPO", value_name = "OWNER/REPO", default_value = DEFAULT_REPO)]
    repo: String,

    /// GitHub API URL
    #[arg(long = "api-url", env = "FERROMON_API_URL", value_name = "URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Install this release tag instead of the newest one
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,

    /// Build target to install instead of the detected one
    #[arg(long, env = "FERROMON_TARGET", value_name = "TRIPLE")]
    target: Option<String>,

    /// How releases are ordered before picking the first match
    #[arg(long, value_enum, default_value_t = ReleaseOrder::Listing)]
    order: ReleaseOrder,

    /// System-wide install directory
    #[arg(long = "system-dir", env = "FERROMON_SYSTEM_DIR", value_name = "PATH", default_value = DEFAULT_SYSTEM_DIR)]
    system_dir: PathBuf,

    /// Per-user install directory (defaults to ~/.local/bin)
    #[arg(long = "user-dir", env = "FERROMON_USER_DIR", value_name = "PATH")]
    user_dir: Option<PathBuf>,

    /// Never try to install through sudo
    #[arg(long = "no-sudo")]
    no_sudo: bool,

    /// Timeout for release metadata requests, in seconds
    #[arg(long = "metadata-timeout", value_name = "SECS", default_value_t = 10)]
    metadata_timeout: u64,

    /// Timeout for each download, in seconds
    #[arg(long = "download-timeout", value_name = "SECS", default_value_t = 300)]
    download_timeout: u64,

    /// Print the install plan without downloading anything
    #[arg(long = "dry-run")]
    dry_run: bool,
}

impl Cli {
    fn into_options(self) -> Result<InstallOptions> {
        let repo: RepoId = self.repo.parse()?;
        Ok(InstallOptions {
            repo,
            api_url: self.api_url,
            tag: self.tag,
            target: self.target,
            order: self.order,
            system_dir: self.system_dir,
            user_dir: self.user_dir,
            allow_elevation: !self.no_sudo,
            metadata_timeout: Duration::from_secs(self.metadata_timeout),
            download_timeout: Duration::from_secs(self.download_timeout),
            dry_run: self.dry_run,
            ..Default::default()
        })
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = cli.into_options()?;
    let config = Config::new(RealRuntime, options)?;

    let cleanup_ctx = new_shared();
    let interrupt_handler = spawn_interrupt_handler(cleanup_ctx.clone());

    let installer = Installer::new(config, cleanup_ctx);
    let outcome = installer.run(&HostPlatformDetector).await;
    interrupt_handler.abort();

    match outcome? {
        Outcome::Planned(plan) => print!("{}", plan),
        Outcome::Installed(report) => println!("{}", report),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(install_err) = e.downcast_ref::<InstallError>() {
                log::debug!("Run failed with {}", install_err.kind());
            }
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
