//! Placing the verified binary on the system.
//!
//! Strategies are tried in a fixed order and exactly one of them runs:
//! the first that reports itself available. If that one fails the install
//! fails; later strategies are not attempted.

mod probe;
mod strategy;

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::error::{InstallError, reason};
use crate::runtime::Runtime;

pub use probe::probe_version;
pub use strategy::{
    BINARY_MODE, ELEVATION_TOOL, Elevated, PlacementMethod, PlacementStrategy, SystemDir, UserDir,
};

/// Where the binary ended up and how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub method: PlacementMethod,
    pub path: PathBuf,
}

/// Builds the ordered strategy list: system, elevated (unless disabled), user.
pub fn default_strategies<R: Runtime>(
    system_dir: &Path,
    user_dir: &Path,
    allow_elevation: bool,
) -> Vec<Box<dyn PlacementStrategy<R>>> {
    let mut strategies: Vec<Box<dyn PlacementStrategy<R>>> =
        vec![Box::new(SystemDir::new(system_dir.to_path_buf()))];
    if allow_elevation {
        strategies.push(Box::new(Elevated::new(system_dir.to_path_buf())));
    }
    strategies.push(Box::new(UserDir::new(user_dir.to_path_buf())));
    strategies
}

/// Places `binary` as `file_name` using the first available strategy.
#[tracing::instrument(skip(runtime, strategies))]
pub fn place_binary<R: Runtime>(
    runtime: &R,
    strategies: &[Box<dyn PlacementStrategy<R>>],
    binary: &Path,
    file_name: &str,
) -> Result<Placement, InstallError> {
    let Some(strategy) = strategies.iter().find(|s| {
        let available = s.is_available(runtime);
        debug!(
            "{} ({:?}) available: {}",
            s.method(),
            s.destination_dir(),
            available
        );
        available
    }) else {
        return Err(InstallError::InstallFailed {
            binary: file_name.to_string(),
            reason: "no writable install location found".to_string(),
        });
    };

    let method = strategy.method();
    info!("Installing {} into {:?} ({})", file_name, strategy.destination_dir(), method);

    let path = strategy
        .place(runtime, binary, file_name)
        .map_err(|e| InstallError::InstallFailed {
            binary: file_name.to_string(),
            reason: reason(&e),
        })?;

    Ok(Placement { method, path })
}
