use std::fmt;
use std::str::FromStr;

use crate::error::InstallError;

/// Build targets for which release archives are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    X86_64LinuxMusl,
    Aarch64Darwin,
    X86_64Darwin,
}

impl Target {
    pub const ALL: [Target; 3] = [
        Target::X86_64LinuxMusl,
        Target::Aarch64Darwin,
        Target::X86_64Darwin,
    ];

    /// Target triple as it appears in release asset names.
    pub fn as_str(self) -> &'static str {
        match self {
            Target::X86_64LinuxMusl => "x86_64-unknown-linux-musl",
            Target::Aarch64Darwin => "aarch64-apple-darwin",
            Target::X86_64Darwin => "x86_64-apple-darwin",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Target::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let (arch, os) = wanted.split_once('-').unwrap_or((wanted.as_str(), ""));
                InstallError::UnsupportedPlatform {
                    os: os.to_string(),
                    arch: arch.to_string(),
                }
            })
    }
}
