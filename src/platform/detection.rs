use log::debug;

/// Raw OS and machine architecture as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// On Unix this asks the kernel (`uname`), so the values match what
    /// `uname -s` / `uname -m` print, e.g. `Darwin` / `arm64`.
    pub fn detect() -> Self {
        #[cfg(unix)]
        {
            match nix::sys::utsname::uname() {
                Ok(uts) => {
                    let platform = Self {
                        os: uts.sysname().to_string_lossy().into_owned(),
                        arch: uts.machine().to_string_lossy().into_owned(),
                    };
                    debug!("uname reported {:?}", platform);
                    return platform;
                }
                Err(e) => debug!("uname failed ({}), using compile-time platform", e),
            }
        }

        Self::compiled()
    }

    /// Platform the binary was compiled for, spelled the way `uname` would.
    fn compiled() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        Self {
            os: os.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Trait for platform detection (useful for testing)
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> Platform;
}

/// Detector that queries the running host.
pub struct HostPlatformDetector;

impl PlatformDetector for HostPlatformDetector {
    fn detect(&self) -> Platform {
        Platform::detect()
    }
}
