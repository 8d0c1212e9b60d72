//! Host platform detection.
//!
//! Pinned binaries are published for exactly four targets:
//!
//! | OS | Arch |
//! |----|------|
//! | `linux` | `amd64` |
//! | `linux` | `arm64` |
//! | `darwin` | `amd64` |
//! | `darwin` | `arm64` |
//!
//! Anything else fails with [`BootstrapError::UnsupportedPlatform`] before
//! any download is attempted.
//!
//! [`BootstrapError::UnsupportedPlatform`]: crate::error::BootstrapError::UnsupportedPlatform

use std::{env, fmt};

use serde::Serialize;

use crate::error::{BootstrapResult, unsupported_platform_error};

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Darwin
}

impl Os {
    /// Name used in download URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin"
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "darwin" | "macos" => Some(Self::Darwin),
            _ => None
        }
    }
}

/// CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64
}

impl Arch {
    /// Name used in download URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64"
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Some(Self::Amd64),
            "aarch64" | "arm64" => Some(Self::Arm64),
            _ => None
        }
    }
}

/// Raw OS and architecture names reported by a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub os:   String,
    pub arch: String
}

impl Host {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os:   os.into(),
            arch: arch.into()
        }
    }

    /// The host this binary was compiled for
    pub fn current() -> Self {
        Self::new(env::consts::OS, env::consts::ARCH)
    }
}

/// Supported OS/architecture pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub os:   Os,
    pub arch: Arch
}

impl Platform {
    /// Detect the platform this binary was compiled for
    pub fn detect() -> BootstrapResult<Self> {
        Self::resolve(&Host::current())
    }

    /// Gate a host against the supported pairs
    pub fn resolve(host: &Host) -> BootstrapResult<Self> {
        Self::from_parts(&host.os, &host.arch)
    }

    /// Resolve a platform from raw OS and architecture names
    ///
    /// Accepts both Rust target names (`macos`, `x86_64`, `aarch64`) and the
    /// names `uname` and release URLs use (`Darwin`, `amd64`, `arm64`).
    pub fn from_parts(os: &str, arch: &str) -> BootstrapResult<Self> {
        match (Os::parse(os), Arch::parse(arch)) {
            (Some(os), Some(arch)) => Ok(Self {
                os,
                arch
            }),
            _ => Err(unsupported_platform_error(os, arch))
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.as_str(), self.arch.as_str())
    }
}
