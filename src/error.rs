//! Error taxonomy for the bootstrapper.
//!
//! Every stage returns [`BootstrapResult`]. Nothing is retried or recovered
//! locally: the first error ends the run and [`BootstrapError::exit_code`]
//! becomes the process exit status.

use std::path::Path;

use masterror::Error;

/// Result alias used by every stage
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Fatal bootstrap failure
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Host OS/architecture pair has no published binaries
    #[error("Unsupported platform {os}/{arch}: expected linux or darwin on amd64 or arm64")]
    UnsupportedPlatform { os: String, arch: String },

    /// Binary download failed (transport error or non-success status)
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    /// Required configuration value missing, empty, or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Structured config file could not be parsed, edited, or written
    #[error("Invalid structured config '{path}': {message}")]
    ConfigSyntax { path: String, message: String },

    /// Delegated package manager failed
    #[error("Dependency installation failed: {message}")]
    DependencyInstall {
        message: String,
        code:    Option<i32>
    },

    /// Filesystem failure outside the structured config
    #[error("Failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path:   String,
        source: std::io::Error
    }
}

impl BootstrapError {
    /// Process exit code for this failure
    ///
    /// Each kind maps to its own nonzero code. A failing dependency
    /// installer propagates its own exit code when it has one.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } => 1,
            Self::UnsupportedPlatform { .. } => 2,
            Self::Download { .. } => 3,
            Self::Configuration(_) => 4,
            Self::ConfigSyntax { .. } => 5,
            Self::DependencyInstall { code, .. } => match code {
                Some(code) if *code != 0 => *code,
                _ => 6
            }
        }
    }
}

/// Create unsupported platform error
pub fn unsupported_platform_error(os: impl Into<String>, arch: impl Into<String>) -> BootstrapError {
    BootstrapError::UnsupportedPlatform {
        os:   os.into(),
        arch: arch.into()
    }
}

/// Create download error
pub fn download_error(url: impl Into<String>, message: impl Into<String>) -> BootstrapError {
    BootstrapError::Download {
        url:     url.into(),
        message: message.into()
    }
}

/// Create download error from a reqwest failure
pub fn http_error(url: &str, err: reqwest::Error) -> BootstrapError {
    let msg = if err.is_timeout() {
        format!("Request timeout: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else if err.is_status() {
        format!("HTTP error {}: {}", err.status().unwrap_or_default(), err)
    } else {
        err.to_string()
    };
    download_error(url, msg)
}

/// Create configuration error
pub fn configuration_error(message: impl Into<String>) -> BootstrapError {
    BootstrapError::Configuration(message.into())
}

/// Create structured config error
pub fn config_syntax_error(path: &Path, message: impl Into<String>) -> BootstrapError {
    BootstrapError::ConfigSyntax {
        path:    path.display().to_string(),
        message: message.into()
    }
}

/// Create dependency installation error
pub fn dependency_install_error(message: impl Into<String>, code: Option<i32>) -> BootstrapError {
    BootstrapError::DependencyInstall {
        message: message.into(),
        code
    }
}

/// Create file read error
pub fn file_read_error(path: &Path, source: std::io::Error) -> BootstrapError {
    BootstrapError::Io {
        action: "read",
        path:   path.display().to_string(),
        source
    }
}

/// Create file write error
pub fn file_write_error(path: &Path, source: std::io::Error) -> BootstrapError {
    BootstrapError::Io {
        action: "write",
        path:   path.display().to_string(),
        source
    }
}
