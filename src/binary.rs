//! Pinned binary acquisition.
//!
//! Each [`BinarySpec`] names a target path, a pinned version and a URL
//! template. A binary whose target path already exists is left alone: no
//! version or checksum verification is performed, so bumping a version in
//! the configuration has no effect until the old file is removed.
//!
//! Downloads go through the [`Fetch`] trait so the acquisition logic can be
//! exercised without a network. [`HttpFetcher`] is the production
//! implementation.
//!
//! # URL templates
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{version}` | pinned version, without a leading `v` |
//! | `{os}` | `linux` or `darwin` |
//! | `{arch}` | `amd64` or `arm64` |

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::Config,
    error::{BootstrapResult, download_error, file_write_error, http_error},
    platform::Platform
};

/// External executable the dependent processes need
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BinarySpec {
    /// Display name
    pub name:    String,
    /// Pinned version
    pub version: String,
    /// URL template
    pub url:     String,
    /// Target path, relative to the project root unless absolute
    pub target:  PathBuf
}

impl BinarySpec {
    /// Render the download URL for a platform
    pub fn url_for(&self, platform: Platform) -> String {
        self.url
            .replace("{version}", &self.version)
            .replace("{os}", platform.os.as_str())
            .replace("{arch}", platform.arch.as_str())
    }

    /// Resolve the target path against a project root
    pub fn target_in(&self, root: &Path) -> PathBuf {
        Config::resolve(root, &self.target)
    }
}

/// Source of binary payloads
pub trait Fetch {
    /// Download the full body at `url`
    fn fetch(&self, url: &str) -> BootstrapResult<Vec<u8>>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, url: &str) -> BootstrapResult<Vec<u8>> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    client: reqwest::blocking::Client
}

impl HttpFetcher {
    /// Create fetcher with a whole-request timeout
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            client
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> BootstrapResult<Vec<u8>> {
        let response = self.client.get(url).send().map_err(|e| http_error(url, e))?;
        if !response.status().is_success() {
            return Err(download_error(
                url,
                format!("server returned {}", response.status())
            ));
        }
        let body = response.bytes().map_err(|e| http_error(url, e))?;
        Ok(body.to_vec())
    }
}

/// Outcome of acquiring one binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Acquisition {
    /// Target existed, nothing fetched
    AlreadyPresent { path: PathBuf },
    /// Fetched and marked executable
    Downloaded { path: PathBuf, bytes: usize }
}

impl Acquisition {
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyPresent {
                path
            }
            | Self::Downloaded {
                path, ..
            } => path
        }
    }
}

/// Make sure `spec` exists under `root`, downloading it if absent
pub fn acquire_binary<F: Fetch + ?Sized>(
    spec: &BinarySpec,
    root: &Path,
    platform: Platform,
    fetcher: &F
) -> BootstrapResult<Acquisition> {
    let path = spec.target_in(root);
    if path.exists() {
        debug!(binary = %spec.name, path = %path.display(), "binary already present");
        return Ok(Acquisition::AlreadyPresent {
            path
        });
    }

    let url = spec.url_for(platform);
    info!(binary = %spec.name, version = %spec.version, %url, "downloading binary");

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Downloading {} {}...", spec.name, spec.version));
    pb.enable_steady_tick(Duration::from_millis(100));
    let body = fetcher.fetch(&url);
    pb.finish_and_clear();
    let body = body?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| file_write_error(parent, e))?;
    }
    let staging = staging_path(&path);
    let installed = fs::write(&staging, &body)
        .map_err(|e| file_write_error(&staging, e))
        .and_then(|_| make_executable(&staging))
        .and_then(|_| fs::rename(&staging, &path).map_err(|e| file_write_error(&path, e)));
    if installed.is_err() {
        let _ = fs::remove_file(&staging);
    }
    installed?;

    Ok(Acquisition::Downloaded {
        path,
        bytes: body.len()
    })
}

/// Sibling path the payload is written to before it is renamed into place
///
/// The target only ever appears complete and executable, so an interrupted
/// download is never mistaken for an installed binary.
fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.partial", name))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> BootstrapResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| file_write_error(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> BootstrapResult<()> {
    Ok(())
}
