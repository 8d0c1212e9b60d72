#![allow(dead_code)]

use std::{
    cell::RefCell,
    fs,
    io::Cursor,
    path::{Path, PathBuf}
};

use bq_agent_bootstrap::{
    binary::Fetch,
    config::Config,
    error::{BootstrapResult, download_error},
    platform::Host,
    prompt::LinePrompter
};

pub type ScriptedPrompter = LinePrompter<Cursor<Vec<u8>>, Vec<u8>>;

/// Fetcher that records every URL instead of touching the network
pub struct FakeFetcher {
    calls: RefCell<Vec<String>>,
    body:  Option<Vec<u8>>
}

impl FakeFetcher {
    pub fn serving(body: &[u8]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            body:  Some(body.to_vec())
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            body:  None
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Fetch for FakeFetcher {
    fn fetch(&self, url: &str) -> BootstrapResult<Vec<u8>> {
        self.calls.borrow_mut().push(url.to_string());
        self.body
            .clone()
            .ok_or_else(|| download_error(url, "connection refused"))
    }
}

/// Prompter answering with `lines` in order, then end of input
pub fn answers(lines: &[&str]) -> ScriptedPrompter {
    let mut input = lines.join("\n");
    input.push('\n');
    LinePrompter::new(Cursor::new(input.into_bytes()), Vec::new())
}

/// Prompter with no input at all
pub fn no_answers() -> ScriptedPrompter {
    LinePrompter::new(Cursor::new(Vec::new()), Vec::new())
}

/// Default settings without the dependency installer
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.dependencies.skip = true;
    config
}

pub fn linux_host() -> Host {
    Host::new("linux", "x86_64")
}

/// Create placeholder files for every configured binary
pub fn stub_binaries(root: &Path, config: &Config) {
    for spec in &config.binaries {
        fs::write(spec.target_in(root), b"stub").unwrap();
    }
}

pub fn write_profile(root: &Path, project: &str, location: &str) -> PathBuf {
    let path = root.join(".env");
    fs::write(
        &path,
        format!(
            "GOOGLE_GENAI_USE_VERTEXAI=TRUE\nGOOGLE_CLOUD_PROJECT={}\nGOOGLE_CLOUD_LOCATION={}\n",
            project, location
        )
    )
    .unwrap();
    path
}
