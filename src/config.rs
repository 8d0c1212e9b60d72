//! Bootstrap settings loading.
//!
//! Settings are loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.agent-bootstrap.toml` in the project root
//! 4. `~/.config/agent-bootstrap/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [paths]
//! env_file = ".env"
//! tools_file = "tools.yaml"
//!
//! [source]
//! name = "my-bq-source"
//! kind = "bigquery"
//!
//! [download]
//! timeout_secs = 300
//!
//! [dependencies]
//! command = ["pip", "install", "-r", "requirements.txt"]
//! skip = false
//!
//! [[binaries]]
//! name = "toolbox"
//! version = "0.7.0"
//! url = "https://storage.googleapis.com/genai-toolbox/v{version}/{os}/{arch}/toolbox"
//! target = "toolbox"
//!
//! [[processes]]
//! name = "Query gateway"
//! command = "./toolbox --tools-file tools.yaml"
//! endpoint = "http://127.0.0.1:5000"
//! ```
//!
//! Listing `[[binaries]]` or `[[processes]]` replaces the whole default list.
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `TOOLBOX_VERSION` | Pinned toolbox version |
//! | `YQ_VERSION` | Pinned yq version |
//! | `AGENT_BOOTSTRAP_ENV_FILE` | Environment profile path |
//! | `AGENT_BOOTSTRAP_TOOLS_FILE` | Tools file path |

use std::{
    env, fs,
    path::{Path, PathBuf}
};

use serde::{Deserialize, Serialize};

use crate::{
    binary::BinarySpec,
    error::{BootstrapResult, configuration_error}
};

/// Name of the project-local settings file
pub const LOCAL_CONFIG_FILE: &str = ".agent-bootstrap.toml";

/// Bootstrap settings
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths:        PathsConfig,
    #[serde(default)]
    pub source:       SourceConfig,
    #[serde(default = "default_binaries")]
    pub binaries:     Vec<BinarySpec>,
    #[serde(default)]
    pub download:     DownloadConfig,
    #[serde(default)]
    pub dependencies: DependenciesConfig,
    #[serde(default = "default_processes")]
    pub processes:    Vec<ProcessSpec>
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths:        PathsConfig::default(),
            source:       SourceConfig::default(),
            binaries:     default_binaries(),
            download:     DownloadConfig::default(),
            dependencies: DependenciesConfig::default(),
            processes:    default_processes()
        }
    }
}

/// Artifact locations, relative to the project root unless absolute
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub env_file:   PathBuf,
    pub tools_file: PathBuf
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            env_file:   PathBuf::from(".env"),
            tools_file: PathBuf::from("tools.yaml")
        }
    }
}

/// Data source entry the gateway connects through
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub name: String,
    pub kind: String
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: String::from("my-bq-source"),
            kind: String::from("bigquery")
        }
    }
}

/// Download settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_secs: u64
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300
        }
    }
}

/// Delegated dependency installation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DependenciesConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,
    pub skip:    bool
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            command: ["pip", "install", "-r", "requirements.txt"]
                .into_iter()
                .map(String::from)
                .collect(),
            skip:    false
        }
    }
}

/// Dependent process started manually after bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProcessSpec {
    pub name:     String,
    pub command:  String,
    #[serde(default)]
    pub endpoint: Option<String>
}

fn default_binaries() -> Vec<BinarySpec> {
    vec![
        BinarySpec {
            name:    String::from("toolbox"),
            version: String::from("0.7.0"),
            url:     String::from(
                "https://storage.googleapis.com/genai-toolbox/v{version}/{os}/{arch}/toolbox"
            ),
            target:  PathBuf::from("toolbox")
        },
        BinarySpec {
            name:    String::from("yq"),
            version: String::from("4.45.1"),
            url:     String::from(
                "https://github.com/mikefarah/yq/releases/download/v{version}/yq_{os}_{arch}"
            ),
            target:  PathBuf::from("yq")
        }
    ]
}

fn default_processes() -> Vec<ProcessSpec> {
    vec![
        ProcessSpec {
            name:     String::from("Query gateway (MCP toolbox)"),
            command:  String::from("./toolbox --tools-file tools.yaml"),
            endpoint: Some(String::from("http://127.0.0.1:5000"))
        },
        ProcessSpec {
            name:     String::from("Anti-pattern detection service"),
            command:  String::from("cd antipattern-service && ./mvnw spring-boot:run"),
            endpoint: Some(String::from("http://localhost:8080/analyze-query-ui"))
        },
        ProcessSpec {
            name:     String::from("Agent runtime"),
            command:  String::from("adk web"),
            endpoint: Some(String::from("http://localhost:8000"))
        }
    ]
}

impl Config {
    /// Load configuration for the project at `root`
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in the project root (.agent-bootstrap.toml)
    /// 3. Config file in home directory (~/.config/agent-bootstrap/config.toml)
    /// 4. Default values
    pub fn load(root: &Path) -> BootstrapResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("agent-bootstrap")
                .join("config.toml");

            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        let local_config = root.join(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML settings
    pub fn from_toml_str(content: &str) -> BootstrapResult<Self> {
        toml::from_str(content).map_err(|e| configuration_error(format!("Invalid config file: {}", e)))
    }

    fn from_file(path: &Path) -> BootstrapResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| configuration_error(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>
    {
        for binary in &mut self.binaries {
            let key = format!("{}_VERSION", binary.name.to_ascii_uppercase().replace('-', "_"));
            if let Some(version) = lookup(&key) {
                binary.version = version;
            }
        }

        if let Some(path) = lookup("AGENT_BOOTSTRAP_ENV_FILE") {
            self.paths.env_file = PathBuf::from(path);
        }

        if let Some(path) = lookup("AGENT_BOOTSTRAP_TOOLS_FILE") {
            self.paths.tools_file = PathBuf::from(path);
        }
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> BootstrapResult<()> {
        if self.source.name.trim().is_empty() || self.source.kind.trim().is_empty() {
            return Err(configuration_error("source name and kind must not be empty"));
        }
        for binary in &self.binaries {
            if binary.target.as_os_str().is_empty() {
                return Err(configuration_error(format!(
                    "binary '{}' has an empty target path",
                    binary.name
                )));
            }
            if binary.version.trim().is_empty() {
                return Err(configuration_error(format!(
                    "binary '{}' has no pinned version",
                    binary.name
                )));
            }
        }
        if !self.dependencies.skip && self.dependencies.command.is_empty() {
            return Err(configuration_error(
                "dependencies.command must not be empty unless dependencies.skip is set"
            ));
        }
        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}
