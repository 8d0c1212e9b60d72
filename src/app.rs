//! Stage orchestration.
//!
//! A run walks the stages in order and stops at the first error:
//!
//! ```text
//! Start -> PlatformCheck -> BinariesReady -> EnvReady
//!       -> ConfigReconciled -> DepsInstalled -> Reported
//! ```
//!
//! Nothing is rolled back. Every stage re-checks whether its work is already
//! done, so re-running after a partial failure picks up where it stopped.

mod plan;

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

pub use self::plan::{
    BinaryAction, Plan, PlannedBinary, PlannedField, PlannedProfile, PlannedTools, plan
};
use crate::{
    binary::{Acquisition, Fetch, acquire_binary},
    config::{Config, ProcessSpec},
    deps::install_dependencies,
    error::BootstrapResult,
    platform::{Host, Platform},
    profile::{ProfileOrigin, establish_profile},
    prompt::Prompter,
    reconcile::{ReconcileReport, reconcile_tools_file}
};

/// Last stage a run completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    PlatformCheck,
    BinariesReady,
    EnvReady,
    ConfigReconciled,
    DepsInstalled,
    Reported
}

/// Binary acquisition result
#[derive(Debug, Clone, Serialize)]
pub struct BinaryReport {
    pub name:        String,
    pub version:     String,
    #[serde(flatten)]
    pub acquisition: Acquisition
}

/// Environment profile result
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub path:       PathBuf,
    pub origin:     ProfileOrigin,
    pub project_id: String,
    pub location:   String
}

/// Tools file result
#[derive(Debug, Clone, Serialize)]
pub struct ToolsReport {
    pub path:      PathBuf,
    #[serde(flatten)]
    pub reconcile: ReconcileReport
}

/// Dependency installation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DependencyStatus {
    Installed { command: Vec<String> },
    Skipped
}

/// Everything a successful run did
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub platform:     Platform,
    pub binaries:     Vec<BinaryReport>,
    pub profile:      ProfileReport,
    pub tools:        ToolsReport,
    pub dependencies: DependencyStatus,
    /// `KEY=VALUE` pairs the dependent processes read
    pub exports:      Vec<(String, String)>,
    pub next_steps:   Vec<ProcessSpec>
}

/// Sequential bootstrap driver
pub struct Bootstrapper<P, F> {
    config:    Config,
    root:      PathBuf,
    prompter:  P,
    fetcher:   F,
    host:      Host,
    skip_deps: bool,
    stage:     Stage
}

impl<P: Prompter, F: Fetch> Bootstrapper<P, F> {
    pub fn new(config: Config, root: impl Into<PathBuf>, prompter: P, fetcher: F) -> Self {
        let skip_deps = config.dependencies.skip;
        Self {
            config,
            root: root.into(),
            prompter,
            fetcher,
            host: Host::current(),
            skip_deps,
            stage: Stage::Start
        }
    }

    /// Pretend to run on another host
    pub fn with_host(mut self, host: Host) -> Self {
        self.host = host;
        self
    }

    /// Skip the dependency installation stage
    pub fn skip_deps(mut self, skip: bool) -> Self {
        self.skip_deps = skip;
        self
    }

    /// Last stage completed so far
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        debug!(?stage, "stage complete");
        self.stage = stage;
    }

    /// Run every stage in order
    pub fn run(&mut self) -> BootstrapResult<RunReport> {
        let platform = Platform::resolve(&self.host)?;
        self.advance(Stage::PlatformCheck);

        let mut binaries = Vec::with_capacity(self.config.binaries.len());
        for spec in &self.config.binaries {
            let acquisition = acquire_binary(spec, &self.root, platform, &self.fetcher)?;
            binaries.push(BinaryReport {
                name: spec.name.clone(),
                version: spec.version.clone(),
                acquisition
            });
        }
        self.advance(Stage::BinariesReady);

        let env_path = Config::resolve(&self.root, &self.config.paths.env_file);
        let (profile, origin) = establish_profile(&env_path, &mut self.prompter)?;
        self.advance(Stage::EnvReady);

        let tools_path = Config::resolve(&self.root, &self.config.paths.tools_file);
        let reconcile =
            reconcile_tools_file(&tools_path, &self.config.source, &profile, &mut self.prompter)?;
        self.advance(Stage::ConfigReconciled);

        let exports = profile.env_vars();
        let dependencies = if self.skip_deps {
            info!("dependency installation skipped");
            DependencyStatus::Skipped
        } else {
            install_dependencies(&self.config.dependencies.command, &self.root, &exports)?;
            DependencyStatus::Installed {
                command: self.config.dependencies.command.clone()
            }
        };
        self.advance(Stage::DepsInstalled);

        let report = RunReport {
            platform,
            binaries,
            profile: ProfileReport {
                path: env_path,
                origin,
                project_id: profile.project_id.clone(),
                location: profile.location.clone()
            },
            tools: ToolsReport {
                path: tools_path,
                reconcile
            },
            dependencies,
            exports: exports
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
            next_steps: self.config.processes.clone()
        };
        self.advance(Stage::Reported);
        Ok(report)
    }
}
