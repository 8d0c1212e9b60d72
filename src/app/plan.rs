//! Dry-run planning.
//!
//! Inspects the same state a run would, without prompting, downloading,
//! writing or installing anything.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    config::{Config, ProcessSpec},
    document::{FieldPath, get_path, is_unset},
    error::BootstrapResult,
    platform::{Host, Platform},
    profile::ProfileOrigin,
    reconcile::load_document
};

/// What a run would do for one binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BinaryAction {
    Keep,
    Download { url: String }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedBinary {
    pub name:    String,
    pub version: String,
    pub path:    PathBuf,
    #[serde(flatten)]
    pub action:  BinaryAction
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedProfile {
    pub path:   PathBuf,
    /// `Loaded` when the file exists, `Created` when it would be prompted for
    pub origin: ProfileOrigin
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedField {
    pub label: String,
    pub path:  String,
    /// Whether a run would prompt for this field
    pub unset: bool
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedTools {
    pub path:       PathBuf,
    pub synthesize: bool,
    pub fields:     Vec<PlannedField>
}

/// Actions a run would take
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub platform:     Platform,
    pub binaries:     Vec<PlannedBinary>,
    pub profile:      PlannedProfile,
    pub tools:        PlannedTools,
    /// `None` when installation is skipped
    pub dependencies: Option<Vec<String>>,
    pub next_steps:   Vec<ProcessSpec>
}

/// Compute the plan for `root` on `host`
///
/// The platform gate and tools file parsing fail exactly as they would
/// during a run.
pub fn plan(config: &Config, root: &Path, host: &Host, skip_deps: bool) -> BootstrapResult<Plan> {
    let platform = Platform::resolve(host)?;

    let binaries = config
        .binaries
        .iter()
        .map(|spec| {
            let path = spec.target_in(root);
            let action = if path.exists() {
                BinaryAction::Keep
            } else {
                BinaryAction::Download {
                    url: spec.url_for(platform)
                }
            };
            PlannedBinary {
                name: spec.name.clone(),
                version: spec.version.clone(),
                path,
                action
            }
        })
        .collect();

    let env_path = Config::resolve(root, &config.paths.env_file);
    let origin = if env_path.exists() {
        ProfileOrigin::Loaded
    } else {
        ProfileOrigin::Created
    };

    let tools_path = Config::resolve(root, &config.paths.tools_file);
    let synthesize = !tools_path.exists();
    let doc = if synthesize {
        None
    } else {
        Some(load_document(&tools_path)?)
    };
    let fields = ["project", "location"]
        .into_iter()
        .map(|label| {
            let path = FieldPath::source_field(&config.source.name, label);
            let unset = doc
                .as_ref()
                .is_none_or(|doc| is_unset(get_path(doc, &path)));
            PlannedField {
                label: label.to_string(),
                path: path.to_string(),
                unset
            }
        })
        .collect();

    Ok(Plan {
        platform,
        binaries,
        profile: PlannedProfile {
            path: env_path,
            origin
        },
        tools: PlannedTools {
            path: tools_path,
            synthesize,
            fields
        },
        dependencies: (!skip_deps).then(|| config.dependencies.command.clone()),
        next_steps: config.processes.clone()
    })
}
