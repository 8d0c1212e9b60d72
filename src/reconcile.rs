//! Tool-source config reconciliation.
//!
//! The query gateway reads its data source from `tools.yaml`:
//!
//! ```yaml
//! sources:
//!   my-bq-source:
//!     kind: bigquery
//!     project: demo-proj
//!     location: us-central1
//! ```
//!
//! Reconciliation makes sure `project` and `location` are filled without
//! touching anything else. Each field goes through read-check-fill on its
//! own: an absent or null value is prompted for (the environment profile
//! supplies the default) and written back, any other value is kept. The
//! file is only written when a field was filled, so a fully populated file
//! stays byte-identical. A fill edits just the line holding the value (or
//! inserts one), leaving comments and formatting elsewhere untouched; only a
//! layout the line editor cannot handle, such as a flow mapping, falls back
//! to re-serializing the whole document.

use std::{fs, path::Path};

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::{
    config::SourceConfig,
    document::{FieldPath, get_path, is_unset, set_path, set_path_in_text},
    error::{BootstrapResult, config_syntax_error},
    profile::EnvProfile,
    prompt::Prompter
};

/// One field to reconcile
#[derive(Debug, Clone)]
pub struct FieldTarget {
    /// Short name used in prompts and reports
    pub label:    String,
    pub path:     FieldPath,
    /// Default offered at the prompt
    pub fallback: String
}

impl FieldTarget {
    /// The `project` and `location` targets for a source
    pub fn for_source(source: &SourceConfig, profile: &EnvProfile) -> Vec<Self> {
        vec![
            Self {
                label:    String::from("project"),
                path:     FieldPath::source_field(&source.name, "project"),
                fallback: profile.project_id.clone()
            },
            Self {
                label:    String::from("location"),
                path:     FieldPath::source_field(&source.name, "location"),
                fallback: profile.location.clone()
            }
        ]
    }
}

/// What happened to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// Value was already set and left alone
    Kept,
    /// Value was unset and has been written
    Filled { value: String }
}

/// Per-field result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub label:   String,
    pub path:    String,
    #[serde(flatten)]
    pub outcome: FieldOutcome
}

/// Result of reconciling one tools file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Skeleton was created this run
    pub synthesized: bool,
    pub fields:      Vec<FieldReport>
}

impl ReconcileReport {
    /// Whether any field was written
    pub fn changed(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f.outcome, FieldOutcome::Filled { .. }))
    }
}

/// Minimal document naming the source with unset project and location
pub fn skeleton(source: &SourceConfig) -> Value {
    let mut entry = Mapping::new();
    entry.insert(Value::from("kind"), Value::from(source.kind.as_str()));
    entry.insert(Value::from("project"), Value::Null);
    entry.insert(Value::from("location"), Value::Null);

    let mut sources = Mapping::new();
    sources.insert(Value::from(source.name.as_str()), Value::Mapping(entry));

    let mut root = Mapping::new();
    root.insert(Value::from("sources"), Value::Mapping(sources));
    Value::Mapping(root)
}

/// Parse document text
///
/// An empty file is an empty document.
pub fn parse_document(path: &Path, content: &str) -> BootstrapResult<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(content).map_err(|e| config_syntax_error(path, e.to_string()))
}

fn read_text(path: &Path) -> BootstrapResult<String> {
    fs::read_to_string(path).map_err(|e| config_syntax_error(path, e.to_string()))
}

fn write_text(path: &Path, content: &str) -> BootstrapResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| config_syntax_error(parent, e.to_string()))?;
    }
    fs::write(path, content).map_err(|e| config_syntax_error(path, e.to_string()))
}

/// Read and parse the document at `path`
pub fn load_document(path: &Path) -> BootstrapResult<Value> {
    parse_document(path, &read_text(path)?)
}

/// Serialize and write `doc` to `path`
pub fn save_document(path: &Path, doc: &Value) -> BootstrapResult<()> {
    let content = serde_yaml::to_string(doc).map_err(|e| config_syntax_error(path, e.to_string()))?;
    write_text(path, &content)
}

/// Document text after `field` was set to `value` in `doc`
///
/// `doc` must already hold the new value. The in-place edit of `text` is
/// used only when it parses back to exactly `doc`.
pub fn render_fill(
    file: &Path,
    text: &str,
    doc: &Value,
    field: &FieldPath,
    value: &str
) -> BootstrapResult<String> {
    let edited = set_path_in_text(text, field, value)
        .filter(|edited| parse_document(file, edited).is_ok_and(|parsed| parsed == *doc));
    match edited {
        Some(edited) => Ok(edited),
        None => {
            warn!(path = %file.display(), %field, "layout not editable in place, rewriting tools file");
            serde_yaml::to_string(doc).map_err(|e| config_syntax_error(file, e.to_string()))
        }
    }
}

/// Create the skeleton file if `path` does not exist
///
/// Returns whether the file was created.
pub fn ensure_tools_file(path: &Path, source: &SourceConfig) -> BootstrapResult<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_document(path, &skeleton(source))?;
    info!(path = %path.display(), source = %source.name, "synthesized tools file skeleton");
    Ok(true)
}

/// Run read-check-fill for one field of an in-memory document
pub fn reconcile_field<P: Prompter + ?Sized>(
    file: &Path,
    doc: &mut Value,
    target: &FieldTarget,
    prompter: &mut P
) -> BootstrapResult<FieldOutcome> {
    if !is_unset(get_path(doc, &target.path)) {
        debug!(path = %target.path, "field already set");
        return Ok(FieldOutcome::Kept);
    }

    let question = format!("Value for {} ({})", target.label, target.path);
    let default = Some(target.fallback.as_str()).filter(|d| !d.is_empty());
    let value = prompter.ask(&question, default)?;
    set_path(doc, &target.path, Value::String(value.clone()))
        .map_err(|e| config_syntax_error(file, e.to_string()))?;
    Ok(FieldOutcome::Filled {
        value
    })
}

/// Reconcile the tools file at `path` for `source`
///
/// The skeleton is synthesized first when the file is missing. Every filled
/// field is persisted before the next one is read.
pub fn reconcile_tools_file<P: Prompter + ?Sized>(
    path: &Path,
    source: &SourceConfig,
    profile: &EnvProfile,
    prompter: &mut P
) -> BootstrapResult<ReconcileReport> {
    let synthesized = ensure_tools_file(path, source)?;
    let mut text = read_text(path)?;
    let mut doc = parse_document(path, &text)?;

    let mut fields = Vec::new();
    for target in FieldTarget::for_source(source, profile) {
        let outcome = reconcile_field(path, &mut doc, &target, prompter)?;
        if let FieldOutcome::Filled {
            value
        } = &outcome
        {
            text = render_fill(path, &text, &doc, &target.path, value)?;
            write_text(path, &text)?;
            info!(path = %target.path, %value, "filled tools file field");
        }
        fields.push(FieldReport {
            label: target.label,
            path:  target.path.to_string(),
            outcome
        });
    }

    Ok(ReconcileReport {
        synthesized,
        fields
    })
}
