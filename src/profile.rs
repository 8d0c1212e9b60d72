//! Environment profile (`.env`) management.
//!
//! The profile holds the values every dependent process reads from its
//! environment:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `GOOGLE_GENAI_USE_VERTEXAI` | Route model calls through Vertex AI, always `TRUE` when created here |
//! | `GOOGLE_CLOUD_PROJECT` | Cloud project identifier |
//! | `GOOGLE_CLOUD_LOCATION` | Cloud region identifier |
//!
//! The file is created once. When it exists it is authoritative and never
//! rewritten, even if it contains keys this crate does not know about.

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{BootstrapResult, configuration_error, file_read_error, file_write_error},
    prompt::Prompter
};

pub const USE_VERTEX_AI_KEY: &str = "GOOGLE_GENAI_USE_VERTEXAI";
pub const PROJECT_KEY: &str = "GOOGLE_CLOUD_PROJECT";
pub const LOCATION_KEY: &str = "GOOGLE_CLOUD_LOCATION";

/// Values shared by all dependent processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvProfile {
    pub use_vertex_ai: bool,
    pub project_id:    String,
    pub location:      String
}

/// Where the profile came from during this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOrigin {
    Loaded,
    Created
}

impl EnvProfile {
    /// Build a profile from entries of a parsed env file
    ///
    /// Missing keys become empty strings; [`EnvProfile::validate`] rejects
    /// them afterwards.
    pub fn from_entries(entries: &IndexMap<String, String>) -> Self {
        let get = |key: &str| entries.get(key).cloned().unwrap_or_default();
        Self {
            use_vertex_ai: entries.get(USE_VERTEX_AI_KEY).is_some_and(|v| parse_flag(v)),
            project_id:    get(PROJECT_KEY),
            location:      get(LOCATION_KEY)
        }
    }

    /// Parse env file content
    pub fn parse(content: &str) -> Self {
        Self::from_entries(&parse_env_entries(content))
    }

    /// Render as env file content
    ///
    /// Values a shell would split or cut at a comment are double-quoted.
    pub fn render(&self) -> String {
        self.env_vars()
            .into_iter()
            .map(|(key, value)| format!("{}={}\n", key, quote_value(&value)))
            .collect()
    }

    /// First required key whose value is empty
    pub fn missing_key(&self) -> Option<&'static str> {
        if self.project_id.trim().is_empty() {
            Some(PROJECT_KEY)
        } else if self.location.trim().is_empty() {
            Some(LOCATION_KEY)
        } else {
            None
        }
    }

    /// Check that both required values are non-empty
    pub fn validate(&self) -> BootstrapResult<()> {
        match self.missing_key() {
            Some(key) => Err(configuration_error(format!("{} must not be empty", key))),
            None => Ok(())
        }
    }

    /// Variables to export to dependent processes
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                USE_VERTEX_AI_KEY,
                String::from(if self.use_vertex_ai { "TRUE" } else { "FALSE" })
            ),
            (PROJECT_KEY, self.project_id.clone()),
            (LOCATION_KEY, self.location.clone())
        ]
    }
}

/// Parse `KEY=VALUE` lines
///
/// Blank lines and `#` comments are skipped and a leading `export ` is
/// dropped. Values are read the way a shell would: double quotes honour
/// `\\`, `\"`, `\$` and `` \` `` escapes, single quotes are literal and an
/// unquoted value ends at a ` #` comment. Later duplicates win.
pub fn parse_env_entries(content: &str) -> IndexMap<String, String> {
    let mut entries = IndexMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        entries.insert(key.trim().to_string(), parse_value(value.trim_start()));
    }
    entries
}

fn parse_value(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some('"') => {
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => match chars.next() {
                        Some(escaped @ ('\\' | '"' | '$' | '`')) => value.push(escaped),
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => value.push('\\')
                    },
                    _ => value.push(c)
                }
            }
            value
        }
        Some('\'') => chars.take_while(|&c| c != '\'').collect(),
        _ => {
            let end = raw
                .char_indices()
                .find(|&(i, c)| c == '#' && raw[..i].ends_with([' ', '\t']))
                .map_or(raw.len(), |(i, _)| i);
            raw[..end].trim().to_string()
        }
    }
}

fn quote_value(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@,+=%".contains(c));
    if plain {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load the profile at `path`, or prompt for it and create the file
pub fn establish_profile<P: Prompter + ?Sized>(
    path: &Path,
    prompter: &mut P
) -> BootstrapResult<(EnvProfile, ProfileOrigin)> {
    if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| file_read_error(path, e))?;
        let profile = EnvProfile::parse(&content);
        debug!(path = %path.display(), "loaded environment profile");
        if let Some(key) = profile.missing_key() {
            return Err(configuration_error(format!(
                "{} is missing or empty in {} (edit the file or remove it to be prompted again)",
                key,
                path.display()
            )));
        }
        return Ok((profile, ProfileOrigin::Loaded));
    }

    let profile = EnvProfile {
        use_vertex_ai: true,
        project_id:    prompter.ask("Google Cloud project ID", None)?,
        location:      prompter.ask("Google Cloud location", None)?
    };
    profile.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| file_write_error(parent, e))?;
    }
    fs::write(path, profile.render()).map_err(|e| file_write_error(path, e))?;
    info!(path = %path.display(), "created environment profile");
    Ok((profile, ProfileOrigin::Created))
}
