use std::{
    collections::HashMap,
    path::{Path, PathBuf}
};

use bq_agent_bootstrap::{config::Config, error::BootstrapError};

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.paths.env_file, PathBuf::from(".env"));
    assert_eq!(config.paths.tools_file, PathBuf::from("tools.yaml"));
    assert_eq!(config.source.name, "my-bq-source");
    assert_eq!(config.source.kind, "bigquery");
    assert_eq!(config.download.timeout_secs, 300);
    assert!(!config.dependencies.skip);
    assert_eq!(
        config.dependencies.command,
        ["pip", "install", "-r", "requirements.txt"]
    );
}

#[test]
fn test_default_binaries_are_pinned() {
    let config = Config::default();
    let names: Vec<_> = config.binaries.iter().map(|b| b.name.as_str()).collect();

    assert_eq!(names, ["toolbox", "yq"]);
    assert_eq!(config.binaries[0].version, "0.7.0");
    assert_eq!(config.binaries[1].version, "4.45.1");
}

#[test]
fn test_default_processes() {
    let config = Config::default();

    assert_eq!(config.processes.len(), 3);
    assert!(config.processes[0].command.contains("--tools-file tools.yaml"));
    assert_eq!(
        config.processes[2].endpoint.as_deref(),
        Some("http://localhost:8000")
    );
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = Config::from_toml_str(
        r#"
[source]
name = "analytics"

[dependencies]
skip = true
"#
    )
    .unwrap();

    assert_eq!(config.source.name, "analytics");
    assert_eq!(config.source.kind, "bigquery");
    assert!(config.dependencies.skip);
    assert_eq!(config.binaries.len(), 2);
    assert_eq!(config.processes.len(), 3);
    assert_eq!(config.paths.env_file, PathBuf::from(".env"));
}

#[test]
fn test_binaries_table_replaces_defaults() {
    let config = Config::from_toml_str(
        r#"
[[binaries]]
name = "toolbox"
version = "0.8.0"
url = "https://mirror.example/{version}/{os}-{arch}"
target = "bin/toolbox"
"#
    )
    .unwrap();

    assert_eq!(config.binaries.len(), 1);
    assert_eq!(config.binaries[0].target, PathBuf::from("bin/toolbox"));
}

#[test]
fn test_invalid_toml() {
    let err = Config::from_toml_str("[source\nname = 1").unwrap_err();
    assert!(matches!(err, BootstrapError::Configuration(_)));
}

#[test]
fn test_apply_env_overrides() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("TOOLBOX_VERSION", "0.9.1"),
        ("AGENT_BOOTSTRAP_ENV_FILE", "config/agent.env"),
        ("AGENT_BOOTSTRAP_TOOLS_FILE", "/etc/toolbox/tools.yaml")
    ]);
    let mut config = Config::default();

    config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(config.binaries[0].version, "0.9.1");
    assert_eq!(config.binaries[1].version, "4.45.1");
    assert_eq!(config.paths.env_file, PathBuf::from("config/agent.env"));
    assert_eq!(
        config.paths.tools_file,
        PathBuf::from("/etc/toolbox/tools.yaml")
    );
}

#[test]
fn test_apply_env_dashed_binary_name() {
    let mut config = Config::from_toml_str(
        r#"
[[binaries]]
name = "gcs-fuse"
version = "1.0.0"
url = "https://example.invalid/{version}"
target = "gcs-fuse"
"#
    )
    .unwrap();

    config.apply_env(|key| (key == "GCS_FUSE_VERSION").then(|| String::from("2.0.0")));

    assert_eq!(config.binaries[0].version, "2.0.0");
}

#[test]
fn test_validate_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_rejects_empty_source_name() {
    let mut config = Config::default();
    config.source.name = String::from(" ");
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_version() {
    let mut config = Config::default();
    config.binaries[1].version.clear();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("yq"));
}

#[test]
fn test_validate_empty_command_needs_skip() {
    let mut config = Config::default();
    config.dependencies.command.clear();
    assert!(config.validate().is_err());

    config.dependencies.skip = true;
    assert!(config.validate().is_ok());
}

#[test]
fn test_resolve_paths() {
    let root = Path::new("/work/project");
    assert_eq!(
        Config::resolve(root, Path::new(".env")),
        PathBuf::from("/work/project/.env")
    );
    assert_eq!(
        Config::resolve(root, Path::new("/abs/tools.yaml")),
        PathBuf::from("/abs/tools.yaml")
    );
}
