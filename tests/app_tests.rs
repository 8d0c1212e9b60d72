mod common;

use std::fs;

use bq_agent_bootstrap::{
    app::{BinaryAction, Bootstrapper, DependencyStatus, Stage, plan},
    error::BootstrapError,
    platform::Host,
    profile::ProfileOrigin,
    reconcile::FieldOutcome
};
use common::{
    FakeFetcher, answers, linux_host, no_answers, stub_binaries, test_config, write_profile
};
use serde_yaml::Value;
use tempfile::TempDir;

fn field<'a>(doc: &'a Value, name: &str) -> &'a Value {
    &doc["sources"]["my-bq-source"][name]
}

#[test]
fn test_fresh_checkout_creates_everything() {
    let dir = TempDir::new().unwrap();
    let fetcher = FakeFetcher::serving(b"#!/bin/sh\n");
    let mut prompter = answers(&["demo-proj", "us-central1", "", ""]);

    let mut bootstrapper = Bootstrapper::new(test_config(), dir.path(), &mut prompter, &fetcher)
        .with_host(linux_host());
    let report = bootstrapper.run().unwrap();
    assert_eq!(bootstrapper.stage(), Stage::Reported);

    assert_eq!(fetcher.call_count(), 2);
    assert!(
        fetcher
            .calls()
            .iter()
            .any(|url| url.contains("/v0.7.0/linux/amd64/toolbox"))
    );
    assert!(dir.path().join("toolbox").exists());
    assert!(dir.path().join("yq").exists());

    let env = fs::read_to_string(dir.path().join(".env")).unwrap();
    assert_eq!(
        env,
        "GOOGLE_GENAI_USE_VERTEXAI=TRUE\nGOOGLE_CLOUD_PROJECT=demo-proj\nGOOGLE_CLOUD_LOCATION=us-central1\n"
    );
    assert_eq!(report.profile.origin, ProfileOrigin::Created);

    let tools = fs::read_to_string(dir.path().join("tools.yaml")).unwrap();
    let doc: Value = serde_yaml::from_str(&tools).unwrap();
    assert_eq!(field(&doc, "kind"), &Value::from("bigquery"));
    assert_eq!(field(&doc, "project"), &Value::from("demo-proj"));
    assert_eq!(field(&doc, "location"), &Value::from("us-central1"));
    assert!(report.tools.reconcile.synthesized);
    assert_eq!(report.dependencies, DependencyStatus::Skipped);
    assert_eq!(report.next_steps.len(), 3);
}

#[cfg(unix)]
#[test]
fn test_downloaded_binaries_are_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let fetcher = FakeFetcher::serving(b"binary");
    let mut bootstrapper = Bootstrapper::new(
        test_config(),
        dir.path(),
        answers(&["demo-proj", "us-central1"]),
        &fetcher
    )
    .with_host(linux_host());
    bootstrapper.run().unwrap();

    let mode = fs::metadata(dir.path().join("toolbox"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[test]
fn test_second_run_leaves_artifacts_byte_identical() {
    let dir = TempDir::new().unwrap();
    let fetcher = FakeFetcher::serving(b"binary");
    Bootstrapper::new(
        test_config(),
        dir.path(),
        answers(&["demo-proj", "us-central1"]),
        &fetcher
    )
    .with_host(linux_host())
    .run()
    .unwrap();

    let env_before = fs::read(dir.path().join(".env")).unwrap();
    let tools_before = fs::read(dir.path().join("tools.yaml")).unwrap();

    let offline = FakeFetcher::failing();
    let mut prompter = no_answers();
    let report = Bootstrapper::new(test_config(), dir.path(), &mut prompter, &offline)
        .with_host(linux_host())
        .run()
        .unwrap();

    assert_eq!(offline.call_count(), 0);
    assert!(prompter.into_output().is_empty());
    assert_eq!(fs::read(dir.path().join(".env")).unwrap(), env_before);
    assert_eq!(fs::read(dir.path().join("tools.yaml")).unwrap(), tools_before);
    assert_eq!(report.profile.origin, ProfileOrigin::Loaded);
    assert!(!report.tools.reconcile.synthesized);
    assert!(
        report
            .tools
            .reconcile
            .fields
            .iter()
            .all(|f| f.outcome == FieldOutcome::Kept)
    );
}

#[test]
fn test_only_missing_location_is_filled() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    stub_binaries(dir.path(), &config);
    write_profile(dir.path(), "demo-proj", "us-central1");
    fs::write(
        dir.path().join("tools.yaml"),
        "sources:\n  my-bq-source:\n    kind: bigquery\n    project: \"other-proj\"\n"
    )
    .unwrap();

    let fetcher = FakeFetcher::failing();
    let report = Bootstrapper::new(config, dir.path(), answers(&[""]), &fetcher)
        .with_host(linux_host())
        .run()
        .unwrap();

    let doc: Value =
        serde_yaml::from_str(&fs::read_to_string(dir.path().join("tools.yaml")).unwrap()).unwrap();
    assert_eq!(field(&doc, "project"), &Value::from("other-proj"));
    assert_eq!(field(&doc, "location"), &Value::from("us-central1"));
    assert_eq!(report.tools.reconcile.fields[0].outcome, FieldOutcome::Kept);
    assert_eq!(
        report.tools.reconcile.fields[1].outcome,
        FieldOutcome::Filled {
            value: String::from("us-central1")
        }
    );
}

#[test]
fn test_unsupported_platform_stops_before_any_download() {
    let dir = TempDir::new().unwrap();
    let fetcher = FakeFetcher::serving(b"binary");
    let mut bootstrapper = Bootstrapper::new(
        test_config(),
        dir.path(),
        answers(&["demo-proj", "us-central1"]),
        &fetcher
    )
    .with_host(Host::new("windows", "x86_64"));

    let err = bootstrapper.run().unwrap_err();
    assert!(matches!(err, BootstrapError::UnsupportedPlatform { .. }));
    assert_eq!(bootstrapper.stage(), Stage::Start);
    assert_eq!(fetcher.call_count(), 0);
    assert!(!dir.path().join(".env").exists());
}

#[test]
fn test_download_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let fetcher = FakeFetcher::failing();
    let mut bootstrapper = Bootstrapper::new(
        test_config(),
        dir.path(),
        answers(&["demo-proj", "us-central1"]),
        &fetcher
    )
    .with_host(linux_host());

    let err = bootstrapper.run().unwrap_err();
    assert!(matches!(err, BootstrapError::Download { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(bootstrapper.stage(), Stage::PlatformCheck);
    assert_eq!(fetcher.call_count(), 1);
    assert!(!dir.path().join("toolbox").exists());
    assert!(!dir.path().join(".env").exists());
}

#[test]
fn test_empty_profile_answers_are_rejected() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    stub_binaries(dir.path(), &config);

    let fetcher = FakeFetcher::failing();
    let mut bootstrapper =
        Bootstrapper::new(config, dir.path(), answers(&["demo-proj", ""]), &fetcher)
            .with_host(linux_host());

    let err = bootstrapper.run().unwrap_err();
    assert!(matches!(err, BootstrapError::Configuration(_)));
    assert_eq!(bootstrapper.stage(), Stage::BinariesReady);
    assert!(!dir.path().join(".env").exists());
    assert!(!dir.path().join("tools.yaml").exists());
}

#[test]
fn test_malformed_tools_file_stops_after_profile() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    stub_binaries(dir.path(), &config);
    write_profile(dir.path(), "demo-proj", "us-central1");
    let broken = "sources: [unclosed\n";
    fs::write(dir.path().join("tools.yaml"), broken).unwrap();

    let fetcher = FakeFetcher::failing();
    let mut bootstrapper = Bootstrapper::new(config, dir.path(), no_answers(), &fetcher)
        .with_host(linux_host());

    let err = bootstrapper.run().unwrap_err();
    assert!(matches!(err, BootstrapError::ConfigSyntax { .. }));
    assert_eq!(bootstrapper.stage(), Stage::EnvReady);
    assert_eq!(
        fs::read_to_string(dir.path().join("tools.yaml")).unwrap(),
        broken
    );
}

#[cfg(unix)]
#[test]
fn test_dependency_failure_propagates_exit_code() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.dependencies.skip = false;
    config.dependencies.command = vec!["sh".into(), "-c".into(), "exit 7".into()];
    stub_binaries(dir.path(), &config);
    write_profile(dir.path(), "demo-proj", "us-central1");

    let fetcher = FakeFetcher::failing();
    let mut bootstrapper = Bootstrapper::new(config, dir.path(), answers(&["", ""]), &fetcher)
        .with_host(linux_host());

    let err = bootstrapper.run().unwrap_err();
    assert!(matches!(err, BootstrapError::DependencyInstall { .. }));
    assert_eq!(err.exit_code(), 7);
    assert_eq!(bootstrapper.stage(), Stage::ConfigReconciled);
}

#[cfg(unix)]
#[test]
fn test_dependency_installer_sees_profile_values() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.dependencies.skip = false;
    config.dependencies.command = vec![
        "sh".into(),
        "-c".into(),
        "test \"$GOOGLE_CLOUD_PROJECT\" = demo-proj && test \"$GOOGLE_GENAI_USE_VERTEXAI\" = TRUE"
            .into()
    ];
    stub_binaries(dir.path(), &config);
    write_profile(dir.path(), "demo-proj", "us-central1");

    let fetcher = FakeFetcher::failing();
    let report = Bootstrapper::new(config, dir.path(), answers(&["", ""]), &fetcher)
        .with_host(linux_host())
        .run()
        .unwrap();

    assert!(matches!(
        report.dependencies,
        DependencyStatus::Installed { .. }
    ));
}

#[test]
fn test_skip_deps_overrides_config() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.dependencies.skip = false;
    config.dependencies.command = vec![String::from("definitely-not-a-real-installer")];
    stub_binaries(dir.path(), &config);
    write_profile(dir.path(), "demo-proj", "us-central1");

    let fetcher = FakeFetcher::failing();
    let report = Bootstrapper::new(config, dir.path(), answers(&["", ""]), &fetcher)
        .with_host(linux_host())
        .skip_deps(true)
        .run()
        .unwrap();

    assert_eq!(report.dependencies, DependencyStatus::Skipped);
}

#[test]
fn test_missing_installer_is_dependency_error() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.dependencies.skip = false;
    config.dependencies.command = vec![String::from("definitely-not-a-real-installer")];
    stub_binaries(dir.path(), &config);
    write_profile(dir.path(), "demo-proj", "us-central1");

    let fetcher = FakeFetcher::failing();
    let err = Bootstrapper::new(config, dir.path(), answers(&["", ""]), &fetcher)
        .with_host(linux_host())
        .run()
        .unwrap_err();

    assert!(matches!(err, BootstrapError::DependencyInstall { .. }));
    assert_eq!(err.exit_code(), 6);
}

#[test]
fn test_plan_on_fresh_checkout_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = test_config();

    let plan = plan(&config, dir.path(), &linux_host(), true).unwrap();

    assert!(
        plan.binaries
            .iter()
            .all(|b| matches!(b.action, BinaryAction::Download { .. }))
    );
    assert_eq!(plan.profile.origin, ProfileOrigin::Created);
    assert!(plan.tools.synthesize);
    assert!(plan.tools.fields.iter().all(|f| f.unset));
    assert!(plan.dependencies.is_none());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_plan_reports_existing_state() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    stub_binaries(dir.path(), &config);
    write_profile(dir.path(), "demo-proj", "us-central1");
    fs::write(
        dir.path().join("tools.yaml"),
        "sources:\n  my-bq-source:\n    kind: bigquery\n    project: demo-proj\n    location: null\n"
    )
    .unwrap();

    let plan = plan(&config, dir.path(), &linux_host(), false).unwrap();

    assert!(plan.binaries.iter().all(|b| b.action == BinaryAction::Keep));
    assert_eq!(plan.profile.origin, ProfileOrigin::Loaded);
    assert!(!plan.tools.synthesize);
    assert!(!plan.tools.fields[0].unset);
    assert!(plan.tools.fields[1].unset);
    assert_eq!(plan.dependencies, Some(config.dependencies.command.clone()));
}

#[test]
fn test_plan_enforces_platform_gate() {
    let dir = TempDir::new().unwrap();
    let err = plan(
        &test_config(),
        dir.path(),
        &Host::new("freebsd", "amd64"),
        true
    )
    .unwrap_err();
    assert!(matches!(err, BootstrapError::UnsupportedPlatform { .. }));
}
