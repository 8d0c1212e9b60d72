//! Dependency installation delegate.
//!
//! The package manager is an opaque collaborator: its command runs in the
//! project root with the profile values exported into its environment. Its
//! stdout is redirected to stderr so its diagnostics reach the operator
//! while stdout carries only the final report.

use std::{io, path::Path, process::Command};

use tracing::info;

use crate::error::{BootstrapResult, configuration_error, dependency_install_error};

/// Run `command` (program followed by arguments) in `cwd`
pub fn install_dependencies(
    command: &[String],
    cwd: &Path,
    env: &[(&str, String)]
) -> BootstrapResult<()> {
    let Some((program, args)) = command.split_first() else {
        return Err(configuration_error("dependency install command is empty"));
    };
    let command_line = command.join(" ");
    info!(command = %command_line, cwd = %cwd.display(), "installing dependencies");

    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(env.iter().map(|(key, value)| (*key, value.as_str())))
        .stdout(io::stderr())
        .status()
        .map_err(|e| {
            dependency_install_error(format!("failed to run '{}': {}", command_line, e), None)
        })?;

    if !status.success() {
        return Err(dependency_install_error(
            format!("'{}' exited with {}", command_line, status),
            status.code()
        ));
    }

    Ok(())
}
