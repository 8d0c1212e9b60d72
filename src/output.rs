use colored::{ColoredString, Colorize};

use crate::{
    app::{BinaryAction, DependencyStatus, Plan, RunReport},
    binary::Acquisition,
    config::ProcessSpec,
    profile::ProfileOrigin,
    reconcile::FieldOutcome
};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

fn paint(text: &str, opts: &OutputOptions, style: fn(&str) -> ColoredString) -> String {
    if opts.colored {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn header(text: &str, opts: &OutputOptions) -> String {
    paint(&format!("=== {} ===", text), opts, |s| s.bold())
}

/// Format the report of a completed run
pub fn format_run_report(report: &RunReport, opts: &OutputOptions) -> String {
    if opts.format == OutputFormat::Json {
        return serde_json::to_string_pretty(report).unwrap_or_default();
    }

    let mut out = String::new();
    out.push_str(&header(&format!("Bootstrap complete ({})", report.platform), opts));
    out.push_str("\n\nBinaries:\n");
    for binary in &report.binaries {
        let status = match &binary.acquisition {
            Acquisition::AlreadyPresent {
                ..
            } => paint("already present", opts, |s| s.dimmed()),
            Acquisition::Downloaded {
                bytes, ..
            } => paint(&format!("downloaded ({} bytes)", bytes), opts, |s| s.green())
        };
        out.push_str(&format!(
            "  {} {}: {} [{}]\n",
            binary.name,
            binary.version,
            status,
            binary.acquisition.path().display()
        ));
    }

    let origin = match report.profile.origin {
        ProfileOrigin::Loaded => paint("loaded", opts, |s| s.dimmed()),
        ProfileOrigin::Created => paint("created", opts, |s| s.green())
    };
    out.push_str(&format!(
        "\nEnvironment profile: {} ({})\n",
        report.profile.path.display(),
        origin
    ));

    let tools = &report.tools;
    let synthesized = if tools.reconcile.synthesized {
        format!(" ({})", paint("synthesized", opts, |s| s.green()))
    } else {
        String::new()
    };
    out.push_str(&format!("Tools file: {}{}\n", tools.path.display(), synthesized));
    for field in &tools.reconcile.fields {
        let outcome = match &field.outcome {
            FieldOutcome::Kept => paint("kept", opts, |s| s.dimmed()),
            FieldOutcome::Filled {
                value
            } => paint(&format!("filled with {}", value), opts, |s| s.green())
        };
        out.push_str(&format!("  {}: {}\n", field.path, outcome));
    }

    let deps = match &report.dependencies {
        DependencyStatus::Installed {
            command
        } => format!("installed ({})", command.join(" ")),
        DependencyStatus::Skipped => String::from("skipped")
    };
    out.push_str(&format!("Dependencies: {}\n\n", deps));

    out.push_str(&header("Environment", opts));
    out.push('\n');
    for (key, value) in &report.exports {
        out.push_str(&format!("  export {}={}\n", key, value));
    }
    out.push('\n');

    out.push_str(&format_next_steps(&report.next_steps, opts));
    out
}

/// Format a dry-run plan
pub fn format_plan(plan: &Plan, opts: &OutputOptions) -> String {
    if opts.format == OutputFormat::Json {
        return serde_json::to_string_pretty(plan).unwrap_or_default();
    }

    let mut out = String::new();
    out.push_str(&header(&format!("DRY RUN ({})", plan.platform), opts));
    out.push_str("\n\nBinaries:\n");
    for binary in &plan.binaries {
        let action = match &binary.action {
            BinaryAction::Keep => String::from("keep existing file"),
            BinaryAction::Download {
                url
            } => format!("download {}", url)
        };
        out.push_str(&format!(
            "  {} {}: {} [{}]\n",
            binary.name,
            binary.version,
            action,
            binary.path.display()
        ));
    }

    let profile = match plan.profile.origin {
        ProfileOrigin::Loaded => "load existing file",
        ProfileOrigin::Created => "prompt and create"
    };
    out.push_str(&format!(
        "\nEnvironment profile: {} ({})\n",
        plan.profile.path.display(),
        profile
    ));

    let tools = if plan.tools.synthesize {
        "synthesize skeleton"
    } else {
        "reconcile existing file"
    };
    out.push_str(&format!("Tools file: {} ({})\n", plan.tools.path.display(), tools));
    for field in &plan.tools.fields {
        let state = if field.unset {
            paint("unset, will prompt", opts, |s| s.yellow())
        } else {
            String::from("set, will keep")
        };
        out.push_str(&format!("  {}: {}\n", field.path, state));
    }

    let deps = match &plan.dependencies {
        Some(command) => format!("run {}", command.join(" ")),
        None => String::from("skipped")
    };
    out.push_str(&format!("Dependencies: {}\n\n", deps));

    out.push_str(&format_next_steps(&plan.next_steps, opts));
    out
}

/// Format the commands that start the dependent processes
pub fn format_next_steps(processes: &[ProcessSpec], opts: &OutputOptions) -> String {
    let mut out = header("Next steps (one terminal each)", opts);
    out.push('\n');
    for (idx, process) in processes.iter().enumerate() {
        let endpoint = process
            .endpoint
            .as_deref()
            .map(|e| format!(" -> {}", e))
            .unwrap_or_default();
        out.push_str(&format!("  {}. {}{}\n", idx + 1, process.name, endpoint));
        out.push_str(&format!(
            "     {}\n",
            paint(&process.command, opts, |s| s.cyan())
        ));
    }
    out
}
