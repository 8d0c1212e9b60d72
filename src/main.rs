//! # BigQuery Agent Bootstrap
//!
//! Idempotent environment bootstrapper for the local BigQuery optimization
//! agent stack.
//!
//! The stack is three independently started processes: the MCP toolbox
//! query gateway, the anti-pattern detection service, and the ADK agent
//! runtime. This binary prepares everything they need and then prints the
//! commands that start them. It never starts them itself.
//!
//! # Stages
//!
//! 1. **Platform check** - the host must be linux or darwin on amd64 or
//!    arm64.
//! 2. **Binaries** - pinned `toolbox` and `yq` executables are downloaded
//!    unless a file already exists at their target path.
//! 3. **Environment profile** - `.env` is loaded, or prompted for and
//!    created with `GOOGLE_GENAI_USE_VERTEXAI=TRUE`.
//! 4. **Tools file** - `tools.yaml` gets a skeleton source entry if missing;
//!    an unset `project` or `location` is prompted for, defaulting to the
//!    profile values. Values already present are never overwritten.
//! 5. **Dependencies** - the configured package manager command runs.
//! 6. **Report** - next steps are printed.
//!
//! Any failure ends the run immediately. Re-running resumes, because every
//! stage skips work that is already done.
//!
//! # Quick Start
//!
//! ```bash
//! # First run: prompts for project and location
//! bq-agent-bootstrap
//!
//! # Preview without touching anything
//! bq-agent-bootstrap --dry-run
//!
//! # Machine-readable report, no package install
//! bq-agent-bootstrap --skip-deps -f json
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - File could not be read or written
//! - `2` - Unsupported platform
//! - `3` - Download failed
//! - `4` - Configuration value missing or invalid
//! - `5` - Tools file malformed
//! - `6` - Dependency installer could not run (a failing installer's own
//!   exit code is passed through)
//!
//! # Modules
//!
//! - `app` - Stage orchestration and dry-run planning
//! - `binary` - Pinned binary acquisition
//! - `profile` - Environment profile management
//! - `reconcile` - Tools file reconciliation
//! - `document` - YAML path reads and writes
//! - `config` - Settings loading
//! - `output` - Report formatting
//! - `error` - Error types and constructors

use std::{process, time::Duration};

use bq_agent_bootstrap::{
    app::{Bootstrapper, plan},
    binary::HttpFetcher,
    cli::Cli,
    config::Config,
    error::BootstrapResult,
    logging,
    output::{OutputOptions, format_plan, format_run_report},
    platform::Host,
    prompt::LinePrompter
};
use clap::Parser;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> BootstrapResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(&cli.root)?;
    let skip_deps = cli.skip_deps || config.dependencies.skip;
    let output_opts = OutputOptions {
        format:  cli.output_format.into(),
        colored: !cli.no_color
    };

    if cli.dry_run {
        let plan = plan(&config, &cli.root, &Host::current(), skip_deps)?;
        println!("{}", format_plan(&plan, &output_opts));
        return Ok(());
    }

    let fetcher = HttpFetcher::new(Duration::from_secs(config.download.timeout_secs));
    let mut bootstrapper =
        Bootstrapper::new(config, cli.root, LinePrompter::stdio(), fetcher).skip_deps(skip_deps);
    let report = bootstrapper.run()?;
    println!("{}", format_run_report(&report, &output_opts));
    Ok(())
}
