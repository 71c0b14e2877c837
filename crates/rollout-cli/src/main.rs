//! Rollout - incremental service deploys
//!
//! Usage:
//!   rollout deploy              # Deploy whatever the configured policy selects
//!   rollout deploy main_app     # Deploy named services only
//!   rollout deploy --dry-run    # Show what a deploy would do
//!   rollout status              # Show last deploy and service liveness

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollout_core::commands::{
    DeployCommand, DeployOptions, StatusCommand, StatusOptions, StatusReport,
};
use rollout_core::error::DeployError;
use rollout_core::orchestration::{DeployOutcome, DeployReport};
use rollout_core::selection::SelectionMode;

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "Incremental deploys for supervised services", long_about = None)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync, restart what changed, verify, and record the revision
    Deploy {
        /// Services to deploy (default: selected by the configured mode)
        services: Vec<String>,

        /// Restart even if nothing changed
        #[arg(long)]
        force_restart: bool,

        /// Reinstall dependencies even if the manifest did not change
        #[arg(long = "force-deps")]
        force_deps: bool,

        /// Path to rollout.toml
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Selection mode (overrides [selection] mode)
        #[arg(long)]
        mode: Option<ModeArg>,

        /// Report what would happen without resetting, restarting, or recording
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the last deployed revision and recent history
    Status {
        /// Path to rollout.toml
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Number of history entries to show
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,

        /// Skip querying the supervisor for service liveness
        #[arg(long)]
        no_probe: bool,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Named services, or every service
    Explicit,
    /// Services whose path patterns match the change set
    Pattern,
}

impl From<ModeArg> for SelectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Explicit => SelectionMode::Explicit,
            ModeArg::Pattern => SelectionMode::Pattern,
        }
    }
}

/// Everything that can end a command: classified deploy failures carry
/// their own exit code, anything else exits 1.
enum Failure {
    Deploy(DeployError),
    Other(anyhow::Error),
}

impl From<DeployError> for Failure {
    fn from(err: DeployError) -> Self {
        Failure::Deploy(err)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Other(err)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::Other(err.into())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "rollout=debug,rollout_core=debug,info"
    } else {
        "rollout=info,rollout_core=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Deploy(err)) => {
            eprintln!("Error: {}", err);
            if let DeployError::Verification { diagnostics, .. } = &err
                && !diagnostics.is_empty()
            {
                eprintln!();
                eprintln!("{}", diagnostics);
            }
            ExitCode::from(err.exit_code())
        }
        Err(Failure::Other(err)) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Failure> {
    match command {
        Commands::Deploy {
            services,
            force_restart,
            force_deps,
            config,
            mode,
            dry_run,
            format,
        } => {
            let mut options = DeployOptions::new()
                .with_services(services)
                .with_force_restart(force_restart)
                .with_force_dependency_reinstall(force_deps)
                .with_dry_run(dry_run);
            if let Some(path) = config {
                options = options.with_config(path);
            }
            if let Some(mode) = mode {
                options = options.with_mode(mode.into());
            }

            let cmd = DeployCommand::from_options(&options)?;
            let report = cmd.execute(&options)?;
            print_deploy_result(&report, format)?;
        }
        Commands::Status {
            config,
            format,
            limit,
            no_probe,
        } => {
            let options = StatusOptions {
                config_path: config,
                limit,
                probe_services: !no_probe,
            };
            let cmd = StatusCommand::from_options(&options)?;
            let report = cmd.execute(&options)?;
            print_status(&report, format)?;
        }
    }
    Ok(())
}

fn print_deploy_result(report: &DeployReport, format: OutputFormat) -> Result<(), Failure> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            let previous = report
                .previous
                .as_ref()
                .map(|r| r.short().to_string())
                .unwrap_or_else(|| "-".to_string());
            match report.outcome {
                DeployOutcome::Skipped => {
                    println!("• {} is already deployed, nothing to do", report.current.short());
                    return Ok(());
                }
                DeployOutcome::Deployed => {
                    println!("✓ Deployed {} (previous: {})", report.current.short(), previous);
                }
                DeployOutcome::Planned => {
                    println!("Plan for {} (previous: {})", report.current.short(), previous);
                }
            }
            println!("  Changed paths: {}", report.changed_paths.len());
            println!(
                "  Dependencies: {}",
                if report.reinstalled_deps { "reinstall" } else { "unchanged" }
            );
            if report.restarted.is_empty() {
                println!("  Services: none");
            } else {
                println!("  Services: {}", report.restarted.join(", "));
            }
        }
    }
    Ok(())
}

fn print_status(report: &StatusReport, format: OutputFormat) -> Result<(), Failure> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Config: {}", report.config_path.display());
    println!("Repo: {}", report.repo_root.display());
    match &report.last_commit {
        Some(revision) => println!("Last deployed: {}", revision),
        None => println!("Last deployed: never"),
    }
    println!();

    if report.services.is_empty() {
        println!("No services configured.");
    } else {
        println!("Services ({}):", report.services.len());
        println!("  {:<20} {:<28} Status", "Name", "Unit");
        println!("  {}", "-".repeat(60));
        for service in &report.services {
            let status = service
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("  {:<20} {:<28} {}", service.name, service.unit, status);
        }
    }
    println!();

    if report.history.is_empty() {
        println!("No deploys recorded.");
        return Ok(());
    }
    println!("Recent deploys:");
    for record in &report.history {
        let services = if record.services.is_empty() {
            "-".to_string()
        } else {
            record.services.join(", ")
        };
        println!(
            "  {}  {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.revision.short(),
            services
        );
    }
    Ok(())
}
