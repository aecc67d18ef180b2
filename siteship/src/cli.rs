///
/// This module implements the full CLI interface for siteship—command
/// parsing, subcommand routing, and the user-visible deploy report.
///
/// All pipeline logic (task graph, manifest, sync orchestration) lives in
/// the [`siteship-core`] crate. This module is strictly CLI glue: resolve
/// configuration, wire the concrete FTP client to the core pipeline, print
/// the outcome, and derive the exit code.
///
/// ## How To Use
/// - For command-line users: use the installed `siteship` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// ## Extending
/// When adding subcommands, update [`Commands`] below and keep all
/// non-trivial logic inside `siteship-core`.
///
/// ---
///
/// [`siteship-core`]: ../../siteship_core/
use anyhow::Result;
use clap::{Parser, Subcommand};

use siteship_core::synchronise::{synchronise, CancelToken, SyncReport};
use siteship_core::tasks;

use crate::ftp::FtpRemote;
use crate::load_config::{self, DeployTarget};

/// CLI for siteship: build a static site and publish it over FTP.
#[derive(Parser)]
#[clap(
    name = "siteship",
    version,
    about = "Build a static site with external tools and publish the compiled output over FTP"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile stylesheets via the configured external tool
    Styles,
    /// Bundle and minify scripts via the configured external tool
    Scripts,
    /// Compress images via the configured external tool
    Images,
    /// Copy static assets into the compiled output folder
    Copy,
    /// Run styles, scripts, images and copy in dependency order
    Build,
    /// Build, then hand off to the external dev server with reload
    Serve,
    /// Sync the compiled output folder to the staging destination
    Staging,
    /// Sync the compiled output folder to the production destination
    Production,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Styles => run_task("styles"),
        Commands::Scripts => run_task("scripts"),
        Commands::Images => run_task("images"),
        Commands::Copy => run_task("copy"),
        Commands::Build => run_task("build"),
        Commands::Serve => run_task("serve"),
        Commands::Staging => deploy(DeployTarget::Staging).await,
        Commands::Production => deploy(DeployTarget::Production).await,
    }
}

fn run_task(name: &str) -> Result<()> {
    let config = load_config::build_config();
    config.trace_loaded();
    let graph = tasks::default_graph(&config)?;
    graph.run(name)?;
    println!("Task '{name}' complete.");
    Ok(())
}

async fn deploy(target: DeployTarget) -> Result<()> {
    // Configuration failures surface here, before any connection attempt.
    let config = load_config::deploy_config(target)?;
    config.trace_loaded();

    // Connection or login failure is fatal and aborts before any transfer.
    let remote = FtpRemote::connect(&config.credentials, config.concurrency_limit).await?;

    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received: no new transfers will start");
            interrupt.cancel();
        }
    });

    let report = synchronise(&config, &remote, &cancel).await?;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => tracing::debug!(json = %json, "Deploy report as JSON"),
        Err(e) => tracing::error!(error = ?e, "Failed to serialize deploy report"),
    }
    print_report(target, &report);

    if report.is_success() {
        Ok(())
    } else if !report.cancelled.is_empty() {
        Err(anyhow::anyhow!(
            "deploy to {} interrupted: {} file(s) never started",
            target.name(),
            report.cancelled.len()
        ))
    } else {
        Err(anyhow::anyhow!(
            "deploy to {} finished with {} failed file(s)",
            target.name(),
            report.failed.len()
        ))
    }
}

fn print_report(target: DeployTarget, report: &SyncReport) {
    println!("Deploy report ({}):", target.name());
    println!("  matched:  {}", report.matched);
    println!("  uploaded: {}", report.uploaded.len());
    println!("  skipped:  {}", report.skipped.len());
    if !report.cancelled.is_empty() {
        println!("  cancelled: {}", report.cancelled.len());
    }
    if report.failed.is_empty() {
        println!("  failed:   0");
    } else {
        println!("  failed:   {}", report.failed.len());
        for failure in &report.failed {
            println!("    {}: {}", failure.path, failure.cause);
        }
    }
}
