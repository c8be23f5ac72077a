//! Vigil - query, maintain and monitor an orchestration server.
//!
//! Main entry point for the Vigil CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{
    assets, config, executions, logs, monitor, namespaces, test_suites, triggers,
};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Vigil - query, maintain and monitor an orchestration server
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: http://localhost:8080)
    #[arg(long, global = true, env = "VIGIL_SERVER_URL")]
    pub server: Option<String>,

    /// Tenant (default: main)
    #[arg(long, global = true, env = "VIGIL_TENANT")]
    pub tenant: Option<String>,

    /// Bearer token, overriding the configured credentials
    #[arg(long, global = true, env = "VIGIL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory holding config.toml and logs/
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query, count and act on executions
    Executions(executions::ExecutionsArgs),

    /// Fetch execution logs
    Logs(logs::LogsArgs),

    /// List namespaces
    Namespaces(namespaces::NamespacesArgs),

    /// List, maintain and purge assets
    Assets(assets::AssetsArgs),

    /// Toggle triggers and detect unhealthy schedules
    Triggers(triggers::TriggersArgs),

    /// Run test suites
    Tests(test_suites::TestsArgs),

    /// Run a configured polling monitor
    Monitor(monitor::MonitorArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "vigil=debug,vigil_engine=debug,vigil_client=debug,vigil_config=debug,info"
    } else {
        "vigil=info,vigil_engine=info,warn"
    };

    let log_dir = cli
        .config_dir
        .clone()
        .or_else(vigil_config::user_config_dir)
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "vigil.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "vigil=trace,vigil_engine=trace,vigil_client=trace,vigil_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context::load(commands::GlobalOptions {
        server: cli.server,
        tenant: cli.tenant,
        token: cli.token,
        config_dir: cli.config_dir,
        json_output: cli.json,
        verbose: cli.verbose,
    })?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Executions(args) => executions::run(args, &ctx).await,
        Commands::Logs(args) => logs::run(args, &ctx).await,
        Commands::Namespaces(args) => namespaces::run(args, &ctx).await,
        Commands::Assets(args) => assets::run(args, &ctx).await,
        Commands::Triggers(args) => triggers::run(args, &ctx).await,
        Commands::Tests(args) => test_suites::run(args, &ctx).await,
        Commands::Monitor(args) => monitor::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
