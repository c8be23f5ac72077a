//! Config command - inspect configuration.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::{Context, print_json};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the merged configuration and configured monitors
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Show the user configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let config_dir = ctx.config_dir.as_deref();
    let json = ctx.json_output;
    match args.command {
        ConfigCommand::Show => cmd_show(config_dir, json),
        ConfigCommand::Which => cmd_which(config_dir),
        ConfigCommand::Path => cmd_path(config_dir),
    }
}

fn cmd_show(config_dir: Option<&Path>, json: bool) -> Result<()> {
    let loaded = vigil_config::load_config_with_options(None, config_dir)?;
    let config = &loaded.config;

    if json {
        return print_json(config);
    }

    println!("# Vigil Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    println!("Server:");
    println!("  url: {}", config.server_url());
    println!("  tenant: {}", config.tenant());
    if let Some(timeout) = config.timeout() {
        println!("  timeout: {}s", timeout.as_secs());
    }
    println!();

    if !config.monitors.schedule.is_empty() || !config.monitors.freshness.is_empty() {
        println!("Monitors:");
        for monitor in &config.monitors.schedule {
            println!("  {:<20} schedule  every {}s", monitor.name, monitor.interval_secs);
        }
        for monitor in &config.monitors.freshness {
            println!("  {:<20} freshness every {}s", monitor.name, monitor.interval_secs);
        }
        println!();
    }

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    Ok(())
}

fn cmd_which(config_dir: Option<&Path>) -> Result<()> {
    let loaded = vigil_config::load_config_with_options(None, config_dir)?;

    println!("Config file search order (later overrides earlier):\n");
    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }
    println!();

    Ok(())
}

fn cmd_path(config_dir: Option<&Path>) -> Result<()> {
    let path = match config_dir {
        Some(dir) => Some(dir.join("config.toml")),
        None => vigil_config::user_config_path(),
    };
    match path {
        Some(path) => println!("{}", path.display()),
        None => println!("No config directory available on this platform"),
    }
    Ok(())
}
