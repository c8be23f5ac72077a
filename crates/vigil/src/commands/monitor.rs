//! Monitor command - run a configured polling monitor.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use tokio_util::sync::CancellationToken;
use vigil_config::{FreshnessMonitorConfig, ScheduleMonitorConfig};
use vigil_engine::classifier::MissingTimestamp;
use vigil_engine::clock::SystemClock;
use vigil_engine::filter::MetadataQuery;
use vigil_engine::monitor::{
    FreshnessMonitor, FreshnessSettings, LogGenerator, Monitor, MonitorRunner, ScheduleMonitor,
    ScheduleSettings, TickOutcome,
};

use super::{Context, print_json};

/// Arguments for the monitor command.
#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(subcommand)]
    pub command: MonitorCommand,

    /// Evaluate once and exit instead of polling until Ctrl-C
    #[arg(long, global = true)]
    pub once: bool,

    /// Also append emitted events as JSON lines to this file
    #[arg(long, global = true)]
    pub events: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum MonitorCommand {
    /// Watch schedule triggers ([[monitors.schedule]])
    Schedules {
        /// Monitor name from the config file
        name: String,
    },

    /// Watch asset freshness ([[monitors.freshness]])
    Freshness {
        /// Monitor name from the config file
        name: String,
    },
}

/// Run the monitor command.
pub async fn run(args: MonitorArgs, ctx: &Context) -> Result<()> {
    let client = Arc::new(ctx.client()?);
    let mut generator = LogGenerator::new();
    if let Some(path) = &args.events {
        generator = generator.with_output(path);
    }
    let generator = Arc::new(generator);
    let clock = Arc::new(SystemClock);

    match &args.command {
        MonitorCommand::Schedules { name } => {
            let settings = schedule_settings(ctx.config.schedule_monitor(name)?);
            let monitor = ScheduleMonitor::new(settings, client);
            drive(MonitorRunner::new(monitor, generator, clock)?, &args, ctx).await
        }
        MonitorCommand::Freshness { name } => {
            let settings = freshness_settings(ctx.config.freshness_monitor(name)?);
            let monitor = FreshnessMonitor::new(settings, client);
            drive(MonitorRunner::new(monitor, generator, clock)?, &args, ctx).await
        }
    }
}

fn schedule_settings(config: &ScheduleMonitorConfig) -> ScheduleSettings {
    ScheduleSettings {
        namespace: config.namespace.clone(),
        flow_id: config.flow_id.clone(),
        allowed_delay: config.allowed_delay(),
        max_execution_interval: config.max_execution_interval(),
        max_execution_duration: config.max_execution_duration(),
        include_disabled: config.include_disabled,
        ..ScheduleSettings::new(&config.name, config.interval())
    }
}

fn freshness_settings(config: &FreshnessMonitorConfig) -> FreshnessSettings {
    FreshnessSettings {
        namespace: config.namespace.clone(),
        asset_id: config.asset_id.clone(),
        types: config.types.clone(),
        metadata: config
            .metadata
            .iter()
            .map(|(k, v)| MetadataQuery::equal_to(k, v))
            .collect(),
        missing_timestamp: if config.missing_timestamp_is_stale {
            MissingTimestamp::Stale
        } else {
            MissingTimestamp::Skip
        },
        ..FreshnessSettings::new(&config.name, config.interval(), config.max_staleness())
    }
}

async fn drive<M: Monitor>(
    mut runner: MonitorRunner<M>,
    args: &MonitorArgs,
    ctx: &Context,
) -> Result<()> {
    if args.once {
        let outcome = runner.tick().await?;
        if ctx.json_output {
            return print_json(&outcome_json(&outcome));
        }
        let dim = Style::new().dim();
        match outcome {
            TickOutcome::NoEvent => println!("  {} healthy", dim.apply_to("Result:")),
            TickOutcome::Emitted(handle) => println!(
                "  {} {} record(s) reported as {}",
                dim.apply_to("Result:"),
                handle.records,
                handle.id
            ),
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
        }
        stopper.cancel();
    });

    runner.run(cancel).await;
    Ok(())
}

fn outcome_json(outcome: &TickOutcome) -> serde_json::Value {
    match outcome {
        TickOutcome::NoEvent => serde_json::json!({ "emitted": false }),
        TickOutcome::Emitted(handle) => serde_json::json!({ "emitted": true, "execution": handle }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_settings_from_config() {
        let config: vigil_config::VigilConfig = vigil_config::VigilConfig::from_toml(
            r#"
[[monitors.freshness]]
name = "tables"
interval_secs = 300
max_staleness_secs = 3600
types = ["TABLE"]
missing_timestamp_is_stale = false

[monitors.freshness.metadata]
owner = "data"
"#,
        )
        .unwrap();

        let settings = freshness_settings(config.freshness_monitor("tables").unwrap());

        assert_eq!(settings.name, "tables");
        assert_eq!(settings.max_staleness.as_secs(), 3600);
        assert_eq!(settings.missing_timestamp, MissingTimestamp::Skip);
        assert_eq!(settings.metadata, vec![MetadataQuery::equal_to("owner", "data")]);
    }
}
