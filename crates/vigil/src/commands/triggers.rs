//! Triggers command - toggle triggers and detect unhealthy schedules.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use console::{Style, style};
use vigil_engine::tasks::triggers::{self, DetectReport, ToggleRequest};

use super::{Context, print_json};

/// Arguments for the triggers command.
#[derive(Args, Debug)]
pub struct TriggersArgs {
    #[command(subcommand)]
    pub command: TriggersCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToggleAction {
    Enable,
    Disable,
}

#[derive(Subcommand, Debug)]
pub enum TriggersCommand {
    /// Enable or disable the matching triggers
    Toggle {
        action: ToggleAction,

        /// Namespace (exact match)
        #[arg(long)]
        namespace: Option<String>,

        /// Flow ID
        #[arg(long)]
        flow_id: Option<String>,

        /// Trigger ID; requires --namespace and --flow-id
        #[arg(long, requires_all = ["namespace", "flow_id"])]
        trigger_id: Option<String>,
    },

    /// Report disabled and stuck schedules
    Detect {
        /// Namespace; children are included
        #[arg(long)]
        namespace: Option<String>,

        /// Minutes a schedule may be late before it counts as stuck
        #[arg(long, default_value_t = 5)]
        threshold_minutes: u64,
    },
}

/// Run the triggers command.
pub async fn run(args: TriggersArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    match args.command {
        TriggersCommand::Toggle {
            action,
            namespace,
            flow_id,
            trigger_id,
        } => {
            let targeted = trigger_id.is_some();
            let request = ToggleRequest {
                namespace,
                flow_id,
                trigger_id,
                enabled: action == ToggleAction::Enable,
            };
            let count = if targeted {
                triggers::toggle_one(&client, &request, ctx.now()).await?
            } else {
                triggers::toggle(&client, &request, ctx.now()).await?
            };

            if ctx.json_output {
                return print_json(&serde_json::json!({ "count": count }));
            }
            let verb = match action {
                ToggleAction::Enable => "enabled",
                ToggleAction::Disable => "disabled",
            };
            println!("{} {} trigger(s)", Style::new().green().apply_to(verb), count);
        }
        TriggersCommand::Detect {
            namespace,
            threshold_minutes,
        } => {
            let report = triggers::detect(
                Arc::new(client),
                namespace.as_deref(),
                Duration::from_secs(threshold_minutes * 60),
                ctx.now(),
            )
            .await?;

            if ctx.json_output {
                return print_json(&report);
            }
            print_report(&report);
        }
    }

    Ok(())
}

fn print_report(report: &DetectReport) {
    let dim = Style::new().dim();
    let yellow = Style::new().yellow();
    let red = Style::new().red();

    println!();
    println!("{}", style("Schedule Health").bold());
    println!("{}", dim.apply_to("─".repeat(40)));

    if !report.disabled.is_empty() {
        println!();
        println!("  {}", dim.apply_to("Disabled:"));
        for trigger in &report.disabled {
            println!("  {} {}", yellow.apply_to("●"), trigger.qualified_id());
        }
    }

    if !report.stuck.is_empty() {
        println!();
        println!("  {}", dim.apply_to("Stuck:"));
        for detected in &report.stuck {
            println!(
                "  {} {} {}",
                red.apply_to("●"),
                detected.trigger.qualified_id(),
                dim.apply_to(format!("({})", detected.verdict.label()))
            );
        }
    }

    println!();
    println!("  {}", report.summary);
    println!();
}
