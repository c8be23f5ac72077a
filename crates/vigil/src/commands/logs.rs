//! Logs command - fetch execution logs.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use console::Style;
use vigil_engine::FetchMode;
use vigil_engine::filter::FilterCriteria;
use vigil_engine::tasks::logs::{self, LogQuery};
use vigil_types::{LARGE_PAGE_SIZE, LogLevel};

use super::{Context, check_page, parse_fetch_mode, parse_level, print_json};

/// Arguments for the logs command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Namespace (exact match)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Flow ID
    #[arg(long)]
    pub flow_id: Option<String>,

    /// Trigger ID
    #[arg(long)]
    pub trigger_id: Option<String>,

    /// Minimum level: trace, debug, info, warn or error
    #[arg(long, value_parser = parse_level)]
    pub level: Option<LogLevel>,

    /// Free-text search
    #[arg(short, long)]
    pub query: Option<String>,

    /// Logs emitted at or after this instant (RFC 3339)
    #[arg(long)]
    pub start_date: Option<DateTime<Utc>>,

    /// Logs emitted at or before this instant (RFC 3339)
    #[arg(long)]
    pub end_date: Option<DateTime<Utc>>,

    /// Only the last N seconds; excludes --start-date and --end-date
    #[arg(long, value_name = "SECONDS")]
    pub time_range: Option<u64>,

    /// Fetch only this page (default: all pages)
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size
    #[arg(long, default_value_t = LARGE_PAGE_SIZE)]
    pub size: u32,

    /// fetch, fetch-one, store or none
    #[arg(long, default_value = "store", value_parser = parse_fetch_mode)]
    pub fetch: FetchMode,
}

/// Run the logs command.
pub async fn run(args: LogsArgs, ctx: &Context) -> Result<()> {
    check_page(args.page)?;
    let client = ctx.client()?;

    let request = LogQuery {
        criteria: FilterCriteria {
            namespace: args.namespace,
            flow_id: args.flow_id,
            trigger_id: args.trigger_id,
            min_level: args.level,
            query: args.query,
            start_date: args.start_date,
            end_date: args.end_date,
            time_range: args.time_range.map(Duration::from_secs),
            ..FilterCriteria::default()
        },
        page: args.page,
        size: args.size,
        fetch_mode: args.fetch,
    };
    let mut sink = ctx.sink("logs");
    let projection = logs::fetch(&client, &request, ctx.now(), &mut sink).await?;

    if ctx.json_output {
        return print_json(&projection);
    }

    let dim = Style::new().dim();
    for entry in projection.rows.iter().chain(projection.row.iter()) {
        let timestamp = entry
            .timestamp
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let level = entry.level.map(|l| l.as_str()).unwrap_or("-");
        println!("{} {:<5} {}", dim.apply_to(timestamp), level, entry.message);
    }
    if let Some(uri) = &projection.uri {
        println!("  {} {}", dim.apply_to("Stored:"), uri);
    }
    println!("  {} {}", dim.apply_to("Total:"), projection.size);
    Ok(())
}
