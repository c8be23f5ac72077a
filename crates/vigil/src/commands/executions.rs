//! Executions command - query, count, kill, resume and delete executions.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use console::Style;
use vigil_client::DeleteExecutionOptions;
use vigil_engine::filter::FilterCriteria;
use vigil_engine::tasks::executions::{
    self, CountExpectation, CountRequest, DeleteRequest, ExecutionQuery,
};
use vigil_engine::{FetchMode, Projection};
use vigil_types::{Execution, Label, SMALL_PAGE_SIZE, StateType};

use super::{
    Context, check_page, parse_fetch_mode, parse_key_value, parse_label, parse_state, print_json,
};

/// Arguments for the executions command.
#[derive(Args, Debug)]
pub struct ExecutionsArgs {
    #[command(subcommand)]
    pub command: ExecutionsCommand,
}

/// Filters shared by `query` and `count`.
#[derive(Args, Debug)]
pub struct ExecutionFilters {
    /// Namespace (exact match)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Flow ID
    #[arg(long)]
    pub flow_id: Option<String>,

    /// Execution state, repeatable
    #[arg(long = "state", value_parser = parse_state)]
    pub states: Vec<StateType>,

    /// Label as key:value, repeatable
    #[arg(long = "label", value_parser = parse_label)]
    pub labels: Vec<Label>,

    /// Executions started at or after this instant (RFC 3339)
    #[arg(long)]
    pub start_date: Option<DateTime<Utc>>,

    /// Executions ended at or before this instant (RFC 3339)
    #[arg(long)]
    pub end_date: Option<DateTime<Utc>>,

    /// Only the last N seconds; excludes --start-date and --end-date
    #[arg(long, value_name = "SECONDS")]
    pub time_range: Option<u64>,
}

impl ExecutionFilters {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            namespace: self.namespace.clone(),
            flow_id: self.flow_id.clone(),
            states: self.states.clone(),
            labels: self.labels.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            time_range: self.time_range.map(Duration::from_secs),
            ..FilterCriteria::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ExecutionsCommand {
    /// Search executions
    Query {
        #[command(flatten)]
        filters: ExecutionFilters,

        /// Fetch only this page (default: all pages)
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(long, default_value_t = SMALL_PAGE_SIZE)]
        size: u32,

        /// fetch, fetch-one, store or none
        #[arg(long, default_value = "store", value_parser = parse_fetch_mode)]
        fetch: FetchMode,
    },

    /// Count executions
    Count {
        #[command(flatten)]
        filters: ExecutionFilters,

        /// Additional namespace (exact match), repeatable
        #[arg(long = "in-namespace")]
        namespaces: Vec<String>,

        /// Report 0 unless the count equals N
        #[arg(long, value_name = "N", conflicts_with_all = ["gte", "lte"])]
        eq: Option<u64>,

        /// Report 0 unless the count is at least N
        #[arg(long, value_name = "N", conflicts_with = "lte")]
        gte: Option<u64>,

        /// Report 0 unless the count is at most N
        #[arg(long, value_name = "N")]
        lte: Option<u64>,
    },

    /// Kill an execution
    Kill {
        /// Execution ID
        id: String,

        /// Do not kill sub-executions
        #[arg(long)]
        no_propagate: bool,
    },

    /// Resume a paused execution
    Resume {
        /// Execution ID
        id: String,

        /// Input as key=value, repeatable; values are parsed as JSON when possible
        #[arg(long = "input", value_parser = parse_key_value)]
        inputs: Vec<(String, String)>,
    },

    /// Delete a terminated execution
    Delete {
        /// Execution ID
        id: String,

        /// Execution this command runs in, which may not be deleted
        #[arg(long, env = "VIGIL_EXECUTION_ID")]
        current_execution: Option<String>,

        /// Keep the execution's logs
        #[arg(long)]
        keep_logs: bool,

        /// Keep the execution's metrics
        #[arg(long)]
        keep_metrics: bool,

        /// Keep the execution's internal storage files
        #[arg(long)]
        keep_storage: bool,
    },
}

/// Run the executions command.
pub async fn run(args: ExecutionsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    match args.command {
        ExecutionsCommand::Query {
            filters,
            page,
            size,
            fetch,
        } => {
            check_page(page)?;
            let request = ExecutionQuery {
                criteria: filters.criteria(),
                page,
                size,
                fetch_mode: fetch,
            };
            let mut sink = ctx.sink("executions");
            let projection = executions::query(&client, &request, ctx.now(), &mut sink).await?;
            print_executions(ctx, &projection)
        }
        ExecutionsCommand::Count {
            filters,
            namespaces,
            eq,
            gte,
            lte,
        } => {
            let mut criteria = filters.criteria();
            criteria.namespaces = namespaces;
            let expect = eq
                .map(CountExpectation::Eq)
                .or(gte.map(CountExpectation::Gte))
                .or(lte.map(CountExpectation::Lte));
            let count = executions::count(&client, &CountRequest { criteria, expect }, ctx.now())
                .await?;
            if ctx.json_output {
                print_json(&serde_json::json!({ "count": count }))
            } else {
                println!("{count}");
                Ok(())
            }
        }
        ExecutionsCommand::Kill { id, no_propagate } => {
            executions::kill(&client, &id, !no_propagate).await?;
            report(ctx, "killed", &id)
        }
        ExecutionsCommand::Resume { id, inputs } => {
            let inputs: BTreeMap<String, serde_json::Value> = inputs
                .into_iter()
                .map(|(key, raw)| {
                    let value = serde_json::from_str(&raw)
                        .unwrap_or(serde_json::Value::String(raw));
                    (key, value)
                })
                .collect();
            executions::resume(&client, &id, &inputs).await?;
            report(ctx, "resumed", &id)
        }
        ExecutionsCommand::Delete {
            id,
            current_execution,
            keep_logs,
            keep_metrics,
            keep_storage,
        } => {
            let request = DeleteRequest {
                execution_id: id.clone(),
                current_execution_id: current_execution,
                options: DeleteExecutionOptions {
                    delete_logs: !keep_logs,
                    delete_metrics: !keep_metrics,
                    delete_storage: !keep_storage,
                },
            };
            executions::delete(&client, &request).await?;
            report(ctx, "deleted", &id)
        }
    }
}

fn report(ctx: &Context, action: &str, id: &str) -> Result<()> {
    if ctx.json_output {
        print_json(&serde_json::json!({ "executionId": id, "action": action }))
    } else {
        let green = Style::new().green();
        println!("{} execution {}", green.apply_to(action), id);
        Ok(())
    }
}

fn print_executions(ctx: &Context, projection: &Projection<Execution>) -> Result<()> {
    if ctx.json_output {
        return print_json(projection);
    }

    let dim = Style::new().dim();
    let rows = projection.rows.iter().chain(projection.row.iter());
    for execution in rows {
        println!(
            "  {:<24} {:<10} {}.{}",
            execution.id,
            execution.state.current.as_str(),
            execution.namespace,
            execution.flow_id
        );
    }
    if let Some(uri) = &projection.uri {
        println!("  {} {}", dim.apply_to("Stored:"), uri);
    }
    println!("  {} {}", dim.apply_to("Total:"), projection.size);
    Ok(())
}
