//! Namespaces command - list namespaces.

use anyhow::Result;
use clap::Args;
use console::Style;
use vigil_engine::tasks::namespaces::{self, NamespaceListing};
use vigil_types::SMALL_PAGE_SIZE;

use super::{Context, check_page, print_json};

/// Arguments for the namespaces command.
#[derive(Args, Debug)]
pub struct NamespacesArgs {
    /// Only namespaces starting with this prefix
    pub prefix: Option<String>,

    /// Skip namespaces that only exist through flow declarations
    #[arg(long)]
    pub existing: bool,

    /// Fetch only this page (default: all pages)
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size
    #[arg(long, default_value_t = SMALL_PAGE_SIZE)]
    pub size: u32,
}

/// Run the namespaces command.
pub async fn run(args: NamespacesArgs, ctx: &Context) -> Result<()> {
    check_page(args.page)?;
    let client = ctx.client()?;

    let request = NamespaceListing {
        prefix: args.prefix,
        existing_only: args.existing,
        page: args.page,
        size: args.size,
    };
    let walk = namespaces::list(&client, &request).await?;

    if ctx.json_output {
        return print_json(&serde_json::json!({
            "namespaces": walk.records,
            "total": walk.total,
            "warnings": walk.warnings,
        }));
    }

    let dim = Style::new().dim();
    for namespace in &walk.records {
        if namespace.disabled {
            println!("  {} {}", namespace.id, dim.apply_to("(disabled)"));
        } else {
            println!("  {}", namespace.id);
        }
    }
    println!("  {} {}", dim.apply_to("Total:"), walk.total);
    Ok(())
}
