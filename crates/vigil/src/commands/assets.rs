//! Assets command - list, delete, set and purge assets.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use console::Style;
use vigil_engine::FetchMode;
use vigil_engine::filter::FilterCriteria;
use vigil_engine::tasks::assets::{self, AssetQuery, PurgeRequest};
use vigil_types::{Asset, LARGE_PAGE_SIZE};

use super::{
    Context, check_page, metadata_queries, parse_fetch_mode, parse_key_value, print_json,
};

/// Arguments for the assets command.
#[derive(Args, Debug)]
pub struct AssetsArgs {
    #[command(subcommand)]
    pub command: AssetsCommand,
}

/// Asset selection shared by `list` and `purge`.
#[derive(Args, Debug)]
pub struct AssetFilters {
    /// Namespace (exact for list, prefix for purge)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Asset ID
    #[arg(long)]
    pub asset_id: Option<String>,

    /// Asset type, repeatable
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Metadata that must equal key=value, repeatable
    #[arg(long = "metadata", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,

    /// Metadata that must differ from key=value, repeatable
    #[arg(long = "metadata-not", value_parser = parse_key_value)]
    pub metadata_not: Vec<(String, String)>,
}

#[derive(Subcommand, Debug)]
pub enum AssetsCommand {
    /// List assets
    List {
        #[command(flatten)]
        filters: AssetFilters,

        /// Fetch only this page (default: all pages)
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(long, default_value_t = LARGE_PAGE_SIZE)]
        size: u32,

        /// fetch, fetch-one, store or none
        #[arg(long, default_value = "store", value_parser = parse_fetch_mode)]
        fetch: FetchMode,
    },

    /// Delete an asset
    Delete {
        /// Asset ID
        id: String,
    },

    /// Create or update an asset
    Set {
        /// Asset ID
        id: String,

        /// Asset type
        #[arg(long = "type")]
        asset_type: String,

        #[arg(long)]
        namespace: Option<String>,

        #[arg(long)]
        display_name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Metadata entry as key=value, repeatable
        #[arg(long = "metadata", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
    },

    /// Delete assets, usage events and lineage events up to a date
    Purge {
        #[command(flatten)]
        filters: AssetFilters,

        /// Purge records last touched at or before this instant (RFC 3339)
        #[arg(long)]
        end_date: DateTime<Utc>,

        /// Keep the assets themselves
        #[arg(long)]
        skip_assets: bool,

        /// Keep usage events
        #[arg(long)]
        skip_usages: bool,

        /// Keep lineage events
        #[arg(long)]
        skip_lineage: bool,
    },
}

/// Run the assets command.
pub async fn run(args: AssetsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let dim = Style::new().dim();

    match args.command {
        AssetsCommand::List {
            filters,
            page,
            size,
            fetch,
        } => {
            check_page(page)?;
            let request = AssetQuery {
                criteria: FilterCriteria {
                    namespace: filters.namespace,
                    id: filters.asset_id,
                    types: filters.types,
                    metadata: metadata_queries(&filters.metadata, &filters.metadata_not),
                    ..FilterCriteria::default()
                },
                page,
                size,
                fetch_mode: fetch,
            };
            let mut sink = ctx.sink("assets");
            let projection = assets::list(&client, &request, ctx.now(), &mut sink).await?;

            if ctx.json_output {
                return print_json(&projection);
            }
            for asset in projection.rows.iter().chain(projection.row.iter()) {
                println!(
                    "  {:<32} {:<12} {}",
                    asset.id,
                    asset.asset_type,
                    asset.namespace.as_deref().unwrap_or("-")
                );
            }
            if let Some(uri) = &projection.uri {
                println!("  {} {}", dim.apply_to("Stored:"), uri);
            }
            println!("  {} {}", dim.apply_to("Total:"), projection.size);
        }
        AssetsCommand::Delete { id } => {
            assets::delete(&client, &id).await?;
            if ctx.json_output {
                return print_json(&serde_json::json!({ "assetId": id, "deleted": true }));
            }
            println!("{} asset {}", Style::new().green().apply_to("deleted"), id);
        }
        AssetsCommand::Set {
            id,
            asset_type,
            namespace,
            display_name,
            description,
            metadata,
        } => {
            let mut asset = Asset::new(id, asset_type);
            asset.namespace = namespace;
            asset.display_name = display_name;
            asset.description = description;
            asset.metadata = metadata
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();

            let stored = assets::set(&client, &asset).await?;
            if ctx.json_output {
                return print_json(&stored);
            }
            println!("{} asset {}", Style::new().green().apply_to("stored"), stored.id);
        }
        AssetsCommand::Purge {
            filters,
            end_date,
            skip_assets,
            skip_usages,
            skip_lineage,
        } => {
            let request = PurgeRequest {
                namespace: filters.namespace,
                asset_id: filters.asset_id,
                types: filters.types,
                metadata: metadata_queries(&filters.metadata, &filters.metadata_not),
                purge_assets: !skip_assets,
                purge_usages: !skip_usages,
                purge_lineage: !skip_lineage,
                ..PurgeRequest::new(end_date)
            };
            let outcome = assets::purge(&client, &request, ctx.now()).await?;

            if ctx.json_output {
                return print_json(&outcome);
            }
            println!("  {} {}", dim.apply_to("Assets:"), outcome.assets);
            println!("  {} {}", dim.apply_to("Usages:"), outcome.usages);
            println!("  {} {}", dim.apply_to("Lineage events:"), outcome.lineage_events);
        }
    }

    Ok(())
}
