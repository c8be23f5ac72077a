//! CLI command handlers.

pub mod assets;
pub mod config;
pub mod executions;
pub mod logs;
pub mod monitor;
pub mod namespaces;
pub mod test_suites;
pub mod triggers;

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use vigil_client::VigilClient;
use vigil_config::{ResolvedAuth, VigilConfig};
use vigil_engine::clock::{Clock, SystemClock};
use vigil_engine::filter::MetadataQuery;
use vigil_engine::{FetchMode, JsonLinesSink};
use vigil_types::{Label, LogLevel, StateType};

/// Global flags as parsed.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub server: Option<String>,
    pub tenant: Option<String>,
    pub token: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub json_output: bool,
    pub verbose: bool,
}

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration files.
    pub config: VigilConfig,
    /// Server URL to connect to.
    pub server_url: String,
    pub tenant: String,
    /// Token from the command line; wins over configured credentials.
    token: Option<String>,
    /// User config directory override.
    pub config_dir: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load config files and apply command-line overrides.
    pub fn load(options: GlobalOptions) -> Result<Self> {
        let loaded = vigil_config::load_config_with_options(None, options.config_dir.as_deref())
            .context("failed to load configuration")?;
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        tracing::debug!(sources = ?loaded.loaded_from(), "configuration loaded");

        let config = loaded.config;
        let server_url = options
            .server
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| config.server_url());
        let tenant = options.tenant.unwrap_or_else(|| config.tenant());

        Ok(Self {
            config,
            server_url,
            tenant,
            token: options.token.filter(|t| !t.is_empty()),
            config_dir: options.config_dir,
            json_output: options.json_output,
            verbose: options.verbose,
        })
    }

    /// Build an API client from the resolved settings.
    pub fn client(&self) -> Result<VigilClient> {
        let mut builder = VigilClient::builder()
            .base_url(&self.server_url)
            .tenant(&self.tenant);
        if let Some(timeout) = self.config.timeout() {
            builder = builder.timeout(timeout);
        }

        builder = match &self.token {
            Some(token) => builder.auth_token(token),
            None => match self.config.auth().resolve()? {
                ResolvedAuth::None => builder,
                ResolvedAuth::Token(token) => builder.auth_token(token),
                ResolvedAuth::Basic { username, password } => builder.basic_auth(username, password),
            },
        };

        Ok(builder.build()?)
    }

    /// Sink writing stored results under the configured output directory.
    pub fn sink(&self, prefix: &str) -> JsonLinesSink {
        let dir = self
            .config
            .output
            .as_ref()
            .map(|o| o.store_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        JsonLinesSink::new(dir, prefix)
    }

    pub fn now(&self) -> DateTime<Utc> {
        SystemClock.now()
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument parsers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_fetch_mode(value: &str) -> std::result::Result<FetchMode, String> {
    match value.to_ascii_lowercase().replace('_', "-").as_str() {
        "fetch" => Ok(FetchMode::Fetch),
        "fetch-one" => Ok(FetchMode::FetchOne),
        "store" => Ok(FetchMode::Store),
        "none" => Ok(FetchMode::None),
        other => Err(format!(
            "unknown fetch mode '{other}' (expected fetch, fetch-one, store or none)"
        )),
    }
}

/// Only states the server can filter on; `Unknown` is a read-side fallback.
pub fn parse_state(value: &str) -> std::result::Result<StateType, String> {
    match serde_json::from_value(serde_json::Value::String(value.to_ascii_uppercase())) {
        Ok(StateType::Unknown) | Err(_) => Err(format!("unknown execution state '{value}'")),
        Ok(state) => Ok(state),
    }
}

pub fn parse_level(value: &str) -> std::result::Result<LogLevel, String> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_uppercase()))
        .map_err(|_| format!("unknown log level '{value}'"))
}

/// `key=value`.
pub fn parse_key_value(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.to_string()))
        }
        _ => Err(format!("expected key=value, got '{value}'")),
    }
}

/// `key:value`.
pub fn parse_label(value: &str) -> std::result::Result<Label, String> {
    match value.split_once(':') {
        Some((key, val)) if !key.trim().is_empty() => Ok(Label {
            key: key.trim().to_string(),
            value: val.to_string(),
        }),
        _ => Err(format!("expected key:value, got '{value}'")),
    }
}

/// Metadata conditions from `--metadata` and `--metadata-not` pairs.
pub fn metadata_queries(
    equal: &[(String, String)],
    not_equal: &[(String, String)],
) -> Vec<MetadataQuery> {
    equal
        .iter()
        .map(|(k, v)| MetadataQuery::equal_to(k, v))
        .chain(not_equal.iter().map(|(k, v)| MetadataQuery::not_equal_to(k, v)))
        .collect()
}

/// Reject a page of zero early, with a CLI-friendly message.
pub fn check_page(page: Option<u32>) -> Result<()> {
    if page == Some(0) {
        bail!("--page starts at 1");
    }
    Ok(())
}
