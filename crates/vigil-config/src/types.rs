//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]                 # remote API location
//! [auth]                   # credential sources
//! [output]                 # where stored results go
//! [[monitors.schedule]]    # schedule health monitors
//! [[monitors.freshness]]   # asset freshness monitors
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AuthConfig, ConfigError};

/// Server used when no URL is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Tenant used when none is configured.
pub const DEFAULT_TENANT: &str = "main";

/// Allowed schedule delay when a monitor does not set one.
pub const DEFAULT_ALLOWED_DELAY_SECS: u64 = 60;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub server: Option<ServerConfig>,
    pub auth: Option<AuthConfig>,
    pub output: Option<OutputConfig>,
    pub monitors: MonitorsConfig,
}

impl VigilConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Whole sections are replaced. Monitors are merged by name: a later
    /// monitor with the same name replaces the earlier one.
    pub fn merge(&mut self, other: VigilConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.auth.is_some() {
            self.auth = other.auth;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        merge_named(&mut self.monitors.schedule, other.monitors.schedule);
        merge_named(&mut self.monitors.freshness, other.monitors.freshness);
    }

    /// Effective server URL with trailing slashes removed.
    pub fn server_url(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Effective tenant.
    pub fn tenant(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.tenant.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TENANT)
            .to_string()
    }

    /// Effective request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.server
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .map(Duration::from_secs)
    }

    /// Effective auth configuration.
    pub fn auth(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_default()
    }

    /// Find a schedule monitor by name.
    pub fn schedule_monitor(&self, name: &str) -> crate::Result<&ScheduleMonitorConfig> {
        self.monitors
            .schedule
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ConfigError::MonitorNotFound(name.to_string()))
    }

    /// Find a freshness monitor by name.
    pub fn freshness_monitor(&self, name: &str) -> crate::Result<&FreshnessMonitorConfig> {
        self.monitors
            .freshness
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ConfigError::MonitorNotFound(name.to_string()))
    }

    /// Check values that TOML alone cannot constrain.
    pub fn validate(&self) -> crate::Result<()> {
        for monitor in &self.monitors.schedule {
            check_interval(&monitor.name, monitor.interval_secs)?;
        }
        for monitor in &self.monitors.freshness {
            check_interval(&monitor.name, monitor.interval_secs)?;
            if monitor.max_staleness_secs == 0 {
                return Err(ConfigError::Invalid {
                    field: format!("monitors.freshness.{}.max_staleness_secs", monitor.name),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_interval(name: &str, interval_secs: u64) -> crate::Result<()> {
    if interval_secs == 0 {
        return Err(ConfigError::Invalid {
            field: format!("monitors.{name}.interval_secs"),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

trait Named {
    fn name(&self) -> &str;
}

fn merge_named<T: Named>(base: &mut Vec<T>, other: Vec<T>) {
    for item in other {
        match base.iter_mut().find(|b| b.name() == item.name()) {
            Some(existing) => *existing = item,
            None => base.push(item),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Remote API location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, e.g. `https://orchestrator.example.com`.
    pub url: Option<String>,
    /// Tenant path segment.
    pub tenant: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Where stored results are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub store_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("."),
        }
    }
}

/// Named polling monitors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorsConfig {
    pub schedule: Vec<ScheduleMonitorConfig>,
    pub freshness: Vec<FreshnessMonitorConfig>,
}

/// A schedule health monitor.
///
/// `interval_secs` has no default: every monitor states how often it polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMonitorConfig {
    pub name: String,
    pub interval_secs: u64,
    /// Namespace prefix; children are included.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub flow_id: Option<String>,
    #[serde(default = "default_allowed_delay")]
    pub allowed_delay_secs: u64,
    #[serde(default)]
    pub max_execution_interval_secs: Option<u64>,
    #[serde(default)]
    pub max_execution_duration_secs: Option<u64>,
    #[serde(default)]
    pub include_disabled: bool,
}

fn default_allowed_delay() -> u64 {
    DEFAULT_ALLOWED_DELAY_SECS
}

impl Named for ScheduleMonitorConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ScheduleMonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn allowed_delay(&self) -> Duration {
        Duration::from_secs(self.allowed_delay_secs)
    }

    pub fn max_execution_interval(&self) -> Option<Duration> {
        self.max_execution_interval_secs.map(Duration::from_secs)
    }

    pub fn max_execution_duration(&self) -> Option<Duration> {
        self.max_execution_duration_secs.map(Duration::from_secs)
    }
}

/// An asset freshness monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessMonitorConfig {
    pub name: String,
    pub interval_secs: u64,
    pub max_staleness_secs: u64,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    /// Metadata entries that must match exactly.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Report assets without an `updated` timestamp as stale.
    #[serde(default = "default_true")]
    pub missing_timestamp_is_stale: bool,
}

fn default_true() -> bool {
    true
}

impl Named for FreshnessMonitorConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FreshnessMonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_staleness(&self) -> Duration {
        Duration::from_secs(self.max_staleness_secs)
    }
}
