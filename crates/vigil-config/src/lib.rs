//! Configuration system for Vigil.
//!
//! Provides TOML-based configuration with:
//! - Server connection settings (`[server]`)
//! - Credentials referenced by environment variable or file (`[auth]`)
//! - Output settings for stored results (`[output]`)
//! - Named polling monitors (`[[monitors.schedule]]`, `[[monitors.freshness]]`)
//! - Config file layering (user config dir + project-local overrides)

pub mod auth;
pub mod discovery;
pub mod error;
pub mod types;

pub use auth::{AuthConfig, ResolvedAuth};
pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
