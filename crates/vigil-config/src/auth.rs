//! Credential configuration and resolution.
//!
//! Secrets never live in the config file itself; the file only says where to
//! find them:
//!
//! ```toml
//! [auth]
//! type = "bearer"
//! token_env = "VIGIL_TOKEN"
//!
//! # or
//! [auth]
//! type = "basic"
//! username = "admin@example.com"
//! password_env = "VIGIL_PASSWORD"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Where to find credentials for the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    #[default]
    None,

    /// Bearer API token.
    Bearer {
        /// Path to a file containing the token.
        #[serde(default)]
        token_file: Option<PathBuf>,
        /// Environment variable containing the token.
        #[serde(default)]
        token_env: Option<String>,
    },

    /// HTTP basic authentication.
    Basic {
        username: String,
        /// Environment variable containing the password.
        #[serde(default)]
        password_env: Option<String>,
        /// Path to a file containing the password.
        #[serde(default)]
        password_file: Option<PathBuf>,
    },
}

/// Credentials after reading files and environment variables.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedAuth {
    None,
    Token(String),
    Basic { username: String, password: String },
}

impl std::fmt::Debug for ResolvedAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedAuth::None => f.write_str("None"),
            ResolvedAuth::Token(_) => f.write_str("Token(***)"),
            ResolvedAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

impl AuthConfig {
    /// Bearer auth reading the token from an environment variable.
    pub fn token_env(var: impl Into<String>) -> Self {
        Self::Bearer {
            token_file: None,
            token_env: Some(var.into()),
        }
    }

    /// Basic auth reading the password from an environment variable.
    pub fn basic_env(username: impl Into<String>, var: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password_env: Some(var.into()),
            password_file: None,
        }
    }

    /// Resolve the actual credential values.
    ///
    /// Files are tried before environment variables. A configured scheme that
    /// yields no secret is an error rather than a silent fall back to
    /// anonymous access.
    pub fn resolve(&self) -> Result<ResolvedAuth> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve using a custom environment lookup.
    pub fn resolve_with<F>(&self, env: F) -> Result<ResolvedAuth>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            AuthConfig::None => Ok(ResolvedAuth::None),

            AuthConfig::Bearer {
                token_file,
                token_env,
            } => {
                let token = read_secret(token_file.as_deref(), token_env.as_deref(), &env)?
                    .ok_or_else(|| {
                        ConfigError::CredentialNotFound(describe(
                            "API token",
                            token_file.as_deref(),
                            token_env.as_deref(),
                        ))
                    })?;
                Ok(ResolvedAuth::Token(token))
            }

            AuthConfig::Basic {
                username,
                password_env,
                password_file,
            } => {
                if username.trim().is_empty() {
                    return Err(ConfigError::Invalid {
                        field: "auth.username".to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
                let password =
                    read_secret(password_file.as_deref(), password_env.as_deref(), &env)?
                        .ok_or_else(|| {
                            ConfigError::CredentialNotFound(describe(
                                "password",
                                password_file.as_deref(),
                                password_env.as_deref(),
                            ))
                        })?;
                Ok(ResolvedAuth::Basic {
                    username: username.clone(),
                    password,
                })
            }
        }
    }
}

fn read_secret<F>(file: Option<&Path>, var: Option<&str>, env: &F) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = file {
        let expanded = expand_path(path);
        if expanded.exists() {
            let secret = std::fs::read_to_string(&expanded)
                .map_err(|e| ConfigError::ReadFile {
                    path: expanded.display().to_string(),
                    source: e,
                })?
                .trim()
                .to_string();
            if !secret.is_empty() {
                return Ok(Some(secret));
            }
        }
    }
    if let Some(var) = var
        && let Some(secret) = env(var)
        && !secret.is_empty()
    {
        return Ok(Some(secret));
    }
    Ok(None)
}

fn describe(what: &str, file: Option<&Path>, var: Option<&str>) -> String {
    match (file, var) {
        (Some(file), Some(var)) => format!("{what} not in {} or ${var}", file.display()),
        (Some(file), None) => format!("{what} not in {}", file.display()),
        (None, Some(var)) => format!("{what} not in ${var}"),
        (None, None) => format!("no source configured for {what}"),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
