//! HTTP client SDK for the orchestration API watched by Vigil.
//!
//! This crate provides a typed client for the remote search and management
//! endpoints. It owns transport concerns only: authentication, URL layout,
//! timeouts and error mapping. Paging policy and filter construction live in
//! `vigil-engine`.
//!
//! # Example
//!
//! ```no_run
//! use vigil_client::{Result, VigilClient};
//! use vigil_types::{FieldId, FilterExpression};
//!
//! # async fn example() -> Result<()> {
//! let client = VigilClient::builder()
//!     .base_url("http://localhost:8080")
//!     .basic_auth("admin@example.com", "secret")
//!     .build()?;
//!
//! let filters = vec![FilterExpression::equals(FieldId::Namespace, "company.team").unwrap()];
//! let page = client.executions().search(1, 10, &filters).await?;
//! println!("{} executions match", page.total);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Executions**: search, get, kill, resume, delete
//! - **Triggers**: search, enable/disable by query
//! - **Logs**: search
//! - **Namespaces**: search by prefix
//! - **Assets**: search, get, create, delete, purge by query
//! - **Test suites**: run

pub mod api;
pub mod client;
pub mod error;
pub mod query;
pub mod types;

pub use client::{ClientBuilder, DEFAULT_SERVER_URL, DEFAULT_TENANT, VigilClient};
pub use error::{Error, Result};
pub use types::*;
