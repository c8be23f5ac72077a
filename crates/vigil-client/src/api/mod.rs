//! API endpoint implementations.

mod assets;
mod executions;
mod logs;
mod namespaces;
mod test_suites;
mod triggers;

pub use assets::AssetsApi;
pub use executions::ExecutionsApi;
pub use logs::LogsApi;
pub use namespaces::NamespacesApi;
pub use test_suites::TestSuitesApi;
pub use triggers::TriggersApi;
