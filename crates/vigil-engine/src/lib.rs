//! Query and anomaly evaluation engine for Vigil.
//!
//! The engine turns optional criteria into filter predicates
//! ([`filter`]), walks paginated search endpoints ([`walker`]) and either
//! projects the records into a task output ([`projector`], [`tasks`]) or
//! classifies them for a polling monitor ([`classifier`], [`monitor`]).
//!
//! ```ignore
//! use std::sync::Arc;
//! use vigil_engine::monitor::{LogGenerator, MonitorRunner, ScheduleMonitor, ScheduleSettings};
//! use vigil_engine::clock::SystemClock;
//!
//! let source = Arc::new(client);
//! let monitor = ScheduleMonitor::new(ScheduleSettings::new("nightly", interval), source);
//! let mut runner = MonitorRunner::new(monitor, Arc::new(LogGenerator::new()), Arc::new(SystemClock))?;
//! runner.run(cancel).await;
//! ```

pub mod classifier;
pub mod clock;
pub mod error;
pub mod filter;
pub mod monitor;
pub mod projector;
pub mod sink;
pub mod tasks;
pub mod walker;

pub use classifier::{
    AnomalyVerdict, DetectedTrigger, MissingTimestamp, ScheduleRules, StaleAsset, StalenessRule,
    StuckCause, classify, classify_asset,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{EngineError, Result};
pub use filter::{FilterBuilder, FilterCriteria, FilterOptions, MetadataQuery, namespace_in_scope};
pub use monitor::{Monitor, MonitorEvent, MonitorRunner, TickOutcome};
pub use projector::{FetchMode, Projection, project};
pub use sink::{JsonLinesSink, RecordSink};
pub use walker::{PageWalker, PaginationWarning, Walk};
