//! Shared types for Vigil.
//!
//! Leaf types used by the client, the engine and the CLI: filter predicates,
//! the paging model and the remote records the engine inspects.

pub mod error;
pub mod filter;
pub mod page;
pub mod records;

pub use error::{Error, Result};
pub use filter::{FieldId, FilterExpression, FilterValue, Operator, format_instant};
pub use page::{LARGE_PAGE_SIZE, PageRequest, PageResult, SMALL_PAGE_SIZE};
pub use records::{
    Asset, ChildFilter, Execution, ExecutionState, FlowScope, Label, LogEntry, LogLevel,
    NamespaceRecord, StateType, TriggerRecord,
};
