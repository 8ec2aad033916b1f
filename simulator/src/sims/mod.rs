//! Event-level simulation

pub mod event;

pub use event::{EventDriver, EventRecord, ExecutionMode, RunSummary};
