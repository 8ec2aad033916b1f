//! Algorithms shared across simulation components
//!
//! This module provides deterministic parallel execution helpers and
//! basic sample statistics.

pub mod parallel;
pub mod stats;

pub use parallel::{map_indexed_in_parallel, task_seed};
pub use stats::{mean, median, std_dev};
