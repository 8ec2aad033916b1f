//! Shared components and utilities for the fiber tracker simulation.
//!
//! This crate holds the domain-agnostic pieces (seeded parallel execution,
//! summary statistics) that the simulator and its tests build on.

pub mod algo;
