//! # Arena Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Fixture maps, units and content tables
//! - Scripted combat rolls
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod scripted_rng;

/// Re-export proptest for convenience.
pub use proptest;
