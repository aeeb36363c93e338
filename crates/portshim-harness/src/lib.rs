//! Conformance testing harness for portshim.
//!
//! This crate provides:
//! - Fixture sets: JSON reference cases per function family
//! - Execution: run each case against the safe core in strict or hardened mode
//! - Report generation: human-readable + machine-readable conformance reports
//! - Structured logging: one JSONL record per executed case

#![forbid(unsafe_code)]

pub mod diff;
pub mod error;
pub mod exec;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod verify;

pub use error::HarnessError;
pub use fixtures::{FixtureCase, FixtureSet};
pub use report::ConformanceReport;
pub use runner::TestRunner;
pub use verify::VerificationResult;
