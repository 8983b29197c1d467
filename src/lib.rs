//! Offline analysis of captured Sampled-Value (IEC 61850) timestamp logs.
//!
//! Library backing three standalone batch binaries invoked from the CI
//! pipeline:
//!
//! - `latency_report` turns colon-delimited publisher/subscriber SV logs
//!   into latency histograms plus `latency_tests.adoc` with a pass/fail
//!   banner.
//! - `timestamp_analysis` turns tcpdump-style capture logs into console
//!   latency and jitter statistics plus histogram images.
//! - `test_report` turns JUnit XML results (and optional compliance
//!   matrices) into AsciiDoc result tables.
//!
//! The algorithmic core is [`align`]: reconciling dropped samples between
//! two independently captured timestamp streams that only share a
//! per-stream sequence counter. Everything else is parsing, statistics
//! and document assembly around it.

pub mod adoc;
pub mod align;
pub mod compliance;
pub mod config;
pub mod error;
pub mod histogram;
pub mod junit;
pub mod parse;
pub mod sample;
pub mod stats;

pub use error::AnalysisError;
