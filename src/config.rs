//! Explicit knobs for the aligner and report rendering.
//!
//! The test rigs differ in how many samples a publisher iteration holds
//! (4000 on the reference rig, 2000 on older setups) and in the latency
//! budget a run must meet, so both travel as configuration instead of
//! constants buried in the algorithm.

use serde::{Deserialize, Serialize};

/// Aligner configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Samples per publisher iteration; the SV counter runs from 0 to
    /// `iteration_size - 1` inside one iteration.
    pub iteration_size: u32,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            iteration_size: 4000,
        }
    }
}

impl AlignConfig {
    pub fn with_iteration_size(iteration_size: u32) -> Self {
        Self { iteration_size }
    }
}

/// Cell background colors used by the AsciiDoc renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportColors {
    pub pass: String,
    pub fail: String,
    pub absent: String,
}

impl Default for ReportColors {
    fn default() -> Self {
        Self {
            pass: "#90EE90".to_string(),
            fail: "#F08080".to_string(),
            absent: "#ee6644".to_string(),
        }
    }
}
