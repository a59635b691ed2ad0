// Data-driven parameter sets.
//
// The surrounding composition plan decides loop shapes, bounds and search
// budgets per section of the piece. Those numbers live in plain serde
// structs so they can be kept in JSON next to the plan and loaded without
// recompiling. `PulseSearchConfig` fills missing fields from its defaults;
// `BarLoopParams` has no sensible defaults and must be given in full.
//
// The search config carries the seed, so a stored config reproduces the
// same pulse trajectory.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inputs to the bar-duration solver (see bar_solver.rs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarLoopParams {
    /// Outer grouping cardinalities used for windowing.
    pub loop_shape: Vec<usize>,
    /// Number of free duration variables.
    pub n_items: usize,
    /// Inclusive lower bound of each variable (quarter notes).
    pub lower_bound: u32,
    /// Inclusive upper bound of each variable (quarter notes).
    pub upper_bound: u32,
    /// Inclusive lower bound of every window sum (quarter notes).
    pub min_sum: u32,
    /// Inclusive upper bound of every window sum (quarter notes).
    pub max_sum: u32,
}

impl BarLoopParams {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Budget and tuning of the ant-colony search behind pulse transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseSearchConfig {
    /// Samples per factor domain (rising and falling each).
    pub n_gradations: usize,
    /// Search iterations.
    pub generations: usize,
    /// Ants constructed per generation.
    pub population_size: usize,
    /// Best solutions kept as guides for the next generation.
    pub archive_size: usize,
    /// Rank locality of guide selection. Small values favour the best
    /// archived solutions strongly.
    pub locality: f64,
    /// Spread of new samples relative to archive disagreement. Lower
    /// converges faster.
    pub convergence: f64,
    /// PRNG seed.
    pub seed: u64,
}

impl Default for PulseSearchConfig {
    fn default() -> Self {
        PulseSearchConfig {
            n_gradations: 10,
            generations: 200,
            population_size: 64,
            archive_size: 32,
            locality: 0.3,
            convergence: 0.85,
            seed: 100,
        }
    }
}

impl PulseSearchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
