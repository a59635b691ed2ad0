// Bar materialization: from an integer loop to concrete bar descriptors.
//
// Each window of a chosen solution becomes one bar. A window summing to
// `d` quarter notes gets time signature `d/2 over 2`, one subdivision per
// window entry (`value / 4` of a whole note) and a secondary accent grid of
// `d` repetitions of the long-short pair `3/16, 1/16`. Both the grid and the
// subdivisions therefore span `d / 4` whole notes.
//
// The solver returns an ordered list of equally valid loops; callers pick
// one by index. `bar_loop` runs the whole chain for one parameter set.

use crate::bar_solver::{self, windows};
use crate::config::BarLoopParams;
use crate::error::{GenError, Result};
use num_rational::Ratio;
use serde::{Deserialize, Serialize};

/// A rational duration in whole notes.
pub type Fraction = Ratio<u32>;

/// The accent pair repeated across every bar's grid.
pub const GRID_ACCENT: [(u32, u32); 2] = [(3, 16), (1, 16)];

/// One bar of the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// `(numerator, denominator)`.
    pub time_signature: (u32, u32),
    pub subdivisions: Vec<Fraction>,
    pub grid: Vec<Fraction>,
}

impl Bar {
    fn from_window(values: &[u32]) -> Result<Self> {
        if values.is_empty() || values.contains(&0) {
            return Err(GenError::invalid(format!(
                "window {values:?} has a zero-length subdivision"
            )));
        }
        let total: u64 = values.iter().map(|&v| u64::from(v)).sum();
        let duration = u32::try_from(total).map_err(|_| {
            GenError::invalid(format!("window {values:?} sums past u32 ({total})"))
        })?;
        if duration % 2 != 0 {
            return Err(GenError::invalid(format!(
                "window {values:?} sums to odd duration {duration}"
            )));
        }

        let subdivisions: Vec<Fraction> = values.iter().map(|&v| Ratio::new(v, 4)).collect();
        let grid: Vec<Fraction> = (0..duration)
            .flat_map(|_| GRID_ACCENT.iter().map(|&(n, d)| Ratio::new(n, d)))
            .collect();

        let bar = Bar {
            time_signature: (duration / 2, 2),
            subdivisions,
            grid,
        };
        assert_eq!(
            bar.grid_total(),
            bar.total(),
            "bar grid and subdivisions disagree for window {values:?}"
        );
        Ok(bar)
    }

    /// Total length in whole notes.
    pub fn total(&self) -> Fraction {
        self.subdivisions.iter().sum()
    }

    fn grid_total(&self) -> Fraction {
        self.grid.iter().sum()
    }

    /// Length in quarter notes.
    pub fn quarters(&self) -> u32 {
        (self.total() * 4).to_integer()
    }
}

/// Turn one solution into bars, one per window occurrence.
pub fn materialize(solution: &[u32], loop_shape: &[usize]) -> Result<Vec<Bar>> {
    windows(loop_shape, solution.len())?
        .iter()
        .map(|w| Bar::from_window(&w.values(solution)))
        .collect()
}

/// Pick the `nth` solution.
pub fn select(solutions: &[Vec<u32>], nth: usize) -> Result<&[u32]> {
    solutions
        .get(nth)
        .map(Vec::as_slice)
        .ok_or(GenError::SelectionOutOfRange {
            index: nth,
            available: solutions.len(),
        })
}

/// Pick the `nth` solution and materialize it.
pub fn materialize_nth(solutions: &[Vec<u32>], loop_shape: &[usize], nth: usize) -> Result<Vec<Bar>> {
    materialize(select(solutions, nth)?, loop_shape)
}

/// Solve, filter, select and materialize in one call.
pub fn bar_loop(params: &BarLoopParams, nth: usize) -> Result<Vec<Bar>> {
    let solutions = bar_solver::solve(
        &params.loop_shape,
        params.n_items,
        params.lower_bound,
        params.upper_bound,
        params.min_sum,
        params.max_sum,
    )?;
    tracing::debug!(
        available = solutions.len(),
        nth,
        "selecting bar loop"
    );
    materialize_nth(&solutions, &params.loop_shape, nth)
}
