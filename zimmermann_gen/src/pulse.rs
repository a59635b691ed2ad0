// Continuous pulse transitions.
//
// Finds a sequence of pulse durations that starts at a fixed value and ends
// inside a target range, while keeping neighbouring pulses audibly
// different. Each step multiplies the previous pulse by a factor; steps are
// either rising (factor above 1) or falling (factor below 1). Which steps rise
// is fixed up front by a Euclidean distribution of
// `round(rising_fraction * n_transitions)` rising steps, so the search only
// picks how much each step changes.
//
// Factors are quantized: each direction has `n_gradations` evenly spaced
// values strictly inside `(MIN_CHANGE, 1)` or `(1, MAX_CHANGE)`, and every
// transition is one integer index into its direction's table.
//
// Cost is the negated local variety: for every pulse, the absolute
// differences to the next (up to) five pulses, summed. The terminal pulse
// must satisfy `min_end - last <= 0` and `last - max_end <= 0`. The search
// itself is the ant colony in aco.rs, seeded from the config.
//
// The champion is always returned. If it misses the target range the miss
// is logged with its direction; callers that need a hard guarantee check
// `PulseTrajectory::end_status` themselves.

use crate::aco::{self, ColonyParams, DiscreteProblem};
use crate::config::PulseSearchConfig;
use crate::error::{GenError, Result};
use crate::euclid;
use serde::{Deserialize, Serialize};
use zimmermann_prng::SearchRng;

/// Lower limit (exclusive) of a falling step's factor.
pub const MIN_CHANGE: f64 = 0.8;

/// Upper limit (exclusive) of a rising step's factor.
pub const MAX_CHANGE: f64 = 1.25;

/// How many following pulses each pulse is compared against.
pub const VARIETY_LOOKAHEAD: usize = 5;

/// Direction of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Rising,
    Falling,
}

/// Where a trajectory's terminal pulse lies relative to the target range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EndStatus {
    Within,
    /// Terminal pulse is below `min_end` by `by`.
    Undershoot { by: f64 },
    /// Terminal pulse is above `max_end` by `by`.
    Overshoot { by: f64 },
}

/// An ordered sequence of pulse durations; element 0 is the start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseTrajectory {
    pub pulses: Vec<f64>,
}

impl PulseTrajectory {
    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.pulses.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.pulses.last().copied()
    }

    /// The variety measure the search maximizes.
    pub fn local_variety(&self) -> f64 {
        local_variety(&self.pulses)
    }

    pub fn end_status(&self, min_end: f64, max_end: f64) -> EndStatus {
        match self.last() {
            Some(last) if last < min_end => EndStatus::Undershoot { by: min_end - last },
            Some(last) if last > max_end => EndStatus::Overshoot { by: last - max_end },
            _ => EndStatus::Within,
        }
    }
}

/// Sum over each pulse of its absolute differences to the next
/// `VARIETY_LOOKAHEAD` pulses.
pub fn local_variety(pulses: &[f64]) -> f64 {
    pulses
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            pulses[i + 1..]
                .iter()
                .take(VARIETY_LOOKAHEAD)
                .map(|&q| (p - q).abs())
                .sum::<f64>()
        })
        .sum()
}

/// Rising/falling label per transition of an `n_pulses` trajectory.
///
/// Fails if `rising_fraction` is outside `[0, 1]`.
pub fn directions(n_pulses: usize, rising_fraction: f64) -> Result<Vec<Direction>> {
    if !(0.0..=1.0).contains(&rising_fraction) {
        return Err(GenError::invalid(format!(
            "rising_fraction must lie in [0, 1], got {rising_fraction}"
        )));
    }
    let n_transitions = n_pulses.saturating_sub(1);
    let n_rising = (rising_fraction * n_transitions as f64).round_ties_even() as usize;
    Ok(euclid::distribute(n_transitions, n_rising)
        .into_iter()
        .map(|rising| {
            if rising {
                Direction::Rising
            } else {
                Direction::Falling
            }
        })
        .collect())
}

/// `n` evenly spaced values strictly between `low` and `high`.
fn gradations(low: f64, high: f64, n: usize) -> Vec<f64> {
    let step = (high - low) / (n + 1) as f64;
    (1..=n).map(|k| low + step * k as f64).collect()
}

struct TransitionProblem {
    start: f64,
    min_end: f64,
    max_end: f64,
    directions: Vec<Direction>,
    rising: Vec<f64>,
    falling: Vec<f64>,
}

impl TransitionProblem {
    fn factor(&self, direction: Direction, index: usize) -> f64 {
        match direction {
            Direction::Rising => self.rising[index],
            Direction::Falling => self.falling[index],
        }
    }

    fn decode(&self, genes: &[usize]) -> Vec<f64> {
        let mut pulses = Vec::with_capacity(genes.len() + 1);
        pulses.push(self.start);
        let mut current = self.start;
        for (&direction, &index) in self.directions.iter().zip(genes) {
            current *= self.factor(direction, index);
            pulses.push(current);
        }
        pulses
    }
}

impl DiscreteProblem for TransitionProblem {
    fn upper_bounds(&self) -> Vec<usize> {
        self.directions
            .iter()
            .map(|d| match d {
                Direction::Rising => self.rising.len() - 1,
                Direction::Falling => self.falling.len() - 1,
            })
            .collect()
    }

    fn cost(&self, genes: &[usize]) -> f64 {
        -local_variety(&self.decode(genes))
    }

    fn constraints(&self, genes: &[usize]) -> Vec<f64> {
        let last = self.decode(genes).last().copied().unwrap_or(self.start);
        vec![self.min_end - last, last - self.max_end]
    }
}

fn check_inputs(
    start: f64,
    (min_end, max_end): (f64, f64),
    n_pulses: usize,
    config: &PulseSearchConfig,
) -> Result<()> {
    if !(start.is_finite() && start > 0.0) {
        return Err(GenError::invalid(format!("start duration must be positive, got {start}")));
    }
    if !(min_end.is_finite() && max_end.is_finite() && 0.0 < min_end && min_end <= max_end) {
        return Err(GenError::invalid(format!(
            "end range must satisfy 0 < min <= max, got ({min_end}, {max_end})"
        )));
    }
    if n_pulses == 0 {
        return Err(GenError::invalid("n_pulses must be at least 1"));
    }
    if config.n_gradations == 0 {
        return Err(GenError::invalid("n_gradations must be positive"));
    }
    Ok(())
}

/// Search a pulse trajectory from `start` towards `end_range`.
///
/// Returns `n_pulses` durations beginning with `start`. Input errors fail
/// before any search; a trajectory that misses the range is still returned.
pub fn optimize(
    start: f64,
    end_range: (f64, f64),
    n_pulses: usize,
    rising_fraction: f64,
    config: &PulseSearchConfig,
) -> Result<PulseTrajectory> {
    let directions = directions(n_pulses, rising_fraction)?;
    check_inputs(start, end_range, n_pulses, config)?;
    let params = ColonyParams {
        generations: config.generations,
        population_size: config.population_size,
        archive_size: config.archive_size,
        locality: config.locality,
        convergence: config.convergence,
    };
    params.validate()?;

    let (min_end, max_end) = end_range;
    let problem = TransitionProblem {
        start,
        min_end,
        max_end,
        directions,
        rising: gradations(1.0, MAX_CHANGE, config.n_gradations),
        falling: gradations(MIN_CHANGE, 1.0, config.n_gradations),
    };

    let trajectory = if problem.directions.is_empty() {
        PulseTrajectory {
            pulses: vec![start],
        }
    } else {
        let mut rng = SearchRng::new(config.seed);
        let outcome = aco::search(&problem, &params, &mut rng);
        tracing::debug!(
            evaluations = outcome.evaluations,
            variety = -outcome.champion.cost,
            violation = outcome.champion.violation,
            "pulse transition search finished"
        );
        PulseTrajectory {
            pulses: problem.decode(&outcome.champion.genes),
        }
    };

    match trajectory.end_status(min_end, max_end) {
        EndStatus::Within => {}
        EndStatus::Undershoot { by } => tracing::warn!(
            terminal = trajectory.last(),
            min_end,
            "terminal pulse undershoots the target range by {by:.5}"
        ),
        EndStatus::Overshoot { by } => tracing::warn!(
            terminal = trajectory.last(),
            max_end,
            "terminal pulse overshoots the target range by {by:.5}"
        ),
    }

    Ok(trajectory)
}
