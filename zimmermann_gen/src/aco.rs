// Archive-based ant colony search over bounded integer vectors.
//
// A discrete take on ACO_R (Socha & Dorigo, 2008). The colony keeps an
// archive of the best solutions seen so far, ranked feasibility-first:
// a feasible solution beats any infeasible one, infeasible solutions are
// compared by total constraint violation, feasible ones by cost. Each ant
// picks a guide from the archive with Gaussian rank weights (`locality`
// controls how strongly the best ranks dominate), then samples every
// decision variable from a normal distribution centred on the guide's value
// with a spread proportional to how much the archive disagrees on that
// variable (`convergence` scales it). Samples are rounded and clamped into
// the variable's index range. After every generation the new ants are merged
// into the archive and the archive is cut back to its size.
//
// A small spread floor keeps the colony moving once the archive has
// collapsed onto a single solution.
//
// Used by pulse.rs. All randomness comes from the caller's seeded
// `SearchRng`.

use crate::error::{GenError, Result};
use std::cmp::Ordering;
use zimmermann_prng::SearchRng;

/// Lower bound on the per-variable sampling spread, in index units.
const MIN_SPREAD: f64 = 0.3;

/// A problem over integer vectors `x` with `0 <= x[i] <= upper_bounds()[i]`.
pub trait DiscreteProblem {
    /// Inclusive upper bound of each decision variable.
    fn upper_bounds(&self) -> Vec<usize>;

    /// Objective to minimize.
    fn cost(&self, genes: &[usize]) -> f64;

    /// Inequality constraint values; each must be `<= 0` to be satisfied.
    fn constraints(&self, genes: &[usize]) -> Vec<f64>;
}

/// An evaluated decision vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub genes: Vec<usize>,
    pub cost: f64,
    /// Sum of the positive parts of the constraint values.
    pub violation: f64,
}

impl Candidate {
    fn evaluate(problem: &impl DiscreteProblem, genes: Vec<usize>) -> Self {
        let cost = problem.cost(&genes);
        let violation = problem
            .constraints(&genes)
            .into_iter()
            .map(|g| g.max(0.0))
            .sum();
        Candidate {
            genes,
            cost,
            violation,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.violation <= 0.0
    }

    /// Feasibility-first ordering; `Less` means better.
    pub fn rank_cmp(&self, other: &Candidate) -> Ordering {
        match (self.is_feasible(), other.is_feasible()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.violation.total_cmp(&other.violation),
            (true, true) => self.cost.total_cmp(&other.cost),
        }
    }
}

/// Colony parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ColonyParams {
    pub generations: usize,
    pub population_size: usize,
    pub archive_size: usize,
    pub locality: f64,
    pub convergence: f64,
}

impl ColonyParams {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(GenError::invalid("population_size must be positive"));
        }
        if self.archive_size == 0 {
            return Err(GenError::invalid("archive_size must be positive"));
        }
        if !(self.locality.is_finite() && self.locality > 0.0) {
            return Err(GenError::invalid(format!(
                "locality must be positive, got {}",
                self.locality
            )));
        }
        if !(self.convergence.is_finite() && self.convergence >= 0.0) {
            return Err(GenError::invalid(format!(
                "convergence must be non-negative, got {}",
                self.convergence
            )));
        }
        Ok(())
    }
}

/// Result of a colony run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best candidate found.
    pub champion: Candidate,
    /// Number of cost/constraint evaluations performed.
    pub evaluations: usize,
}

/// Run the colony on `problem`. Parameters must pass `validate()`.
pub fn search(
    problem: &impl DiscreteProblem,
    params: &ColonyParams,
    rng: &mut SearchRng,
) -> SearchOutcome {
    let upper = problem.upper_bounds();
    let archive_size = params.archive_size.max(1);
    let mut evaluations = 0;

    let mut archive: Vec<Candidate> = (0..archive_size)
        .map(|_| {
            let genes = upper
                .iter()
                .map(|&hi| rng.range_usize_inclusive(0, hi))
                .collect();
            evaluations += 1;
            Candidate::evaluate(problem, genes)
        })
        .collect();
    archive.sort_by(Candidate::rank_cmp);

    let weights = rank_weights(archive.len(), params.locality);

    for generation in 0..params.generations {
        let mut ants = Vec::with_capacity(params.population_size);
        for _ in 0..params.population_size {
            let guide = rng.weighted_index(&weights).unwrap_or(0);
            let genes = sample_around(&archive, guide, &upper, params.convergence, rng);
            evaluations += 1;
            ants.push(Candidate::evaluate(problem, genes));
        }

        archive.extend(ants);
        archive.sort_by(Candidate::rank_cmp);
        archive.truncate(archive_size);

        if generation % 50 == 0 {
            tracing::trace!(
                generation,
                best_cost = archive[0].cost,
                best_violation = archive[0].violation,
                "colony progress"
            );
        }
    }

    SearchOutcome {
        champion: archive.swap_remove(0),
        evaluations,
    }
}

/// Gaussian weights over archive ranks (rank 0 is the best).
fn rank_weights(k: usize, locality: f64) -> Vec<f64> {
    let spread = locality * k as f64;
    (0..k)
        .map(|rank| {
            let r = rank as f64;
            (-(r * r) / (2.0 * spread * spread)).exp()
        })
        .collect()
}

fn sample_around(
    archive: &[Candidate],
    guide: usize,
    upper: &[usize],
    convergence: f64,
    rng: &mut SearchRng,
) -> Vec<usize> {
    let centre = &archive[guide].genes;
    let others = archive.len().saturating_sub(1).max(1) as f64;

    upper
        .iter()
        .enumerate()
        .map(|(i, &hi)| {
            let mean = centre[i] as f64;
            let disagreement: f64 = archive
                .iter()
                .map(|c| (c.genes[i] as f64 - mean).abs())
                .sum();
            let spread = (convergence * disagreement / others).max(MIN_SPREAD);
            let draw = rng.normal(mean, spread).round();
            draw.clamp(0.0, hi as f64) as usize
        })
        .collect()
}
