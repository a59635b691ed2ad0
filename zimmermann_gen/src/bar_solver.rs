// Bar-duration constraint solver.
//
// The decision variables are `n_items` bar-group durations (in quarter
// notes) that repeat cyclically. An outer loop shape such as `[4, 4]` groups
// consecutive variables into windows; the variable stream is cycled until the
// shape and the variable count realign, which takes
// `lcm(n_items, sum(shape)) / sum(shape)` passes over the shape. Every
// window must sum to a multiple of four quarters inside `[min_sum, max_sum]`.
//
// All satisfying assignments are enumerated exactly. The search is a plain
// depth-first backtrack over the variables in index order with forward
// checking: after each assignment every window touching the variable is
// tested for reachability of its sum range, and a window whose last variable
// was just fixed gets the modulus check. There is no node budget; keeping
// the domain and variable count tractable is up to the caller.
//
// Solutions that merely repeat a shorter pattern are removed afterwards by
// similarity.rs. Windows and bars (bars.rs) share the unfolding in
// `windows()`.

use crate::error::{GenError, Result};
use crate::similarity;
use num_integer::Integer;
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Window sums must be a multiple of this many quarter notes.
pub const BAR_SUM_MODULUS: u64 = 4;

/// A contiguous run of variable references, wrapped modulo `n_items`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    pub vars: Vec<usize>,
}

impl Window {
    /// Sum of the referenced values in `solution`.
    pub fn sum(&self, solution: &[u32]) -> u64 {
        self.vars.iter().map(|&v| u64::from(solution[v])).sum()
    }

    /// The referenced values, in window order.
    pub fn values(&self, solution: &[u32]) -> Vec<u32> {
        self.vars.iter().map(|&v| solution[v]).collect()
    }
}

/// Unfold `loop_shape` over a cyclic stream of `n_items` variables.
///
/// Returns every window occurrence in order, duplicates included. Every
/// shape entry must be positive: an empty window would become an empty bar.
pub fn windows(loop_shape: &[usize], n_items: usize) -> Result<Vec<Window>> {
    let shape_sum: usize = loop_shape.iter().sum();
    if shape_sum == 0 {
        return Err(GenError::DegenerateLoop);
    }
    if loop_shape.contains(&0) {
        return Err(GenError::invalid(format!(
            "loop shape {loop_shape:?} contains an empty window"
        )));
    }
    if n_items == 0 {
        return Err(GenError::invalid("n_items must be positive"));
    }

    let n_loops = n_items.lcm(&shape_sum) / shape_sum;
    let mut out = Vec::with_capacity(n_loops * loop_shape.len());
    let mut cursor = 0;
    for _ in 0..n_loops {
        for &size in loop_shape {
            let vars = (cursor..cursor + size).map(|i| i % n_items).collect();
            out.push(Window { vars });
            cursor += size;
        }
    }
    Ok(out)
}

/// A window reduced to `sum(coeff * x[var])`, used by the search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SumConstraint {
    /// `(var, coefficient)`, sorted by var.
    terms: Vec<(usize, u64)>,
}

impl SumConstraint {
    fn from_window(window: &Window) -> Self {
        let mut counts: BTreeMap<usize, u64> = BTreeMap::new();
        for &v in &window.vars {
            *counts.entry(v).or_default() += 1;
        }
        SumConstraint {
            terms: counts.into_iter().collect(),
        }
    }

    fn last_var(&self) -> Option<usize> {
        self.terms.last().map(|&(v, _)| v)
    }
}

struct Search {
    constraints: Vec<SumConstraint>,
    /// Constraint indices touching each variable.
    by_var: Vec<Vec<usize>>,
    lower: u32,
    upper: u32,
    min_sum: u64,
    max_sum: u64,
    nodes: u64,
}

impl Search {
    fn run(&mut self, n_items: usize) -> Vec<Vec<u32>> {
        let mut assignment = Vec::with_capacity(n_items);
        let mut found = Vec::new();
        self.descend(n_items, &mut assignment, &mut found);
        found
    }

    fn descend(&mut self, n_items: usize, assignment: &mut Vec<u32>, found: &mut Vec<Vec<u32>>) {
        let var = assignment.len();
        if var == n_items {
            found.push(assignment.clone());
            return;
        }
        for value in self.lower..=self.upper {
            self.nodes += 1;
            assignment.push(value);
            if self.consistent(var, assignment) {
                self.descend(n_items, assignment, found);
            }
            assignment.pop();
        }
    }

    /// Check every constraint touching `var`, given `assignment[..=var]`.
    fn consistent(&self, var: usize, assignment: &[u32]) -> bool {
        self.by_var[var].iter().all(|&ci| {
            let constraint = &self.constraints[ci];
            let mut fixed = 0u64;
            let mut slack_low = 0u64;
            let mut slack_high = 0u64;
            for &(v, coeff) in &constraint.terms {
                if v <= var {
                    fixed += coeff * u64::from(assignment[v]);
                } else {
                    slack_low += coeff * u64::from(self.lower);
                    slack_high += coeff * u64::from(self.upper);
                }
            }
            if fixed + slack_low > self.max_sum || fixed + slack_high < self.min_sum {
                return false;
            }
            if constraint.last_var() == Some(var) {
                return fixed % BAR_SUM_MODULUS == 0;
            }
            true
        })
    }
}

fn check_bounds(lower_bound: u32, upper_bound: u32, min_sum: u32, max_sum: u32) -> Result<()> {
    if lower_bound == 0 {
        return Err(GenError::invalid("lower bound must be at least one quarter"));
    }
    if lower_bound > upper_bound {
        return Err(GenError::invalid(format!(
            "lower bound {lower_bound} exceeds upper bound {upper_bound}"
        )));
    }
    if min_sum > max_sum {
        return Err(GenError::invalid(format!(
            "min_sum {min_sum} exceeds max_sum {max_sum}"
        )));
    }
    Ok(())
}

/// Enumerate every assignment satisfying the window constraints, without
/// the self-similarity filter. Results are in lexicographic order.
pub fn enumerate_all(
    loop_shape: &[usize],
    n_items: usize,
    lower_bound: u32,
    upper_bound: u32,
    min_sum: u32,
    max_sum: u32,
) -> Result<Vec<Vec<u32>>> {
    let all_windows = windows(loop_shape, n_items)?;
    check_bounds(lower_bound, upper_bound, min_sum, max_sum)?;

    let mut seen = HashSet::new();
    let constraints: Vec<SumConstraint> = all_windows
        .iter()
        .map(SumConstraint::from_window)
        .filter(|c| seen.insert(c.clone()))
        .collect();

    let mut by_var = vec![Vec::new(); n_items];
    for (ci, constraint) in constraints.iter().enumerate() {
        for &(v, _) in &constraint.terms {
            by_var[v].push(ci);
        }
    }

    let mut search = Search {
        constraints,
        by_var,
        lower: lower_bound,
        upper: upper_bound,
        min_sum: u64::from(min_sum),
        max_sum: u64::from(max_sum),
        nodes: 0,
    };
    let found = search.run(n_items);
    tracing::debug!(
        windows = all_windows.len(),
        constraints = search.constraints.len(),
        nodes = search.nodes,
        solutions = found.len(),
        "bar duration enumeration finished"
    );
    Ok(found)
}

/// Enumerate all bar-duration loops for the given shape and bounds, with
/// self-similar solutions removed.
///
/// An empty result means no loop satisfies the constraints.
pub fn solve(
    loop_shape: &[usize],
    n_items: usize,
    lower_bound: u32,
    upper_bound: u32,
    min_sum: u32,
    max_sum: u32,
) -> Result<Vec<Vec<u32>>> {
    let all = enumerate_all(loop_shape, n_items, lower_bound, upper_bound, min_sum, max_sum)?;
    let total = all.len();
    let kept = similarity::filter(all);
    tracing::debug!(
        enumerated = total,
        kept = kept.len(),
        "self-similar bar loops removed"
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_ok(sum: u64, min_sum: u32, max_sum: u32) -> bool {
        sum % BAR_SUM_MODULUS == 0 && (u64::from(min_sum)..=u64::from(max_sum)).contains(&sum)
    }

    #[test]
    fn windows_align_after_lcm_passes() {
        // sum(shape) = 5, n_items = 3 -> lcm 15 -> 3 passes, 6 windows.
        let ws = windows(&[3, 2], 3).unwrap();
        let vars: Vec<Vec<usize>> = ws.into_iter().map(|w| w.vars).collect();
        assert_eq!(
            vars,
            vec![
                vec![0, 1, 2],
                vec![0, 1],
                vec![2, 0, 1],
                vec![2, 0],
                vec![1, 2, 0],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn windows_for_even_split() {
        let ws = windows(&[4, 4], 8).unwrap();
        assert_eq!(ws.len(), 2);
        assert_eq!(ws[0].vars, vec![0, 1, 2, 3]);
        assert_eq!(ws[1].vars, vec![4, 5, 6, 7]);
    }

    #[test]
    fn degenerate_loop_fails_fast() {
        assert!(matches!(windows(&[], 4), Err(GenError::DegenerateLoop)));
        assert!(matches!(
            solve(&[0, 0], 4, 1, 3, 4, 8),
            Err(GenError::DegenerateLoop)
        ));
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(matches!(
            solve(&[2], 2, 5, 3, 4, 8),
            Err(GenError::InvalidArgument(_))
        ));
        assert!(matches!(
            solve(&[2], 0, 1, 3, 4, 8),
            Err(GenError::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_durations_are_rejected() {
        // A zero lower bound would let whole windows sum to nothing.
        assert!(matches!(
            solve(&[2, 2], 4, 0, 4, 0, 8),
            Err(GenError::InvalidArgument(_))
        ));
        assert!(matches!(
            windows(&[0, 2], 4),
            Err(GenError::InvalidArgument(_))
        ));
        assert!(matches!(
            solve(&[4, 0], 4, 1, 4, 4, 8),
            Err(GenError::InvalidArgument(_))
        ));
    }

    #[test]
    fn two_by_four_scenario() {
        let (lb, ub, min_sum, max_sum) = (2, 6, 4, 16);
        let solutions = solve(&[4, 4], 8, lb, ub, min_sum, max_sum).unwrap();
        assert!(!solutions.is_empty());
        let ws = windows(&[4, 4], 8).unwrap();
        for solution in &solutions {
            assert_eq!(solution.len(), 8);
            assert!(solution.iter().all(|&v| (lb..=ub).contains(&v)));
            for w in &ws {
                let sum = w.sum(solution);
                assert!(window_ok(sum, min_sum, max_sum), "{solution:?} window sum {sum}");
            }
            assert!(!similarity::is_self_similar(solution));
        }
    }

    #[test]
    fn enumeration_is_complete() {
        // Brute force the same small problem and compare.
        let shape = [3, 2];
        let (n, lb, ub, min_sum, max_sum) = (3usize, 1u32, 4u32, 4u32, 8u32);
        let ws = windows(&shape, n).unwrap();
        let mut brute = Vec::new();
        for a in lb..=ub {
            for b in lb..=ub {
                for c in lb..=ub {
                    let s = [a, b, c];
                    if ws.iter().all(|w| window_ok(w.sum(&s), min_sum, max_sum)) {
                        brute.push(s.to_vec());
                    }
                }
            }
        }
        let found = enumerate_all(&shape, n, lb, ub, min_sum, max_sum).unwrap();
        assert_eq!(found, brute);
    }

    #[test]
    fn no_solution_is_empty_not_error() {
        // Two variables in 1..=1 can only sum to 2, never a multiple of 4.
        let found = solve(&[2], 2, 1, 1, 1, 100).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn wrapping_window_counts_a_variable_twice() {
        // A window of 3 over 2 variables references x0 twice.
        let ws = windows(&[3], 2).unwrap();
        assert_eq!(ws[0].vars, vec![0, 1, 0]);
        assert_eq!(ws[1].vars, vec![1, 0, 1]);
        // 2a + b and a + 2b both multiples of 4 within 1..=4 forces a = b = 4.
        let found = enumerate_all(&[3], 2, 1, 4, 4, 12).unwrap();
        assert_eq!(found, vec![vec![4, 4]]);
    }

    #[test]
    fn self_similar_solutions_are_dropped() {
        let all = enumerate_all(&[2], 4, 2, 2, 4, 4).unwrap();
        assert_eq!(all, vec![vec![2, 2, 2, 2]]);
        assert!(solve(&[2], 4, 2, 2, 4, 4).unwrap().is_empty());
    }
}
