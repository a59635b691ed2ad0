// Nested cyclic loops: a recursive index structure built from per-level
// cardinality sequences.
//
// A loop spec such as `[[3, 2], [2, 2, 1]]` describes one cyclic counter per
// level. Building a top-level group reads the next value from the outermost
// counter and, for every level that is not the innermost, builds that many
// children from the next level's counter. The innermost level yields plain
// integer leaves.
//
// Groups are appended until every counter has wrapped back to phase 0 at
// the same time. Closure is checked after each group rather than computed
// up front from the LCM of the level periods: an early realignment changes
// the output length and has to be honoured.
//
// Counters are explicit `(sequence, index)` values with a pure `advance`, so
// the builder threads state through the recursion instead of holding
// iterators. The sequence is shared; advancing copies only the index.

use crate::error::{GenError, Result};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Per-level cardinality sequences, outermost first.
pub type LoopSpec = Vec<Vec<usize>>;

/// A cyclic counter over one level's cardinalities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleCounter {
    values: Rc<[usize]>,
    index: usize,
}

impl CycleCounter {
    pub fn new(values: Vec<usize>) -> Self {
        CycleCounter {
            values: values.into(),
            index: 0,
        }
    }

    /// Current 0-based phase within the level's sequence.
    pub fn phase(&self) -> usize {
        self.index
    }

    pub fn period(&self) -> usize {
        self.values.len()
    }

    /// Emit the value at the current phase and return the advanced counter.
    pub fn advance(&self) -> (CycleCounter, usize) {
        let value = self.values[self.index];
        let next = CycleCounter {
            values: Rc::clone(&self.values),
            index: (self.index + 1) % self.values.len(),
        };
        (next, value)
    }
}

/// One element of a nested loop: a leaf cardinality or a group of children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopNode {
    Leaf(usize),
    Group(Vec<LoopNode>),
}

impl LoopNode {
    /// Sum of all leaves below (or the leaf itself).
    pub fn duration(&self) -> usize {
        match self {
            LoopNode::Leaf(n) => *n,
            LoopNode::Group(children) => children.iter().map(LoopNode::duration).sum(),
        }
    }

    /// Depth-first leaf values.
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<usize>) {
        match self {
            LoopNode::Leaf(n) => out.push(*n),
            LoopNode::Group(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            LoopNode::Leaf(_) => 0,
            LoopNode::Group(children) => {
                1 + children.iter().map(LoopNode::depth).max().unwrap_or(0)
            }
        }
    }
}

/// A closed nested loop: a whole number of cycles of every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedLoop {
    /// Top-level elements, one per value consumed from the outermost level.
    pub elements: Vec<LoopNode>,
    /// Counter phases after the last group was appended. All zero.
    pub final_phases: Vec<usize>,
}

impl NestedLoop {
    /// Per top-level element, the durations of its direct children.
    /// A top-level leaf reads out as a one-element list of itself.
    pub fn readout(&self) -> Vec<Vec<usize>> {
        self.elements
            .iter()
            .map(|node| match node {
                LoopNode::Leaf(n) => vec![*n],
                LoopNode::Group(children) => children.iter().map(LoopNode::duration).collect(),
            })
            .collect()
    }

    /// Total leaf duration of each top-level element.
    pub fn durations(&self) -> Vec<usize> {
        self.elements.iter().map(LoopNode::duration).collect()
    }

    /// All leaf values, depth first.
    pub fn leaves(&self) -> Vec<usize> {
        self.elements.iter().flat_map(LoopNode::leaves).collect()
    }

    /// Nesting depth below the top level (0 for a single-level spec).
    pub fn depth(&self) -> usize {
        self.elements.iter().map(LoopNode::depth).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Build the closed nested loop for `spec`.
///
/// Fails with `InvalidArgument` if the spec has no levels, a level is
/// empty, or any cardinality is zero.
pub fn build(spec: &[Vec<usize>]) -> Result<NestedLoop> {
    if spec.is_empty() {
        return Err(GenError::invalid("loop spec needs at least one level"));
    }
    for (level, values) in spec.iter().enumerate() {
        if values.is_empty() {
            return Err(GenError::invalid(format!("loop level {level} is empty")));
        }
        if values.contains(&0) {
            return Err(GenError::invalid(format!(
                "loop level {level} contains a zero cardinality"
            )));
        }
    }

    let mut counters: Vec<CycleCounter> = spec.iter().cloned().map(CycleCounter::new).collect();
    let mut elements = Vec::new();

    loop {
        elements.push(build_node(&mut counters, 0));
        if counters.iter().all(|c| c.phase() == 0) {
            break;
        }
    }

    tracing::debug!(
        levels = spec.len(),
        groups = elements.len(),
        "nested loop closed"
    );

    Ok(NestedLoop {
        elements,
        final_phases: counters.iter().map(CycleCounter::phase).collect(),
    })
}

/// Consume one value at `level` and expand it downwards.
fn build_node(counters: &mut [CycleCounter], level: usize) -> LoopNode {
    let (next, value) = counters[level].advance();
    counters[level] = next;

    if level + 1 == counters.len() {
        return LoopNode::Leaf(value);
    }
    let mut children = Vec::with_capacity(value);
    for _ in 0..value {
        children.push(build_node(counters, level + 1));
    }
    LoopNode::Group(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_readout() {
        let nested = build(&[vec![3, 2], vec![2, 2, 1]]).unwrap();
        assert_eq!(
            nested.readout(),
            vec![
                vec![2, 2, 1],
                vec![2, 2],
                vec![1, 2, 2],
                vec![1, 2],
                vec![2, 1, 2],
                vec![2, 1],
            ]
        );
        assert_eq!(nested.durations(), vec![5, 4, 5, 3, 5, 3]);
        assert_eq!(nested.depth(), 1);
    }

    #[test]
    fn closure_holds_for_assorted_specs() {
        let specs: Vec<LoopSpec> = vec![
            vec![vec![1]],
            vec![vec![4, 3, 2]],
            vec![vec![2, 3], vec![1, 2, 3, 4]],
            vec![vec![3], vec![2, 1], vec![1, 1, 2]],
            vec![vec![2, 2, 3], vec![3, 1], vec![2, 3, 1, 1], vec![1, 2]],
        ];
        for spec in specs {
            let nested = build(&spec).unwrap();
            assert!(
                nested.final_phases.iter().all(|&p| p == 0),
                "spec {spec:?} left phases {:?}",
                nested.final_phases
            );
            assert_eq!(nested.final_phases.len(), spec.len());
        }
    }

    #[test]
    fn leaves_replay_the_innermost_cycle() {
        let spec = vec![vec![3, 2], vec![2, 2, 1]];
        let nested = build(&spec).unwrap();
        let leaves = nested.leaves();
        assert_eq!(leaves.len() % spec[1].len(), 0);
        for (i, &leaf) in leaves.iter().enumerate() {
            assert_eq!(leaf, spec[1][i % spec[1].len()]);
        }
    }

    #[test]
    fn single_level_yields_leaves() {
        let nested = build(&[vec![4, 3, 2]]).unwrap();
        assert_eq!(
            nested.elements,
            vec![LoopNode::Leaf(4), LoopNode::Leaf(3), LoopNode::Leaf(2)]
        );
        assert_eq!(nested.readout(), vec![vec![4], vec![3], vec![2]]);
        assert_eq!(nested.depth(), 0);
    }

    #[test]
    fn early_realignment_stops_after_one_group() {
        // One group consumes the outer value once and exactly one full pass
        // of the inner level, so everything is back at phase 0 immediately.
        let nested = build(&[vec![3], vec![1, 2, 3]]).unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested.readout(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn counter_advance_is_pure() {
        let counter = CycleCounter::new(vec![5, 7]);
        let (next, value) = counter.advance();
        assert_eq!(value, 5);
        assert_eq!(counter.phase(), 0);
        assert_eq!(next.phase(), 1);
        let (wrapped, value) = next.advance();
        assert_eq!(value, 7);
        assert_eq!(wrapped.phase(), 0);
        assert_eq!(wrapped.period(), 2);
    }

    #[test]
    fn advancing_shares_the_sequence() {
        let counter = CycleCounter::new(vec![3, 1, 4]);
        let (next, _) = counter.advance();
        let (after, _) = next.advance();
        assert!(Rc::ptr_eq(&counter.values, &after.values));
        assert_eq!(Rc::strong_count(&counter.values), 3);
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(matches!(build(&[]), Err(GenError::InvalidArgument(_))));
        assert!(matches!(
            build(&[vec![2], vec![]]),
            Err(GenError::InvalidArgument(_))
        ));
        assert!(matches!(
            build(&[vec![2, 0]]),
            Err(GenError::InvalidArgument(_))
        ));
    }
}
