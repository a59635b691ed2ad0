// Self-similarity filter for solver output.
//
// A bar loop that is just a shorter loop played several times over adds
// nothing the shorter loop doesn't already give, so such solutions are
// dropped. A sequence of length L is self-similar when some divisor d of L
// with 1 <= d <= L/2 splits it into L/d identical blocks.

/// True if `seq` is an exact repetition of one of its aliquot prefixes.
pub fn is_self_similar<T: PartialEq>(seq: &[T]) -> bool {
    let len = seq.len();
    (1..=len / 2)
        .filter(|d| len % d == 0)
        .any(|d| repeats_with_period(seq, d))
}

/// Keep only the solutions that are not self-similar, preserving order.
pub fn filter<T: PartialEq>(solutions: Vec<Vec<T>>) -> Vec<Vec<T>> {
    solutions
        .into_iter()
        .filter(|s| !is_self_similar(s))
        .collect()
}

fn repeats_with_period<T: PartialEq>(seq: &[T], period: usize) -> bool {
    let (head, rest) = seq.split_at(period);
    rest.chunks(period).all(|block| block == head)
}
