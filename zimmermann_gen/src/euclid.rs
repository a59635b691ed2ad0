// Euclidean (Bjorklund) distribution of marked slots.
//
// Spreads `k` marks over `n` slots as evenly as possible. The pulse
// optimizer uses it to decide which transitions rise and which fall; the
// pattern always starts on a mark when `k > 0`.

/// Maximally-even placement of `k` marks among `n` slots.
///
/// `k` is clamped to `n`. `n == 0` yields an empty pattern.
///
/// ```
/// use zimmermann_gen::euclid::distribute;
/// let pattern = distribute(8, 3);
/// assert_eq!(
///     pattern,
///     [true, false, false, true, false, false, true, false]
/// );
/// ```
pub fn distribute(n: usize, k: usize) -> Vec<bool> {
    let k = k.min(n);
    if k == 0 {
        return vec![false; n];
    }
    if k == n {
        return vec![true; n];
    }

    let mut heads: Vec<Vec<bool>> = vec![vec![true]; k];
    let mut tails: Vec<Vec<bool>> = vec![vec![false]; n - k];

    loop {
        let pairs = heads.len().min(tails.len());
        let mut merged = Vec::with_capacity(pairs);
        for (head, tail) in heads.iter().zip(&tails) {
            let mut seq = head.clone();
            seq.extend_from_slice(tail);
            merged.push(seq);
        }

        tails = if heads.len() > pairs {
            heads.split_off(pairs)
        } else {
            tails.split_off(pairs)
        };
        heads = merged;

        if tails.len() <= 1 {
            break;
        }
    }

    heads.into_iter().chain(tails).flatten().collect()
}
