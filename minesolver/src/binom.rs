use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Computes the binomial coefficient `n` choose `k` exactly.
///
/// Counting the ways mines can fall into the unconstrained bulk needs exact
/// integers: a board with a few hundred free cells produces coefficients far
/// beyond what `f64` can represent without rounding, and the probability
/// comparisons downstream must be exact.
///
/// Out-of-domain requests (`k > n`) yield zero rather than an error, since
/// they correspond to placements that simply do not exist. (`k < 0` is
/// unrepresentable by `usize`.)
pub fn binomial(n: usize, k: usize) -> BigUint {
    if k > n {
        return BigUint::zero();
    }
    // C(n, k) == C(n, n - k); the smaller side means fewer multiplications.
    let k = k.min(n - k);
    let mut result = BigUint::one();
    for i in 1..=k {
        // Exact at every step: the running product is C(n - k + i, i).
        result = result * (n - k + i) / i;
    }
    result
}
