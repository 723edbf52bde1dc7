//! Two-sample significance tests used to score candidate splits.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::group::SplitGroups;
use crate::special::{chi_square_sf, student_t_two_sided};

/// A hypothesis test of "left and right responses share a location".
///
/// Implementations return a p-value in `[0, 1]`; smaller means stronger
/// evidence for the split. Must be `Sync` so candidates can be scored on
/// the rayon pool.
pub trait SignificanceTest: Sync {
    /// Compute the p-value for one candidate split.
    fn p_value(&self, groups: &SplitGroups<'_>) -> f64;
}

/// Welch's unequal-variance t-test, two-sided.
///
/// Degrees of freedom follow Welch–Satterthwaite. When both groups are
/// constant the standard error is zero: the p-value is 1.0 if the means
/// coincide and 0.0 otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WelchTTest;

impl SignificanceTest for WelchTTest {
    fn p_value(&self, groups: &SplitGroups<'_>) -> f64 {
        let (left, right) = (groups.left(), groups.right());
        let (Some(var_l), Some(var_r)) = (left.sample_variance(), right.sample_variance()) else {
            return 1.0;
        };
        let n_l = left.n() as f64;
        let n_r = right.n() as f64;
        let diff = left.mean() - right.mean();

        let se_l = var_l / n_l;
        let se_r = var_r / n_r;
        let se2 = se_l + se_r;
        if se2 <= 0.0 {
            return if diff == 0.0 { 1.0 } else { 0.0 };
        }

        let t = diff / se2.sqrt();
        // Shares of se² keep the squares away from underflow on tiny scales.
        let (share_l, share_r) = (se_l / se2, se_r / se2);
        let df = 1.0 / (share_l * share_l / (n_l - 1.0) + share_r * share_r / (n_r - 1.0));
        student_t_two_sided(t, df)
    }
}

/// Conditional-inference test for a binary split indicator against a
/// numeric response, using the asymptotic χ²(1) distribution of the
/// standardized linear statistic.
///
/// With `T = Σ_left y`, the permutation moments are `E[T] = n_L·ȳ` and
/// `V[T] = n_L·n_R·σ² / (n - 1)`, where `σ²` is the population variance of
/// all responses. A constant response gives p = 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionalInferenceTest;

impl SignificanceTest for ConditionalInferenceTest {
    fn p_value(&self, groups: &SplitGroups<'_>) -> f64 {
        match standardized_statistic(groups) {
            Some(c) => chi_square_sf(c * c, 1.0),
            None => 1.0,
        }
    }
}

/// Monte Carlo permutation version of [`ConditionalInferenceTest`].
///
/// Each candidate draws `n_resamples` random relabelings from a
/// [`ChaCha8Rng`] seeded with `seed` on the stream given by the
/// candidate's position, so the p-value is reproducible and independent of
/// scoring order. The estimate is `(1 + hits) / (1 + n_resamples)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationTest {
    n_resamples: usize,
    seed: u64,
}

impl PermutationTest {
    /// Create a permutation test. `n_resamples` is validated when a search
    /// runs (see [`SplitError::InvalidResampleCount`](crate::SplitError)).
    #[must_use]
    pub fn new(n_resamples: usize, seed: u64) -> Self {
        Self { n_resamples, seed }
    }

    /// Return the number of random relabelings per candidate.
    #[must_use]
    pub fn n_resamples(&self) -> usize {
        self.n_resamples
    }

    /// Return the RNG seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SignificanceTest for PermutationTest {
    fn p_value(&self, groups: &SplitGroups<'_>) -> f64 {
        let Some(observed) = standardized_statistic(groups) else {
            return 1.0;
        };
        let n_left = groups.left().n();
        let mean = groups.total().mean();
        let scale = (groups.total().sum_sq_dev() / groups.total().n() as f64).sqrt();
        // Relative slack so the observed labeling counts as a hit despite
        // summation-order rounding.
        let cutoff = observed.abs() * (1.0 - 1e-10);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(groups.candidate_index() as u64);

        let mut pool = groups.responses().to_vec();
        let n = pool.len();
        let variance_factor = (n_left * (n - n_left)) as f64 / (n - 1) as f64;
        let denom = scale * variance_factor.sqrt();

        let mut hits = 0usize;
        for _ in 0..self.n_resamples {
            // Partial Fisher-Yates: only the first n_left slots are needed.
            for i in 0..n_left {
                let j = rng.gen_range(i..n);
                pool.swap(i, j);
            }
            let sum: f64 = pool[..n_left].iter().sum();
            let c = (sum - n_left as f64 * mean) / denom;
            if c.abs() >= cutoff {
                hits += 1;
            }
        }
        (1 + hits) as f64 / (1 + self.n_resamples) as f64
    }
}

/// `(T - E[T]) / sqrt(V[T])`, or `None` when the response is constant.
fn standardized_statistic(groups: &SplitGroups<'_>) -> Option<f64> {
    let total = groups.total();
    let n = total.n();
    let n_left = groups.left().n();
    let n_right = groups.right().n();
    if n < 2 || n_left == 0 || n_right == 0 {
        return None;
    }
    let sigma2 = total.population_variance()?;
    if sigma2 <= 0.0 {
        return None;
    }
    let centered = n_left as f64 * (groups.left().mean() - total.mean());
    let variance = (n_left * n_right) as f64 * sigma2 / (n - 1) as f64;
    Some(centered / variance.sqrt())
}

/// Built-in significance tests, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TestMethod {
    /// [`WelchTTest`].
    #[default]
    Welch,
    /// [`ConditionalInferenceTest`].
    ConditionalInference,
    /// [`PermutationTest`] with the given resample count and seed.
    Permutation {
        /// Random relabelings per candidate.
        n_resamples: usize,
        /// RNG seed.
        seed: u64,
    },
}

impl SignificanceTest for TestMethod {
    fn p_value(&self, groups: &SplitGroups<'_>) -> f64 {
        match *self {
            TestMethod::Welch => WelchTTest.p_value(groups),
            TestMethod::ConditionalInference => ConditionalInferenceTest.p_value(groups),
            TestMethod::Permutation { n_resamples, seed } => {
                PermutationTest::new(n_resamples, seed).p_value(groups)
            }
        }
    }
}
