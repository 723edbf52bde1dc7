/// Running summary of one group of responses.
///
/// Accumulated with Welford's update so that a constant group has an
/// exactly-zero deviation sum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupStats {
    n: usize,
    mean: f64,
    sum_sq_dev: f64,
}

impl GroupStats {
    /// Fold one response into the summary.
    pub(crate) fn push(mut self, value: f64) -> Self {
        self.n += 1;
        let delta = value - self.mean;
        self.mean += delta / self.n as f64;
        self.sum_sq_dev += delta * (value - self.mean);
        self
    }

    /// Number of responses in the group.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Arithmetic mean of the group (0.0 for an empty group).
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the group mean: `Σ(y_i - ȳ)²`.
    #[must_use]
    pub fn sum_sq_dev(&self) -> f64 {
        self.sum_sq_dev.max(0.0)
    }

    /// Population variance, `None` for an empty group.
    #[must_use]
    pub fn population_variance(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum_sq_dev() / self.n as f64)
    }

    /// Sample variance with Bessel's correction, `None` below two responses.
    #[must_use]
    pub fn sample_variance(&self) -> Option<f64> {
        (self.n > 1).then(|| self.sum_sq_dev() / (self.n - 1) as f64)
    }
}

/// The two groups produced by one candidate threshold, as seen by a
/// [`SignificanceTest`](crate::SignificanceTest).
///
/// `responses()` holds every response sorted by predictor; the first
/// `left().n()` of them form the left group.
#[derive(Debug, Clone, Copy)]
pub struct SplitGroups<'a> {
    pub(crate) responses: &'a [f64],
    pub(crate) left: GroupStats,
    pub(crate) right: GroupStats,
    pub(crate) total: GroupStats,
    pub(crate) candidate_index: usize,
}

impl<'a> SplitGroups<'a> {
    /// Summary of the left group (predictor ≤ threshold).
    #[must_use]
    pub fn left(&self) -> GroupStats {
        self.left
    }

    /// Summary of the right group (predictor > threshold).
    #[must_use]
    pub fn right(&self) -> GroupStats {
        self.right
    }

    /// Summary of all responses.
    #[must_use]
    pub fn total(&self) -> GroupStats {
        self.total
    }

    /// All responses in predictor order.
    #[must_use]
    pub fn responses(&self) -> &'a [f64] {
        self.responses
    }

    /// Responses of the left group.
    #[must_use]
    pub fn left_responses(&self) -> &'a [f64] {
        &self.responses[..self.left.n]
    }

    /// Responses of the right group.
    #[must_use]
    pub fn right_responses(&self) -> &'a [f64] {
        &self.responses[self.left.n..]
    }

    /// Zero-based position of this candidate in threshold order.
    ///
    /// Randomized tests use it to pick an RNG stream, which keeps results
    /// independent of the order candidates are scored in.
    #[must_use]
    pub fn candidate_index(&self) -> usize {
        self.candidate_index
    }
}

/// Forward and backward running summaries over a response sequence.
///
/// `prefix[k]` covers `responses[..k]` and `suffix[k]` covers
/// `responses[k..]`, so any split position reads both groups in O(1).
#[derive(Debug, Clone)]
pub(crate) struct RunningStats {
    prefix: Vec<GroupStats>,
    suffix: Vec<GroupStats>,
}

impl RunningStats {
    pub(crate) fn build(responses: &[f64]) -> Self {
        let n = responses.len();
        let mut prefix = Vec::with_capacity(n + 1);
        let mut acc = GroupStats::default();
        prefix.push(acc);
        for &y in responses {
            acc = acc.push(y);
            prefix.push(acc);
        }

        let mut suffix = vec![GroupStats::default(); n + 1];
        let mut acc = GroupStats::default();
        for (k, &y) in responses.iter().enumerate().rev() {
            acc = acc.push(y);
            suffix[k] = acc;
        }

        Self { prefix, suffix }
    }

    /// Left and right summaries when the first `n_left` responses go left.
    pub(crate) fn split_at(&self, n_left: usize) -> (GroupStats, GroupStats) {
        (self.prefix[n_left], self.suffix[n_left])
    }

    pub(crate) fn total(&self) -> GroupStats {
        self.suffix[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_of(values: &[f64]) -> GroupStats {
        values.iter().fold(GroupStats::default(), |acc, &v| acc.push(v))
    }

    #[test]
    fn empty_group() {
        let g = GroupStats::default();
        assert_eq!(g.n(), 0);
        assert!(g.population_variance().is_none());
        assert!(g.sample_variance().is_none());
    }

    #[test]
    fn mean_and_deviation() {
        let g = stats_of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(g.n(), 8);
        assert!((g.mean() - 5.0).abs() < 1e-12);
        assert!((g.sum_sq_dev() - 32.0).abs() < 1e-9);
        assert!((g.population_variance().unwrap() - 4.0).abs() < 1e-12);
        assert!((g.sample_variance().unwrap() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn constant_group_has_zero_deviation() {
        let g = stats_of(&[8_500.0, 8_500.0, 8_500.0]);
        assert_eq!(g.sum_sq_dev(), 0.0);
    }

    #[test]
    fn running_stats_split() {
        let responses = [12_000.0, 11_000.0, 9_000.0, 8_500.0];
        let running = RunningStats::build(&responses);
        let (left, right) = running.split_at(2);
        assert_eq!(left.n(), 2);
        assert_eq!(right.n(), 2);
        assert!((left.mean() - 11_500.0).abs() < 1e-9);
        assert!((right.mean() - 8_750.0).abs() < 1e-9);
        assert!((left.sum_sq_dev() - 500_000.0).abs() < 1e-6);
        assert!((right.sum_sq_dev() - 125_000.0).abs() < 1e-6);
        assert_eq!(running.total().n(), 4);
    }

    #[test]
    fn split_groups_slices() {
        let responses = [1.0, 2.0, 3.0, 4.0, 5.0];
        let running = RunningStats::build(&responses);
        let (left, right) = running.split_at(3);
        let groups = SplitGroups {
            responses: &responses,
            left,
            right,
            total: running.total(),
            candidate_index: 0,
        };
        assert_eq!(groups.left_responses(), &[1.0, 2.0, 3.0]);
        assert_eq!(groups.right_responses(), &[4.0, 5.0]);
    }
}
