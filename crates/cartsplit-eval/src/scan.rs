//! Candidate enumeration and scoring over a predictor-sorted dataset.

use std::iter::FusedIterator;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::criterion::SplitCriterion;
use crate::error::SplitError;
use crate::group::{RunningStats, SplitGroups};
use crate::observation::{Observation, Score, validate_finite};
use crate::outcome::{CandidateScore, SplitOutcome};
use crate::significance::{SignificanceTest, TestMethod};

/// A prepared split search over one predictor.
///
/// Holds the observations sorted by predictor, running group summaries and
/// the admissible candidate positions. Scores are computed on demand, so
/// [`candidates`](Self::candidates) is lazy and can be restarted any
/// number of times.
///
/// Built by [`SplitSearchConfig::scan`](crate::SplitSearchConfig::scan).
pub struct SplitScan<'t, T: SignificanceTest + ?Sized = TestMethod> {
    predictors: Vec<f64>,
    responses: Vec<f64>,
    running: RunningStats,
    /// Left-group size of each admissible candidate, ascending.
    positions: Vec<usize>,
    criterion: SplitCriterion,
    min_group_size: usize,
    test: &'t T,
}

impl<'t, T: SignificanceTest + ?Sized> SplitScan<'t, T> {
    pub(crate) fn build(
        observations: &[Observation],
        criterion: SplitCriterion,
        min_group_size: usize,
        test: &'t T,
    ) -> Result<Self, SplitError> {
        validate_finite(observations)?;

        // Stable sort: equal predictors keep their input order.
        let mut sorted = observations.to_vec();
        sorted.sort_by(|a, b| a.predictor.total_cmp(&b.predictor));

        let n = sorted.len();
        let predictors: Vec<f64> = sorted.iter().map(|o| o.predictor).collect();
        let responses: Vec<f64> = sorted.iter().map(|o| o.response).collect();

        let n_distinct = if n == 0 {
            0
        } else {
            1 + predictors.windows(2).filter(|w| w[0] != w[1]).count()
        };
        let min_observations = 2 * min_group_size;
        if n < min_observations || n_distinct < 2 {
            return Err(SplitError::InsufficientData {
                n_observations: n,
                n_distinct,
                min_observations,
            });
        }

        // A boundary exists only where the next sorted value differs; the
        // threshold is the last value of the left run.
        let positions: Vec<usize> = (1..n)
            .filter(|&n_left| predictors[n_left - 1] != predictors[n_left])
            .filter(|&n_left| n_left >= min_group_size && n - n_left >= min_group_size)
            .collect();

        if positions.is_empty() {
            return Err(SplitError::DegenerateGroup {
                min_group_size,
                n_observations: n,
            });
        }

        debug!(
            n_observations = n,
            n_distinct,
            n_candidates = positions.len(),
            min_group_size,
            "split scan prepared"
        );

        let running = RunningStats::build(&responses);
        Ok(Self {
            predictors,
            responses,
            running,
            positions,
            criterion,
            min_group_size,
            test,
        })
    }

    /// Return the criterion candidates are scored under.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the minimum group size in effect.
    #[must_use]
    pub fn min_group_size(&self) -> usize {
        self.min_group_size
    }

    /// Return the number of observations.
    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.predictors.len()
    }

    /// Return the number of admissible candidate thresholds.
    #[must_use]
    pub fn n_candidates(&self) -> usize {
        self.positions.len()
    }

    /// Return the predictor values in ascending order.
    #[must_use]
    pub fn predictors(&self) -> &[f64] {
        &self.predictors
    }

    /// Return the responses in predictor order.
    #[must_use]
    pub fn responses(&self) -> &[f64] {
        &self.responses
    }

    /// Return the candidate thresholds in ascending order.
    pub fn thresholds(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.positions.iter().map(|&n_left| self.predictors[n_left - 1])
    }

    /// Lazily score every candidate in ascending threshold order.
    #[must_use]
    pub fn candidates(&self) -> Candidates<'_, 't, T> {
        Candidates {
            scan: self,
            next: 0,
            end: self.positions.len(),
        }
    }

    /// Score the candidate at `index` (threshold order).
    fn score_at(&self, index: usize) -> CandidateScore {
        let n_left = self.positions[index];
        let (left, right) = self.running.split_at(n_left);
        let score = match self.criterion {
            SplitCriterion::SumOfSquaresError => left.sum_sq_dev() + right.sum_sq_dev(),
            SplitCriterion::SignificanceTest => self.test.p_value(&SplitGroups {
                responses: &self.responses,
                left,
                right,
                total: self.running.total(),
                candidate_index: index,
            }),
        };
        CandidateScore {
            threshold: self.predictors[n_left - 1],
            score: Score::new(score),
            left_mean: left.mean(),
            right_mean: right.mean(),
            n_left,
            n_right: right.n(),
        }
    }

    /// Pick the minimum-score candidate, ties going to the smaller
    /// threshold.
    #[must_use]
    pub fn best(&self) -> SplitOutcome {
        let first = self.score_at(0);
        let best = self
            .candidates()
            .skip(1)
            .fold(first, |best, c| if c.beats(&best) { c } else { best });
        SplitOutcome::from_candidate(self.criterion, best, self.n_candidates())
    }

    /// Same as [`best`](Self::best), scoring candidates on the rayon pool.
    ///
    /// The reduction's tie-break is order-independent, so the result is
    /// identical to the sequential scan.
    #[must_use]
    pub fn best_parallel(&self) -> SplitOutcome {
        let first = self.score_at(0);
        let best = (1..self.positions.len())
            .into_par_iter()
            .map(|index| self.score_at(index))
            .reduce_with(|a, b| if b.beats(&a) { b } else { a })
            .map_or(first, |rest| if rest.beats(&first) { rest } else { first });
        SplitOutcome::from_candidate(self.criterion, best, self.n_candidates())
    }
}

/// Lazy iterator over candidate scores, produced by
/// [`SplitScan::candidates`].
pub struct Candidates<'s, 't, T: SignificanceTest + ?Sized> {
    scan: &'s SplitScan<'t, T>,
    next: usize,
    end: usize,
}

impl<T: SignificanceTest + ?Sized> Clone for Candidates<'_, '_, T> {
    fn clone(&self) -> Self {
        Self {
            scan: self.scan,
            next: self.next,
            end: self.end,
        }
    }
}

impl<T: SignificanceTest + ?Sized> Iterator for Candidates<'_, '_, T> {
    type Item = CandidateScore;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let item = self.scan.score_at(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.next = self.next.saturating_add(n).min(self.end);
        self.next()
    }
}

impl<T: SignificanceTest + ?Sized> DoubleEndedIterator for Candidates<'_, '_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        self.end -= 1;
        Some(self.scan.score_at(self.end))
    }
}

impl<T: SignificanceTest + ?Sized> ExactSizeIterator for Candidates<'_, '_, T> {}

impl<T: SignificanceTest + ?Sized> FusedIterator for Candidates<'_, '_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::significance::WelchTTest;

    fn observations(pairs: &[(f64, f64)]) -> Vec<Observation> {
        pairs.iter().copied().map(Observation::from).collect()
    }

    fn car_prices() -> Vec<Observation> {
        observations(&[
            (10_000.0, 12_000.0),
            (15_000.0, 11_000.0),
            (20_000.0, 9_000.0),
            (25_000.0, 8_500.0),
        ])
    }

    #[test]
    fn sse_candidates_and_scores() {
        let obs = car_prices();
        let scan = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 1, &WelchTTest).unwrap();
        let thresholds: Vec<f64> = scan.thresholds().collect();
        assert_eq!(thresholds, vec![10_000.0, 15_000.0, 20_000.0]);

        let scores: Vec<f64> = scan.candidates().map(|c| c.score.value()).collect();
        assert!((scores[0] - 3_500_000.0).abs() < 1e-6);
        assert!((scores[1] - 625_000.0).abs() < 1e-6);
        assert!((scores[2] - 14_000_000.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn best_picks_minimum_sse() {
        let obs = car_prices();
        let scan = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 1, &WelchTTest).unwrap();
        let best = scan.best();
        assert_eq!(best.threshold, 15_000.0);
        assert!((best.left_mean - 11_500.0).abs() < 1e-9);
        assert!((best.right_mean - 8_750.0).abs() < 1e-9);
        assert_eq!(best.n_candidates, 3);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let obs = observations(&[
            (25_000.0, 8_500.0),
            (10_000.0, 12_000.0),
            (20_000.0, 9_000.0),
            (15_000.0, 11_000.0),
        ]);
        let scan = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 1, &WelchTTest).unwrap();
        assert_eq!(scan.predictors(), &[10_000.0, 15_000.0, 20_000.0, 25_000.0]);
        assert_eq!(scan.responses(), &[12_000.0, 11_000.0, 9_000.0, 8_500.0]);
        assert_eq!(scan.best().threshold, 15_000.0);
    }

    #[test]
    fn duplicate_predictors_share_a_side() {
        let obs = observations(&[(1.0, 1.0), (2.0, 2.0), (2.0, 3.0), (3.0, 4.0)]);
        let scan = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 1, &WelchTTest).unwrap();
        let sizes: Vec<(f64, usize, usize)> = scan
            .candidates()
            .map(|c| (c.threshold, c.n_left, c.n_right))
            .collect();
        assert_eq!(sizes, vec![(1.0, 1, 3), (2.0, 3, 1)]);
    }

    #[test]
    fn min_group_size_excludes_extremes() {
        let obs: Vec<Observation> = (0..8).map(|i| Observation::new(i as f64, (i * i) as f64)).collect();
        let scan = SplitScan::build(&obs, SplitCriterion::SignificanceTest, 2, &WelchTTest).unwrap();
        let thresholds: Vec<f64> = scan.thresholds().collect();
        assert_eq!(thresholds, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        for c in scan.candidates() {
            assert!(c.n_left >= 2 && c.n_right >= 2);
        }
    }

    #[test]
    fn constant_predictor_is_insufficient() {
        let obs = observations(&[(5.0, 1.0), (5.0, 2.0), (5.0, 3.0)]);
        let err = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 1, &WelchTTest)
            .err()
            .unwrap();
        assert_eq!(
            err,
            SplitError::InsufficientData {
                n_observations: 3,
                n_distinct: 1,
                min_observations: 2,
            }
        );
    }

    #[test]
    fn empty_input_is_insufficient() {
        let err = SplitScan::build(&[], SplitCriterion::SumOfSquaresError, 1, &WelchTTest)
            .err()
            .unwrap();
        assert!(matches!(err, SplitError::InsufficientData { n_observations: 0, .. }));
    }

    #[test]
    fn too_few_for_group_size_is_insufficient() {
        let obs = observations(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let err = SplitScan::build(&obs, SplitCriterion::SignificanceTest, 2, &WelchTTest)
            .err()
            .unwrap();
        assert!(matches!(err, SplitError::InsufficientData { min_observations: 4, .. }));
    }

    #[test]
    fn skewed_ties_are_degenerate() {
        // Only boundary is after the three 1.0s, leaving one observation right.
        let obs = observations(&[(1.0, 1.0), (1.0, 2.0), (1.0, 3.0), (2.0, 4.0)]);
        let err = SplitScan::build(&obs, SplitCriterion::SignificanceTest, 2, &WelchTTest)
            .err()
            .unwrap();
        assert_eq!(
            err,
            SplitError::DegenerateGroup {
                min_group_size: 2,
                n_observations: 4,
            }
        );
    }

    #[test]
    fn candidates_restart_and_clone() {
        let obs = car_prices();
        let scan = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 1, &WelchTTest).unwrap();
        let first: Vec<CandidateScore> = scan.candidates().collect();
        let second: Vec<CandidateScore> = scan.candidates().collect();
        assert_eq!(first, second);

        let mut iter = scan.candidates();
        iter.next();
        let cloned: Vec<CandidateScore> = iter.clone().collect();
        let rest: Vec<CandidateScore> = iter.collect();
        assert_eq!(cloned, rest);
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn candidates_size_and_reverse() {
        let obs = car_prices();
        let scan = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 1, &WelchTTest).unwrap();
        let mut iter = scan.candidates();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back().map(|c| c.threshold), Some(20_000.0));
        assert_eq!(iter.nth(1).map(|c| c.threshold), Some(15_000.0));
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
    }

    #[test]
    fn parallel_matches_sequential() {
        let obs: Vec<Observation> = (0..200)
            .map(|i| {
                let x = (i * 37 % 200) as f64;
                let y = if x < 120.0 { 5.0 } else { 9.0 } + ((i * 13 % 7) as f64) * 0.1;
                Observation::new(x, y)
            })
            .collect();
        for criterion in [SplitCriterion::SumOfSquaresError, SplitCriterion::SignificanceTest] {
            let scan = SplitScan::build(&obs, criterion, 2, &WelchTTest).unwrap();
            assert_eq!(scan.best(), scan.best_parallel());
        }
    }

    #[test]
    fn tie_goes_to_smallest_threshold() {
        // Symmetric responses: thresholds 1.0 and 2.0 give the same SSE.
        let obs = observations(&[(0.0, 0.0), (1.0, 10.0), (2.0, 10.0), (3.0, 10.0), (4.0, 0.0)]);
        let scan = SplitScan::build(&obs, SplitCriterion::SumOfSquaresError, 2, &WelchTTest).unwrap();
        let scores: Vec<f64> = scan.candidates().map(|c| c.score.value()).collect();
        assert_eq!(scores[0], scores[1]);
        assert_eq!(scan.best().threshold, 1.0);
        assert_eq!(scan.best_parallel().threshold, 1.0);
    }
}
