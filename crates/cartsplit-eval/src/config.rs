//! Configuration builder for single-variable split search.

use tracing::{debug, instrument};

use crate::criterion::SplitCriterion;
use crate::error::SplitError;
use crate::observation::Observation;
use crate::outcome::SplitOutcome;
use crate::scan::SplitScan;
use crate::significance::{SignificanceTest, TestMethod};

/// Configuration for a split search over one predictor.
///
/// Construct via [`SplitSearchConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter        | Default                                       |
/// |------------------|-----------------------------------------------|
/// | `min_group_size` | 1 for `SumOfSquaresError`, 2 for `SignificanceTest` |
/// | `test`           | `Welch`                                       |
/// | `parallel`       | `false`                                       |
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSearchConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) min_group_size: Option<usize>,
    pub(crate) test: TestMethod,
    pub(crate) parallel: bool,
}

impl SplitSearchConfig {
    /// Create a new config for the given criterion.
    #[must_use]
    pub fn new(criterion: SplitCriterion) -> Self {
        Self {
            criterion,
            min_group_size: None,
            test: TestMethod::Welch,
            parallel: false,
        }
    }

    // --- Setters ---

    /// Set the minimum number of observations on each side of a split.
    #[must_use]
    pub fn with_min_group_size(mut self, min_group_size: usize) -> Self {
        self.min_group_size = Some(min_group_size);
        self
    }

    /// Set the built-in significance test used by `SignificanceTest`.
    #[must_use]
    pub fn with_test(mut self, test: TestMethod) -> Self {
        self.test = test;
        self
    }

    /// Score candidates on the rayon thread pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // --- Getters ---

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the minimum group size, resolving the criterion default.
    #[must_use]
    pub fn min_group_size(&self) -> usize {
        self.min_group_size
            .unwrap_or_else(|| self.criterion.default_min_group_size())
    }

    /// Return the configured significance test.
    #[must_use]
    pub fn test(&self) -> TestMethod {
        self.test
    }

    /// Return whether candidates are scored in parallel.
    #[must_use]
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Find the best split of `observations` under this configuration.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                                        |
    /// |--------------------------------------|-------------------------------------------------------------|
    /// | [`SplitError::NonFiniteValue`]       | any predictor or response is NaN or infinite                |
    /// | [`SplitError::InvalidMinGroupSize`]  | `min_group_size` is below the criterion's minimum           |
    /// | [`SplitError::InvalidResampleCount`] | a permutation test is configured with zero resamples        |
    /// | [`SplitError::InsufficientData`]     | fewer than `2 * min_group_size` observations, or < 2 distinct predictor values |
    /// | [`SplitError::DegenerateGroup`]      | no candidate leaves `min_group_size` observations per side |
    pub fn evaluate(&self, observations: &[Observation]) -> Result<SplitOutcome, SplitError> {
        self.validate_test()?;
        self.evaluate_with(observations, &self.test)
    }

    /// Like [`evaluate`](Self::evaluate), but scores the significance
    /// criterion with a caller-supplied test instead of the configured one.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate), minus the resample-count check.
    #[instrument(
        skip(self, observations, test),
        fields(criterion = %self.criterion, n_observations = observations.len())
    )]
    pub fn evaluate_with<T>(
        &self,
        observations: &[Observation],
        test: &T,
    ) -> Result<SplitOutcome, SplitError>
    where
        T: SignificanceTest + ?Sized,
    {
        let scan = self.scan_with(observations, test)?;
        let outcome = if self.parallel {
            scan.best_parallel()
        } else {
            scan.best()
        };
        debug!(
            threshold = outcome.threshold,
            score = outcome.score.value(),
            n_left = outcome.n_left,
            n_right = outcome.n_right,
            n_candidates = outcome.n_candidates,
            "best split selected"
        );
        Ok(outcome)
    }

    /// Prepare a [`SplitScan`] for inspecting every candidate's score.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    pub fn scan(&self, observations: &[Observation]) -> Result<SplitScan<'_>, SplitError> {
        self.validate_test()?;
        self.scan_with(observations, &self.test)
    }

    /// Prepare a [`SplitScan`] that scores with a caller-supplied test.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate_with`](Self::evaluate_with).
    pub fn scan_with<'t, T>(
        &self,
        observations: &[Observation],
        test: &'t T,
    ) -> Result<SplitScan<'t, T>, SplitError>
    where
        T: SignificanceTest + ?Sized,
    {
        let min_group_size = self.min_group_size();
        let minimum = self.criterion.smallest_min_group_size();
        if min_group_size < minimum {
            return Err(SplitError::InvalidMinGroupSize {
                min_group_size,
                minimum,
            });
        }
        SplitScan::build(observations, self.criterion, min_group_size, test)
    }

    fn validate_test(&self) -> Result<(), SplitError> {
        if self.criterion == SplitCriterion::SignificanceTest
            && let TestMethod::Permutation { n_resamples: 0, .. } = self.test
        {
            return Err(SplitError::InvalidResampleCount { n_resamples: 0 });
        }
        Ok(())
    }
}

/// Find the best split of `observations` under `criterion` with default
/// settings.
///
/// Shorthand for `SplitSearchConfig::new(criterion).evaluate(observations)`.
///
/// # Errors
///
/// See [`SplitSearchConfig::evaluate`].
pub fn evaluate_splits(
    observations: &[Observation],
    criterion: SplitCriterion,
) -> Result<SplitOutcome, SplitError> {
    SplitSearchConfig::new(criterion).evaluate(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::SplitGroups;
    use crate::significance::ConditionalInferenceTest;

    fn car_prices() -> Vec<Observation> {
        [
            (10_000.0, 12_000.0),
            (15_000.0, 11_000.0),
            (20_000.0, 9_000.0),
            (25_000.0, 8_500.0),
        ]
        .into_iter()
        .map(Observation::from)
        .collect()
    }

    #[test]
    fn defaults_follow_criterion() {
        let sse = SplitSearchConfig::new(SplitCriterion::SumOfSquaresError);
        assert_eq!(sse.min_group_size(), 1);
        assert_eq!(sse.test(), TestMethod::Welch);
        assert!(!sse.parallel());

        let sig = SplitSearchConfig::new(SplitCriterion::SignificanceTest);
        assert_eq!(sig.min_group_size(), 2);
    }

    #[test]
    fn explicit_group_size_overrides_default() {
        let config = SplitSearchConfig::new(SplitCriterion::SumOfSquaresError).with_min_group_size(3);
        assert_eq!(config.min_group_size(), 3);
    }

    #[test]
    fn zero_group_size_rejected() {
        let err = SplitSearchConfig::new(SplitCriterion::SumOfSquaresError)
            .with_min_group_size(0)
            .evaluate(&car_prices())
            .unwrap_err();
        assert_eq!(
            err,
            SplitError::InvalidMinGroupSize {
                min_group_size: 0,
                minimum: 1,
            }
        );
    }

    #[test]
    fn significance_needs_two_per_group() {
        let err = SplitSearchConfig::new(SplitCriterion::SignificanceTest)
            .with_min_group_size(1)
            .evaluate(&car_prices())
            .unwrap_err();
        assert!(matches!(err, SplitError::InvalidMinGroupSize { minimum: 2, .. }));
    }

    #[test]
    fn zero_resamples_rejected() {
        let err = SplitSearchConfig::new(SplitCriterion::SignificanceTest)
            .with_test(TestMethod::Permutation { n_resamples: 0, seed: 1 })
            .evaluate(&car_prices())
            .unwrap_err();
        assert_eq!(err, SplitError::InvalidResampleCount { n_resamples: 0 });
    }

    #[test]
    fn zero_resamples_ignored_for_sse() {
        let outcome = SplitSearchConfig::new(SplitCriterion::SumOfSquaresError)
            .with_test(TestMethod::Permutation { n_resamples: 0, seed: 1 })
            .evaluate(&car_prices())
            .unwrap();
        assert_eq!(outcome.threshold, 15_000.0);
    }

    #[test]
    fn evaluate_splits_shorthand() {
        let outcome = evaluate_splits(&car_prices(), SplitCriterion::SumOfSquaresError).unwrap();
        assert_eq!(outcome.threshold, 15_000.0);
        assert!((outcome.score.value() - 625_000.0).abs() < 1e-6);
        assert_eq!(outcome.criterion, SplitCriterion::SumOfSquaresError);
    }

    #[test]
    fn significance_on_car_prices() {
        // With 4 observations and groups of 2, only threshold 15000 is admissible.
        let outcome = evaluate_splits(&car_prices(), SplitCriterion::SignificanceTest).unwrap();
        assert_eq!(outcome.n_candidates, 1);
        assert_eq!(outcome.threshold, 15_000.0);
        assert!(outcome.score.value() > 0.0 && outcome.score.value() < 1.0);
    }

    #[test]
    fn custom_test_is_used() {
        struct AlwaysHalf;
        impl SignificanceTest for AlwaysHalf {
            fn p_value(&self, _groups: &SplitGroups<'_>) -> f64 {
                0.5
            }
        }
        let obs: Vec<Observation> = (0..6).map(|i| Observation::new(i as f64, i as f64)).collect();
        let outcome = SplitSearchConfig::new(SplitCriterion::SignificanceTest)
            .evaluate_with(&obs, &AlwaysHalf)
            .unwrap();
        assert_eq!(outcome.score.value(), 0.5);
        // All tied: smallest admissible threshold wins.
        assert_eq!(outcome.threshold, 1.0);
    }

    #[test]
    fn nan_p_values_never_win() {
        struct NanOnEven;
        impl SignificanceTest for NanOnEven {
            fn p_value(&self, groups: &SplitGroups<'_>) -> f64 {
                let index = groups.candidate_index();
                if index % 2 == 0 {
                    f64::NAN
                } else {
                    1.0 / (1.0 + index as f64)
                }
            }
        }
        let obs: Vec<Observation> = (0..8).map(|i| Observation::new(i as f64, i as f64)).collect();
        for parallel in [false, true] {
            let outcome = SplitSearchConfig::new(SplitCriterion::SignificanceTest)
                .with_parallel(parallel)
                .evaluate_with(&obs, &NanOnEven)
                .unwrap();
            // Candidates 1 and 3 score 0.5 and 0.25; candidate 3 splits after 4.0.
            assert_eq!(outcome.score.value(), 0.25, "parallel = {parallel}");
            assert_eq!(outcome.threshold, 4.0, "parallel = {parallel}");
        }
    }

    #[test]
    fn dyn_test_is_accepted() {
        let test: &dyn SignificanceTest = &ConditionalInferenceTest;
        let obs: Vec<Observation> = (0..6).map(|i| Observation::new(i as f64, i as f64)).collect();
        let scan = SplitSearchConfig::new(SplitCriterion::SignificanceTest)
            .scan_with(&obs, test)
            .unwrap();
        assert_eq!(scan.n_candidates(), 3);
    }
}
