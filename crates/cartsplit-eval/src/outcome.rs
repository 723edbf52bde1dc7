//! Result types for split evaluation.

use crate::criterion::SplitCriterion;
use crate::observation::Score;

/// Score and group summary of one candidate threshold.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CandidateScore {
    /// Threshold: observations with predictor ≤ threshold go left.
    pub threshold: f64,
    /// Criterion score (lower is better).
    pub score: Score,
    /// Mean response of the left group.
    pub left_mean: f64,
    /// Mean response of the right group.
    pub right_mean: f64,
    /// Number of observations in the left group.
    pub n_left: usize,
    /// Number of observations in the right group.
    pub n_right: usize,
}

impl CandidateScore {
    /// Return `true` if `self` should win over `other`: strictly lower
    /// score, or an equal score at a smaller threshold. NaN scores rank
    /// after every number.
    pub(crate) fn beats(&self, other: &CandidateScore) -> bool {
        let (mine, theirs) = (self.rank(), other.rank());
        mine < theirs || (mine == theirs && self.threshold < other.threshold)
    }

    fn rank(&self) -> f64 {
        let score = self.score.value();
        if score.is_nan() { f64::INFINITY } else { score }
    }
}

/// The best split found by a search.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SplitOutcome {
    /// Criterion the split was chosen under.
    pub criterion: SplitCriterion,
    /// Chosen threshold.
    pub threshold: f64,
    /// Mean response of the left group.
    pub left_mean: f64,
    /// Mean response of the right group.
    pub right_mean: f64,
    /// Score at the chosen threshold.
    pub score: Score,
    /// Number of observations in the left group.
    pub n_left: usize,
    /// Number of observations in the right group.
    pub n_right: usize,
    /// Number of admissible candidate thresholds that were scored.
    pub n_candidates: usize,
}

impl SplitOutcome {
    pub(crate) fn from_candidate(
        criterion: SplitCriterion,
        best: CandidateScore,
        n_candidates: usize,
    ) -> Self {
        Self {
            criterion,
            threshold: best.threshold,
            left_mean: best.left_mean,
            right_mean: best.right_mean,
            score: best.score,
            n_left: best.n_left,
            n_right: best.n_right,
            n_candidates,
        }
    }

    /// Predicted response for a predictor value under this one-split model.
    #[must_use]
    pub fn predict(&self, predictor: f64) -> f64 {
        if predictor <= self.threshold {
            self.left_mean
        } else {
            self.right_mean
        }
    }
}
