//! Single-variable regression split search.
//!
//! Scores every admissible threshold of one numeric predictor either by the
//! combined sum of squared errors of the two groups or by the p-value of a
//! two-sample significance test, and returns the best split. Significance
//! tests are pluggable through [`SignificanceTest`]; Welch's t-test, an
//! asymptotic conditional-inference test and a seeded permutation test are
//! built in.

mod config;
mod criterion;
mod error;
mod group;
mod observation;
mod outcome;
mod scan;
mod significance;
mod special;

pub use config::{SplitSearchConfig, evaluate_splits};
pub use criterion::SplitCriterion;
pub use error::{ObservationField, SplitError};
pub use group::{GroupStats, SplitGroups};
pub use observation::{Observation, Score};
pub use outcome::{CandidateScore, SplitOutcome};
pub use scan::{Candidates, SplitScan};
pub use significance::{
    ConditionalInferenceTest, PermutationTest, SignificanceTest, TestMethod, WelchTTest,
};
