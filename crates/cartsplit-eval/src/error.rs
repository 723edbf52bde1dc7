/// Errors from split evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplitError {
    /// Returned when the dataset is too small or its predictor lacks variation.
    #[error(
        "insufficient data: {n_observations} observations with {n_distinct} distinct predictor values, need at least {min_observations} observations and 2 distinct values"
    )]
    InsufficientData {
        /// Number of observations supplied.
        n_observations: usize,
        /// Number of distinct predictor values among them.
        n_distinct: usize,
        /// Minimum observation count (`2 * min_group_size`).
        min_observations: usize,
    },

    /// Returned when no candidate threshold leaves `min_group_size`
    /// observations on both sides.
    #[error("no candidate threshold leaves at least {min_group_size} observations on each side ({n_observations} observations)")]
    DegenerateGroup {
        /// The minimum group size in effect.
        min_group_size: usize,
        /// Number of observations supplied.
        n_observations: usize,
    },

    /// Returned when `min_group_size` is below what the criterion supports.
    #[error("min_group_size must be at least {minimum} for this criterion, got {min_group_size}")]
    InvalidMinGroupSize {
        /// The invalid value provided.
        min_group_size: usize,
        /// The smallest value accepted.
        minimum: usize,
    },

    /// Returned when a permutation test is configured with zero resamples.
    #[error("permutation test needs at least 1 resample, got {n_resamples}")]
    InvalidResampleCount {
        /// The invalid resample count.
        n_resamples: usize,
    },

    /// Returned when a predictor or response value is NaN or infinite.
    #[error("non-finite {field} value at observation {index}")]
    NonFiniteValue {
        /// Zero-based index of the offending observation (input order).
        index: usize,
        /// Which half of the observation was non-finite.
        field: ObservationField,
    },
}

impl SplitError {
    /// Return `true` for the errors that mean "this predictor offers no
    /// usable split", as opposed to a misconfiguration or bad input.
    ///
    /// A tree builder would move on to the next predictor (or stop growing
    /// the node) on these.
    #[must_use]
    pub fn is_no_usable_split(&self) -> bool {
        matches!(
            self,
            SplitError::InsufficientData { .. } | SplitError::DegenerateGroup { .. }
        )
    }
}

/// The two halves of an observation, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationField {
    /// The predictor (split variable).
    Predictor,
    /// The response.
    Response,
}

impl std::fmt::Display for ObservationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservationField::Predictor => f.write_str("predictor"),
            ObservationField::Response => f.write_str("response"),
        }
    }
}
