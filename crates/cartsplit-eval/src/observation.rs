use std::fmt;

use crate::error::{ObservationField, SplitError};

/// A single (predictor, response) pair.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    /// Value of the split variable.
    pub predictor: f64,
    /// Value of the response being predicted.
    pub response: f64,
}

impl Observation {
    /// Create a new observation.
    #[must_use]
    pub fn new(predictor: f64, response: f64) -> Self {
        Self {
            predictor,
            response,
        }
    }
}

impl From<(f64, f64)> for Observation {
    fn from((predictor, response): (f64, f64)) -> Self {
        Self::new(predictor, response)
    }
}

/// Criterion-agnostic split score: a sum of squared errors or a p-value.
///
/// Lower is always better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Score(f64);

impl Score {
    /// Create a new score.
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw score value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Reject NaN or infinite values, reporting the first offender.
pub(crate) fn validate_finite(observations: &[Observation]) -> Result<(), SplitError> {
    for (index, obs) in observations.iter().enumerate() {
        if !obs.predictor.is_finite() {
            return Err(SplitError::NonFiniteValue {
                index,
                field: ObservationField::Predictor,
            });
        }
        if !obs.response.is_finite() {
            return Err(SplitError::NonFiniteValue {
                index,
                field: ObservationField::Response,
            });
        }
    }
    Ok(())
}
