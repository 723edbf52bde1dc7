//! Domain types for cartsplit-io.

use cartsplit_eval::Observation;

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observations selected from two columns of a CSV file.
///
/// Produced by [`ObservationReader`](crate::ObservationReader).
/// Observations keep file row order.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    predictor_name: String,
    response_name: String,
    observations: Vec<Observation>,
    n_skipped: usize,
}

impl ObservationSet {
    /// Create a new observation set.
    pub(crate) fn new(
        predictor_name: String,
        response_name: String,
        observations: Vec<Observation>,
        n_skipped: usize,
    ) -> Self {
        Self {
            predictor_name,
            response_name,
            observations,
            n_skipped,
        }
    }

    /// Return the predictor column name.
    #[must_use]
    pub fn predictor_name(&self) -> &str {
        &self.predictor_name
    }

    /// Return the response column name.
    #[must_use]
    pub fn response_name(&self) -> &str {
        &self.response_name
    }

    /// Return the observations in file order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Return the number of observations.
    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.observations.len()
    }

    /// Return the number of rows dropped for missing values.
    #[must_use]
    pub fn n_skipped(&self) -> usize {
        self.n_skipped
    }
}
