/// Criterion for scoring a candidate split. Lower scores are better under
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitCriterion {
    /// Combined squared deviation from the group means:
    /// `Σ(left_i - left_mean)² + Σ(right_i - right_mean)²`.
    SumOfSquaresError,
    /// p-value of a two-sample test between left and right responses.
    SignificanceTest,
}

impl SplitCriterion {
    /// Minimum group size used when none is configured.
    #[must_use]
    pub fn default_min_group_size(self) -> usize {
        match self {
            SplitCriterion::SumOfSquaresError => 1,
            SplitCriterion::SignificanceTest => 2,
        }
    }

    /// Smallest minimum group size the criterion accepts.
    ///
    /// Two-sample tests need a sample variance in each group, hence 2.
    #[must_use]
    pub fn smallest_min_group_size(self) -> usize {
        self.default_min_group_size()
    }
}

impl std::fmt::Display for SplitCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitCriterion::SumOfSquaresError => f.write_str("sum-of-squares-error"),
            SplitCriterion::SignificanceTest => f.write_str("significance-test"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SplitCriterion;

    #[test]
    fn default_group_sizes() {
        assert_eq!(SplitCriterion::SumOfSquaresError.default_min_group_size(), 1);
        assert_eq!(SplitCriterion::SignificanceTest.default_min_group_size(), 2);
    }

    #[test]
    fn display_names() {
        assert_eq!(SplitCriterion::SumOfSquaresError.to_string(), "sum-of-squares-error");
        assert_eq!(SplitCriterion::SignificanceTest.to_string(), "significance-test");
    }
}
