//! Error types
//!
//! Validation errors are returned to the caller; everything else is caught by
//! the orchestrator and turned into an empty result.

/// Estimator-level failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("shape mismatch: {rows} rows but {targets} targets")]
    ShapeMismatch { rows: usize, targets: usize },
    #[error("ragged input: expected {expected} columns, found {found}")]
    RaggedRows { expected: usize, found: usize },
    #[error("input contains NaN or infinite values")]
    NonFiniteInput,
    #[error("estimator has not been fitted")]
    NotFitted,
    #[error("feature count mismatch: fitted on {expected}, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
}

/// Engine-level failures
#[derive(Debug, thiserror::Error)]
pub enum RecommenderError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0} model is not trained")]
    NotTrained(&'static str),
    #[error("feature table is empty")]
    EmptyFeatureTable,
    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RecommenderError::NotTrained("priority").to_string(),
            "priority model is not trained"
        );
        let wrapped: RecommenderError = EstimatorError::ShapeMismatch { rows: 3, targets: 2 }.into();
        assert_eq!(wrapped.to_string(), "shape mismatch: 3 rows but 2 targets");
    }
}
