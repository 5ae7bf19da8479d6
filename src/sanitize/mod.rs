use crate::error::EstimatorError;

/// True if any value is NaN or infinite
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// `value` if finite, otherwise `default`
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// Non-empty, rectangular and finite; returns the column count
pub fn validate_matrix(x: &[Vec<f64>]) -> Result<usize, EstimatorError> {
    let first = x.first().ok_or(EstimatorError::EmptyTrainingSet)?;
    let d = first.len();

    for row in x {
        if row.len() != d {
            return Err(EstimatorError::RaggedRows {
                expected: d,
                found: row.len(),
            });
        }
        if has_invalid_values(row) {
            return Err(EstimatorError::NonFiniteInput);
        }
    }

    Ok(d)
}

/// One finite target per row
pub fn validate_targets(rows: usize, targets: &[f64]) -> Result<(), EstimatorError> {
    if rows != targets.len() {
        return Err(EstimatorError::ShapeMismatch {
            rows,
            targets: targets.len(),
        });
    }
    if has_invalid_values(targets) {
        return Err(EstimatorError::NonFiniteInput);
    }
    Ok(())
}
