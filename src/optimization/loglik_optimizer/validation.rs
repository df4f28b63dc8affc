//! Validation helpers for objective values and gradients.
//!
//! - [`validate_grad`]: dimension and finiteness of a gradient.
//! - [`validate_value`]: finiteness of an objective value.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::Grad,
};

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if `grad.len() != dim`.
/// - [`OptError::InvalidGradient`] for the first NaN/±inf entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidGradient {
            index,
            value: grad[index],
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

/// Validate that an objective value is finite.
///
/// # Errors
/// [`OptError::NonFiniteCost`] for NaN/±inf.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Check dimension and finiteness handling of `validate_grad`.
    //
    // Given
    // -----
    // - A finite gradient, a short one and one holding NaN at index 1.
    //
    // Expect
    // ------
    // - Ok, `GradientDimMismatch`, `InvalidGradient { index: 1, .. }`.
    fn validate_grad_reports_first_problem() {
        assert!(validate_grad(&array![1.0, -2.0], 2).is_ok());
        assert_eq!(
            validate_grad(&array![1.0], 2),
            Err(OptError::GradientDimMismatch { expected: 2, found: 1 })
        );
        match validate_grad(&array![0.0, f64::NAN, f64::INFINITY], 3) {
            Err(OptError::InvalidGradient { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidGradient, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify `validate_value` accepts negative finite values only.
    //
    // Given
    // -----
    // - -1e6, NaN and -inf.
    //
    // Expect
    // ------
    // - Ok for -1e6, `NonFiniteCost` otherwise.
    fn validate_value_rejects_non_finite() {
        assert!(validate_value(-1e6).is_ok());
        assert!(matches!(validate_value(f64::NAN), Err(OptError::NonFiniteCost { .. })));
        assert_eq!(
            validate_value(f64::NEG_INFINITY),
            Err(OptError::NonFiniteCost { value: f64::NEG_INFINITY })
        );
    }
}
