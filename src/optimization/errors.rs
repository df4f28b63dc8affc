//! Errors for the optimizer-facing callback surface.
//!
//! [`OptError`] is what a [`LogLikelihood`](crate::optimization::loglik_optimizer::LogLikelihood)
//! implementation returns and what the argmin adapter hands back after
//! crossing the `argmin::core::Error` boundary. Model errors
//! ([`ChainError`], [`ParamError`]) convert into it so `?` works in
//! objective code.
use argmin::core::Error;

use crate::chain::errors::{ChainError, ParamError};

/// Crate-wide result alias for objective and adapter operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// No analytic gradient; finite differences are used instead.
    GradientNotImplemented,

    /// Gradient length does not match the free-parameter count.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient entries must be finite.
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- Cost function ----
    /// Objective evaluated to NaN/±inf.
    NonFiniteCost { value: f64 },

    /// Predicted counts must be positive under Poisson statistics.
    InvalidPrediction { index: usize, value: f64 },

    // ---- Argmin ----
    /// Any other backend error, by message.
    BackendError { text: String },

    // ---- Parameter errors ----
    /// Optimizer vector length does not match the free-parameter count.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Optimizer vector entries must be finite.
    InvalidThetaInput { index: usize, value: f64 },

    /// Expanded parameter vector violates its physical range.
    InvalidParameterVector { text: String },

    // ---- Model errors ----
    /// Case, options or data rejected by the model layer.
    InvalidModelInput { text: String },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => write!(f, "Analytic gradient not implemented"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => write!(f, "Non-finite objective value: {value}"),
            OptError::InvalidPrediction { index, value } => {
                write!(f, "Predicted count at bin {index} is {value}; Poisson statistics need > 0")
            }

            // ---- Argmin ----
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Parameter errors ----
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }
            OptError::InvalidParameterVector { text } => {
                write!(f, "Invalid parameter vector: {text}")
            }

            // ---- Model errors ----
            OptError::InvalidModelInput { text } => write!(f, "Invalid model input: {text}"),
        }
    }
}

impl From<Error> for OptError {
    /// Recover an [`OptError`] that crossed the argmin boundary; anything
    /// else is kept by message.
    fn from(err: Error) -> Self {
        match err.downcast::<OptError>() {
            Ok(opt_err) => opt_err,
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<ParamError> for OptError {
    fn from(err: ParamError) -> Self {
        match err {
            ParamError::ThetaLengthMismatch { expected, actual } => {
                OptError::ThetaLengthMismatch { expected, actual }
            }
            ParamError::InvalidThetaInput { index, value } => {
                OptError::InvalidThetaInput { index, value }
            }
            other => OptError::InvalidParameterVector { text: other.to_string() },
        }
    }
}

impl From<ChainError> for OptError {
    fn from(err: ChainError) -> Self {
        OptError::InvalidModelInput { text: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Check that an OptError survives a round trip through argmin's error.
    //
    // Given
    // -----
    // - An `InvalidPrediction` converted into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - Converting back yields the identical variant.
    fn opt_error_round_trips_through_argmin_error() {
        let original = OptError::InvalidPrediction { index: 3, value: -0.5 };
        let wrapped: Error = original.clone().into();
        assert_eq!(OptError::from(wrapped), original);
    }

    #[test]
    // Purpose
    // -------
    // Verify that foreign errors keep their message as a backend error.
    //
    // Given
    // -----
    // - An `ArgminError::NotImplemented` and a plain message error.
    //
    // Expect
    // ------
    // - Both become `BackendError` carrying their display text.
    fn foreign_errors_become_backend_errors() {
        let argmin_err = argmin::core::ArgminError::NotImplemented { text: "grad".to_string() };
        let text = argmin_err.to_string();
        let err: Error = argmin_err.into();
        assert_eq!(OptError::from(err), OptError::BackendError { text });

        let err = Error::msg("solver exploded");
        assert_eq!(OptError::from(err), OptError::BackendError { text: "solver exploded".into() });
    }

    #[test]
    // Purpose
    // -------
    // Check the model-error conversions.
    //
    // Given
    // -----
    // - A theta length error, a range error and an empty-data error.
    //
    // Expect
    // ------
    // - Theta errors keep their structured fields.
    // - Other errors carry their display text.
    fn model_errors_convert() {
        assert_eq!(
            OptError::from(ParamError::ThetaLengthMismatch { expected: 2, actual: 3 }),
            OptError::ThetaLengthMismatch { expected: 2, actual: 3 }
        );
        let range = ParamError::OutOfRange { name: "p", value: 1.5, reason: "must lie in [0, 1]" };
        assert_eq!(
            OptError::from(range.clone()),
            OptError::InvalidParameterVector { text: range.to_string() }
        );
        assert_eq!(
            OptError::from(ChainError::EmptyData),
            OptError::InvalidModelInput { text: ChainError::EmptyData.to_string() }
        );
    }
}
