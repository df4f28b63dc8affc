//! Validation helpers — reusable checks for case constants, options, count
//! data and optimizer vectors.
//!
//! Purpose
//! -------
//! Centralize the small checks that the chain stack runs once at session
//! setup, so constructors can fail fast with structured errors and the hot
//! evaluation path can stay check-free.
//!
//! Key behaviors
//! -------------
//! - Validate nominal lifetimes, half-lives and cycle timings of a case.
//! - Bound the number of capture intervals per cycle by [`MAX_INJECTIONS`].
//! - Validate the cache tolerance and binned count data.
//! - Validate optimizer vectors θ (length and finiteness).
//!
//! Invariants & assumptions
//! ------------------------
//! - Timings obey `0 < capture period ≤ background start ≤ cycle length`.
//! - Tolerances are finite and non-negative; zero means "rebuild on any change".
//!
//! Conventions
//! -----------
//! - Generations are passed 0-based; error messages print them 1-based.
//! - No I/O, no logging; helpers only inspect numbers and lengths.
//!
//! Testing notes
//! -------------
//! - Unit tests cover each helper on valid inputs and on the boundary cases
//!   (zeros, NaNs, reversed timings, length off-by-one).
use crate::chain::errors::{ChainError, ChainResult, ParamError, ParamResult};
use ndarray::ArrayView1;

/// Upper bound on capture intervals per cycle.
///
/// The feeding-population evaluator steps through every started interval,
/// so this bounds the per-call cost.
pub const MAX_INJECTIONS: usize = 4096;

/// Validate a nominal lifetime (milliseconds).
///
/// # Errors
/// [`ChainError::NonPositiveLifetime`] if `value` is NaN, ±∞ or ≤ 0.
pub fn validate_lifetime(generation: usize, value: f64) -> ChainResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ChainError::NonPositiveLifetime { generation, value });
    }
    Ok(value)
}

/// Validate a half-life and its uncertainty (milliseconds).
///
/// # Errors
/// [`ChainError::InvalidHalfLife`] when the half-life is not finite and > 0,
/// or the uncertainty is not finite and ≥ 0.
pub fn validate_half_life(generation: usize, value: f64, uncertainty: f64) -> ChainResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ChainError::InvalidHalfLife {
            generation,
            value,
            reason: "Half-life must be finite and strictly positive.",
        });
    }
    if !uncertainty.is_finite() || uncertainty < 0.0 {
        return Err(ChainError::InvalidHalfLife {
            generation,
            value: uncertainty,
            reason: "Half-life uncertainty must be finite and non-negative.",
        });
    }
    Ok(())
}

/// Validate the three cycle timings.
///
/// Checks
/// ------
/// - each value is finite,
/// - `0 < capture_period ≤ background_start ≤ cycle_length`.
///
/// # Errors
/// - [`ChainError::InvalidTiming`] for a non-finite value.
/// - [`ChainError::TimingOrder`] when the ordering fails.
pub fn validate_timings(
    capture_period: f64, background_start: f64, cycle_length: f64,
) -> ChainResult<()> {
    for (name, value) in [
        ("capture_period", capture_period),
        ("background_start", background_start),
        ("cycle_length", cycle_length),
    ] {
        if !value.is_finite() {
            return Err(ChainError::InvalidTiming {
                name,
                value,
                reason: "Timings must be finite.",
            });
        }
    }
    if !(0.0 < capture_period
        && capture_period <= background_start
        && background_start <= cycle_length)
    {
        return Err(ChainError::TimingOrder { capture_period, background_start, cycle_length });
    }
    Ok(())
}

/// Validate the number of capture intervals in one cycle.
///
/// # Errors
/// [`ChainError::TooManyInjections`] if `count > MAX_INJECTIONS`.
pub fn validate_injection_count(count: usize) -> ChainResult<usize> {
    if count > MAX_INJECTIONS {
        return Err(ChainError::TooManyInjections { count, max: MAX_INJECTIONS });
    }
    Ok(count)
}

/// Validate the absolute per-element cache tolerance.
///
/// # Errors
/// [`ChainError::InvalidTolerance`] if `tol` is non-finite or negative.
pub fn validate_tolerance(tol: f64) -> ChainResult<f64> {
    if !tol.is_finite() {
        return Err(ChainError::InvalidTolerance { value: tol, reason: "Tolerance must be finite." });
    }
    if tol < 0.0 {
        return Err(ChainError::InvalidTolerance {
            value: tol,
            reason: "Tolerance must be non-negative.",
        });
    }
    Ok(tol)
}

/// Validate binned count data.
///
/// Checks
/// ------
/// - non-empty and equal lengths,
/// - every time finite and ≥ 0,
/// - every count finite and ≥ 0.
///
/// # Errors
/// [`ChainError::EmptyData`], [`ChainError::DataLengthMismatch`],
/// [`ChainError::NonFiniteData`], [`ChainError::NegativeTime`] or
/// [`ChainError::NegativeCount`] for the first offending entry.
pub fn validate_counts(times: ArrayView1<f64>, counts: ArrayView1<f64>) -> ChainResult<()> {
    if times.is_empty() {
        return Err(ChainError::EmptyData);
    }
    if times.len() != counts.len() {
        return Err(ChainError::DataLengthMismatch { times: times.len(), counts: counts.len() });
    }
    for (index, (&t, &n)) in times.iter().zip(counts.iter()).enumerate() {
        if !t.is_finite() {
            return Err(ChainError::NonFiniteData { index, value: t });
        }
        if !n.is_finite() {
            return Err(ChainError::NonFiniteData { index, value: n });
        }
        if t < 0.0 {
            return Err(ChainError::NegativeTime { index, value: t });
        }
        if n < 0.0 {
            return Err(ChainError::NegativeCount { index, value: n });
        }
    }
    Ok(())
}

/// Validate an optimizer vector θ against the expected length.
///
/// # Errors
/// - [`ParamError::ThetaLengthMismatch`] if `theta.len() != expected`.
/// - [`ParamError::InvalidThetaInput`] for the first non-finite entry.
pub fn validate_theta(theta: ArrayView1<f64>, expected: usize) -> ParamResult<()> {
    if theta.len() != expected {
        return Err(ParamError::ThetaLengthMismatch { expected, actual: theta.len() });
    }
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(ParamError::InvalidThetaInput { index, value });
        }
    }
    Ok(())
}
