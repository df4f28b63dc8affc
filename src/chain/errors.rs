//! Errors for the decay-chain model (case constants, options, count data,
//! parameter vectors).
//!
//! This module defines a model error type, [`ChainError`], and a parameter
//! error type, [`ParamError`]. Both implement `Display`/`Error`; with the
//! `python-bindings` feature they also convert to `PyErr`.
//!
//! ## Conventions
//! - **Generations are 1-based in messages** (parent = 1) and 0-based in
//!   indices, matching [`Generation::index`](crate::chain::core::case::Generation::index).
//! - Times are milliseconds; rate shifts are 1/s.
//! - Domain degeneracies met during evaluation (near-equal lifetimes,
//!   out-of-window times) are **not** errors. These types only describe
//!   malformed configuration detected once at session setup.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};

/// Result alias for case/options/data operations that may produce [`ChainError`].
pub type ChainResult<T> = Result<T, ChainError>;

/// Result alias for parameter-vector construction and validation.
pub type ParamResult<T> = Result<T, ParamError>;

/// Unified error type for case constants, options and count data.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainError {
    // ---- Case constants ----
    /// Nominal lifetime must be finite and > 0.
    NonPositiveLifetime { generation: usize, value: f64 },

    /// Half-life (or its uncertainty) is not usable.
    InvalidHalfLife { generation: usize, value: f64, reason: &'static str },

    /// A cycle timing value is non-finite or negative.
    InvalidTiming { name: &'static str, value: f64, reason: &'static str },

    /// Timings must satisfy 0 < capture period ≤ background start ≤ cycle length.
    TimingOrder { capture_period: f64, background_start: f64, cycle_length: f64 },

    /// Capture window holds more injections than the evaluator accepts.
    TooManyInjections { count: usize, max: usize },

    // ---- Case table ----
    /// No case with this code in the table.
    UnknownCase { code: String },

    /// Two records share the same code.
    DuplicateCase { code: String },

    /// Case file could not be read.
    CaseFileRead { path: String, reason: String },

    /// Case document is not valid JSON for a case table.
    CaseFileParse { reason: String },

    // ---- Options ----
    /// Cache tolerance must be finite and ≥ 0.
    InvalidTolerance { value: f64, reason: &'static str },

    // ---- Count data ----
    /// Data set is empty.
    EmptyData,

    /// Times and counts must have equal lengths.
    DataLengthMismatch { times: usize, counts: usize },

    /// A time or count is NaN/±inf.
    NonFiniteData { index: usize, value: f64 },

    /// Counts must be ≥ 0.
    NegativeCount { index: usize, value: f64 },

    /// Bin times must be ≥ 0.
    NegativeTime { index: usize, value: f64 },

    /// Unknown count statistic name.
    UnknownStatistic { name: String },
}

impl std::error::Error for ChainError {}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Case constants ----
            ChainError::NonPositiveLifetime { generation, value } => {
                write!(f, "Lifetime of generation {} is {value}, must be finite and > 0", generation + 1)
            }
            ChainError::InvalidHalfLife { generation, value, reason } => {
                write!(f, "Invalid half-life for generation {}: {value}: {reason}", generation + 1)
            }
            ChainError::InvalidTiming { name, value, reason } => {
                write!(f, "Invalid timing '{name}' = {value}: {reason}")
            }
            ChainError::TimingOrder { capture_period, background_start, cycle_length } => {
                write!(
                    f,
                    "Timings must satisfy 0 < capture period ({capture_period}) <= background start ({background_start}) <= cycle length ({cycle_length})"
                )
            }
            ChainError::TooManyInjections { count, max } => {
                write!(f, "Capture window holds {count} injections, at most {max} are supported")
            }

            // ---- Case table ----
            ChainError::UnknownCase { code } => {
                write!(f, "Unknown case code '{code}'")
            }
            ChainError::DuplicateCase { code } => {
                write!(f, "Case code '{code}' appears more than once")
            }
            ChainError::CaseFileRead { path, reason } => {
                write!(f, "Could not read case file '{path}': {reason}")
            }
            ChainError::CaseFileParse { reason } => {
                write!(f, "Could not parse case table: {reason}")
            }

            // ---- Options ----
            ChainError::InvalidTolerance { value, reason } => {
                write!(f, "Invalid cache tolerance {value}: {reason}")
            }

            // ---- Count data ----
            ChainError::EmptyData => {
                write!(f, "Count data is empty.")
            }
            ChainError::DataLengthMismatch { times, counts } => {
                write!(f, "Data length mismatch: {times} times, {counts} counts")
            }
            ChainError::NonFiniteData { index, value } => {
                write!(f, "Data point at index {index} is non-finite: {value}")
            }
            ChainError::NegativeCount { index, value } => {
                write!(f, "Count at index {index} is negative: {value}")
            }
            ChainError::NegativeTime { index, value } => {
                write!(f, "Bin time at index {index} is negative: {value}")
            }
            ChainError::UnknownStatistic { name } => {
                write!(f, "Unknown count statistic '{name}': valid options are 'Poisson' or 'Neyman'")
            }
        }
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> ChainError {
        ChainError::CaseFileParse { reason: err.to_string() }
    }
}

/// Convert a [`ChainError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<ChainError> for PyErr {
    fn from(err: ChainError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Errors specific to parameter-vector construction and validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Parameter vector must hold exactly one value per named slot.
    LengthMismatch { expected: usize, actual: usize },

    /// Name does not match any parameter slot.
    UnknownParameter { name: String },

    /// Parameter value is NaN/±inf.
    NonFiniteParameter { name: &'static str, value: f64 },

    /// Parameter value outside its physical range.
    OutOfRange { name: &'static str, value: f64, reason: &'static str },

    /// Rate shift drives a modified lifetime to a non-positive or non-finite value.
    NonPositiveModifiedLifetime { name: &'static str, value: f64 },

    // ---- Free-parameter map ----
    /// At least one slot must be free.
    EmptyFreeSet,

    /// A slot was listed twice as free.
    DuplicateFreeParameter { name: &'static str },

    /// Optimizer vector length does not match the number of free slots.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Optimizer vector must have finite values.
    InvalidThetaInput { index: usize, value: f64 },
}

impl std::error::Error for ParamError {}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::LengthMismatch { expected, actual } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, actual {actual}")
            }
            ParamError::UnknownParameter { name } => {
                write!(f, "Unknown parameter name '{name}'")
            }
            ParamError::NonFiniteParameter { name, value } => {
                write!(f, "Parameter '{name}' is non-finite: {value}")
            }
            ParamError::OutOfRange { name, value, reason } => {
                write!(f, "Parameter '{name}' = {value} out of range: {reason}")
            }
            ParamError::NonPositiveModifiedLifetime { name, value } => {
                write!(f, "Shift '{name}' yields modified lifetime {value}, must be finite and > 0")
            }
            ParamError::EmptyFreeSet => {
                write!(f, "At least one parameter must be free.")
            }
            ParamError::DuplicateFreeParameter { name } => {
                write!(f, "Parameter '{name}' is listed as free more than once")
            }
            ParamError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            ParamError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }
        }
    }
}

/// Convert a [`ParamError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<ParamError> for PyErr {
    fn from(err: ParamError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
