//! core — case constants, parameters, coefficients and the cached
//! time-domain evaluator of the decay-chain trap model.
//!
//! Purpose
//! -------
//! Collect the numerical building blocks of the model: validated case
//! constants and case tables, the named parameter vector, the regularized
//! Sigma series, the derived coefficient set, the capture-window terms, the
//! steady-state initial values, the time-domain evaluator and the
//! parameter-dependent cache that ties them together.
//!
//! Key behaviors
//! -------------
//! - [`CaseConstants`] / [`CaseTable`] describe the measurement; they are
//!   validated once and immutable afterwards.
//! - [`ChainParams`] addresses the 20 parameter slots by [`Par`], never by
//!   raw position; [`FreeParams`] maps optimizer vectors onto it.
//! - [`ParameterCache::refresh`] rebuilds a [`DerivedState`] only when the
//!   vector changes; [`PopulationEvaluator`] reads populations from it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Derived state is a pure function of (parameters, case, options).
//! - Domain degeneracies (out-of-window times, coinciding lifetimes) are
//!   absorbed by zeros and the [`REGULARIZATION`] constant, not errors.
//! - Malformed configuration (wrong-length vectors, invalid timings) fails
//!   fast with [`ChainError`](crate::chain::errors::ChainError) or
//!   [`ParamError`](crate::chain::errors::ParamError).
//!
//! Conventions
//! -----------
//! - Times in milliseconds, rate shifts in 1/s, production in ions/ms.
//! - Generation-indexed arrays use [`Generation::index`].
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; ODE cross-checks and property
//!   tests live under `tests/`.

pub mod cache;
pub mod capture;
pub mod case;
pub mod coefficients;
pub mod init;
pub mod options;
pub mod params;
pub mod populations;
pub mod sigma;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::cache::{DerivedState, ParameterCache};
pub use self::capture::CaptureTerms;
pub use self::case::{CaseConstants, CaseRecord, CaseTable, Generation, HalfLife};
pub use self::coefficients::ChainCoefficients;
pub use self::init::InitialValues;
pub use self::options::{ChainOptions, DEFAULT_CACHE_TOLERANCE};
pub use self::params::{ChainParams, FreeParams, Par};
pub use self::populations::{PopulationEvaluator, Species};
pub use self::sigma::{REGULARIZATION, modified_lifetime, sigma_t, sigma_w, sigma_z};
pub use self::validation::{MAX_INJECTIONS, validate_counts, validate_theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_decaychain::chain::core::prelude::*;
//
// to import the main core surface in a single line.

pub mod prelude {
    pub use super::cache::{DerivedState, ParameterCache};
    pub use super::case::{CaseConstants, CaseRecord, CaseTable, Generation, HalfLife};
    pub use super::options::{ChainOptions, DEFAULT_CACHE_TOLERANCE};
    pub use super::params::{ChainParams, FreeParams, Par};
    pub use super::populations::{PopulationEvaluator, Species};
    pub use super::sigma::REGULARIZATION;
}
