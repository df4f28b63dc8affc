//! chain — analytic population model of a three-generation decay chain in a
//! periodically reloaded ion trap.
//!
//! Purpose
//! -------
//! Evaluate, for any time of a measurement cycle, how many ions of each
//! chain member are trapped or untrapped, and turn those populations into
//! the expected detector counts a fit compares with data.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds case constants, the named parameter vector, the
//!   regularized Sigma series, derived coefficients, the steady-state
//!   initial-value solver, the time-domain evaluator and the
//!   parameter-dependent cache.
//! - [`models`] aggregates populations into observables
//!   ([`TrapChainModel`]) and exposes them as a log-likelihood
//!   ([`ChainFit`]).
//! - [`errors`] defines [`ChainError`] and [`ParamError`].
//!
//! Invariants & assumptions
//! ------------------------
//! - One model owns one cache for one case; it is reused across optimizer
//!   iterations and rebuilt only when the parameter vector changes.
//! - Every population is periodic over the cycle and non-negative for
//!   physical parameters.
//!
//! Conventions
//! -----------
//! - Times in milliseconds. Parameter slots are addressed by
//!   [`Par`], never by position.
//!
//! Downstream usage
//! ----------------
//! - Rust callers build a [`TrapChainModel`] from a [`CaseTable`] entry and
//!   call `observable`/`rate`; fit drivers wrap it in a [`ChainFit`].
//! - The Python `ChainModel` class wraps [`TrapChainModel`].

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    CaseConstants, CaseRecord, CaseTable, ChainOptions, ChainParams, FreeParams, Generation,
    HalfLife, Par, Species,
};

pub use self::errors::{ChainError, ChainResult, ParamError, ParamResult};

pub use self::models::{
    BinnedCounts, ChainFit, Component, ComponentRates, CountStatistic, GoodnessOfFit,
    TrapChainModel,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_decaychain::chain::prelude::*;
//
// to import the main decay-chain surface in a single line.

pub mod prelude {
    pub use super::{
        BinnedCounts, CaseConstants, CaseRecord, CaseTable, ChainError, ChainFit, ChainOptions,
        ChainParams, ChainResult, Component, ComponentRates, CountStatistic, FreeParams,
        Generation, GoodnessOfFit, HalfLife, Par, ParamError, ParamResult, Species,
        TrapChainModel,
    };
}
