//! Chain options — configuration of the parameter-dependent cache.
//!
//! Purpose
//! -------
//! Collect the knobs that shape how a parameter vector becomes derived state:
//! the change-detection tolerance of the cache and the option to tie the
//! trapped rate shift of the third generation to the second.
//!
//! Key behaviors
//! -------------
//! - [`ChainOptions::new`] validates the tolerance; `Default` uses
//!   [`DEFAULT_CACHE_TOLERANCE`] and no tying.
//! - [`ChainOptions::effective`] applies the tying rule to an incoming
//!   parameter vector before anything is derived from it.
//!
//! Invariants & assumptions
//! ------------------------
//! - The tolerance is finite and ≥ 0 once constructed.
//! - Options are fixed for the lifetime of the cache that owns them.
//!
//! Conventions
//! -----------
//! - The tolerance is absolute and applies to every slot alike.
//!
//! Testing notes
//! -------------
//! - Unit tests check defaults, validation and the tying rule.
use crate::chain::{
    core::{params::ChainParams, validation::validate_tolerance},
    errors::ChainResult,
};

/// Default absolute per-slot change tolerance of the cache.
///
/// Sits below the ~1.5e-8 steps used by finite-difference gradients, so
/// every finite-difference step triggers a rebuild.
pub const DEFAULT_CACHE_TOLERANCE: f64 = 1e-9;

/// Cache configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainOptions {
    tolerance: f64,
    tie_trapped_shift: bool,
}

impl ChainOptions {
    /// # Errors
    /// [`ChainError::InvalidTolerance`](crate::chain::errors::ChainError::InvalidTolerance)
    /// if `tolerance` is non-finite or negative.
    pub fn new(tolerance: f64, tie_trapped_shift: bool) -> ChainResult<Self> {
        let tolerance = validate_tolerance(tolerance)?;
        Ok(Self { tolerance, tie_trapped_shift })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn tie_trapped_shift(&self) -> bool {
        self.tie_trapped_shift
    }

    /// Parameter vector the derived state is built from.
    pub fn effective(&self, params: &ChainParams) -> ChainParams {
        if self.tie_trapped_shift {
            params.with_tied_trapped_shift()
        } else {
            *params
        }
    }
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self { tolerance: DEFAULT_CACHE_TOLERANCE, tie_trapped_shift: false }
    }
}
