//! loglik_optimizer — the callback surface an external optimizer drives.
//!
//! Purpose
//! -------
//! Expose model objectives to argmin-style minimizers without owning the
//! minimizer itself. Objectives implement [`LogLikelihood`]; the
//! [`adapter::ArgMinAdapter`] turns one into an argmin `CostFunction` and
//! `Gradient`.
//!
//! Key behaviors
//! -------------
//! - Cost is `c(θ) = -ℓ(θ)`; analytic gradients are negated by the adapter.
//! - Missing gradients fall back to finite differences ([`finite_diff`])
//!   with error capture and a forward-difference retry.
//! - [`validation`] enforces finite values and matching gradient lengths.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives report invalid inputs as [`OptError`](crate::optimization::errors::OptError),
//!   never by panicking.
//! - `θ` holds only the free parameters; the mapping to the full parameter
//!   vector lives in the model layer.
//!
//! Downstream usage
//! ----------------
//! - `ChainFit` implements [`LogLikelihood`] over binned counts; a driver
//!   builds `ArgMinAdapter::new(&fit, &data)` and hands it to its solver.

pub mod adapter;
pub mod finite_diff;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::adapter::ArgMinAdapter;
pub use self::traits::LogLikelihood;
pub use self::types::{Cost, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_decaychain::optimization::loglik_optimizer::prelude::*;
//
// to import the objective surface in a single line.

pub mod prelude {
    pub use super::adapter::ArgMinAdapter;
    pub use super::traits::LogLikelihood;
    pub use super::types::{Cost, Grad, Theta};
}
