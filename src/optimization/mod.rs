//! optimization — objective interface, argmin bridge and error surface.
//!
//! Purpose
//! -------
//! Give fit drivers a stable way to call model objectives: a
//! [`LogLikelihood`](loglik_optimizer::LogLikelihood) trait, an argmin
//! adapter with finite-difference gradients, and a single error enum
//! ([`errors::OptError`]) with its result alias.
//!
//! Conventions
//! -----------
//! - Objectives are log-likelihoods `ℓ(θ)`; minimizers see `c(θ) = -ℓ(θ)`.
//! - Model errors (`ChainError`, `ParamError`) convert into `OptError`;
//!   callers never see raw argmin errors.
//! - No estimation algorithm lives here; the driver that repeatedly calls
//!   the objective is external.
//!
//! Testing notes
//! -------------
//! - Unit tests cover sign conventions, finite-difference fallbacks,
//!   validation and error conversions. The chain objective is exercised
//!   end to end in `tests/`.

pub mod errors;
pub mod loglik_optimizer;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_decaychain::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
