//! The callback interface an external optimizer drives.
//!
//! Convention: a fit *maximizes* a log-likelihood `ℓ(θ)`; minimizers see the
//! cost `c(θ) = -ℓ(θ)` through [`ArgMinAdapter`](super::adapter::ArgMinAdapter).
//! An analytic gradient, when provided, is `∇ℓ(θ)`; the adapter flips the
//! sign.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Cost, Grad, Theta},
};

/// User-implemented log-likelihood interface.
///
/// - `type Data`: observations carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject malformed `θ`/data
///   pairs. Called once at session setup, not per evaluation.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic `∇ℓ(θ)`. The default
///   returns [`OptError::GradientNotImplemented`], which makes the adapter
///   fall back to finite differences.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}
