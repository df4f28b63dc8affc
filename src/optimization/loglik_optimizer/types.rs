//! loglik_optimizer::types — numeric aliases shared by the objective layer.
//!
//! `Theta` is the vector of free parameters an external optimizer moves
//! (see [`FreeParams`](crate::chain::core::params::FreeParams)); `Grad` has
//! the same length. `Cost` is a scalar objective value.
use ndarray::Array1;

/// Free-parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)`, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;
