//! Adapter that exposes a `LogLikelihood` as an `argmin` problem.
//!
//! A fit maximizes `ℓ(θ)`; argmin minimizes, so the cost is `c(θ) = -ℓ(θ)`.
//! Analytic gradients are negated; without one, the **cost** is finite
//! differenced, so no sign flip is needed on that branch.
use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::fd_gradient,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::{validate_grad, validate_value},
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ) = -ℓ(θ)`.
    ///
    /// # Errors
    /// Errors from `value`, or [`OptError::NonFiniteCost`] for NaN/±inf.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        validate_value(output)?;
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Gradient of the cost at `θ`.
    ///
    /// - Analytic: validate `grad(θ)` and return `-grad`.
    /// - [`OptError::GradientNotImplemented`]: finite differences of
    ///   [`cost`](CostFunction::cost) via [`fd_gradient`].
    /// - Any other error from `grad` is returned as is.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => Ok(fd_gradient(theta, |x| self.cost(x))?),
            Err(e) => Err(e.into()),
        }
    }
}
