//! loglik_optimizer::finite_diff — finite-difference gradients of a
//! fallible objective.
//!
//! Purpose
//! -------
//! Approximate the gradient of a cost `c(θ)` when the objective provides no
//! analytic derivative. The decay-chain observable is a closed form in most
//! parameters but a finite sum over injections in the feeding populations;
//! finite differences are the default gradient path for chain fits.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`] tries central differences first and falls back to
//!   forward differences when a cost evaluation failed or the central
//!   gradient does not validate.
//! - The `finitediff` closures must return `f64`, so failures are captured
//!   in a shared `RefCell<Option<Error>>` and the closure returns NaN; the
//!   captured error is surfaced afterwards.
//!
//! Invariants & assumptions
//! ------------------------
//! - Returned gradients satisfy [`validate_grad`].
//! - Each shifted point is a distinct parameter vector; with the default cache
//!   tolerance every shifted point triggers a cache rebuild.
//!
//! Testing notes
//! -------------
//! - Unit tests cover a smooth quadratic, error propagation, and the
//!   forward fallback when the central stencil leaves the domain.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{validation::validate_grad, Grad, Theta},
};
use argmin::core::Error;
use finitediff::FiniteDiff;

/// Finite-difference gradient of a fallible cost.
///
/// Parameters
/// ----------
/// - `theta`: point of evaluation.
/// - `cost`: objective returning `Err` for points it cannot evaluate.
///
/// Returns
/// -------
/// A validated gradient, central if possible, forward otherwise.
///
/// Errors
/// ------
/// - The first error raised by `cost` on the forward path.
/// - Validation errors of the forward gradient.
pub fn fd_gradient<C>(theta: &Theta, cost: C) -> OptResult<Grad>
where
    C: Fn(&Theta) -> Result<f64, Error>,
{
    let closure_err: RefCell<Option<Error>> = RefCell::new(None);
    let func = |x: &Theta| -> f64 {
        match cost(x) {
            Ok(val) => val,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let central = theta.central_diff(&func);
    if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }
    run_fd_diff(theta, &func, &closure_err)
}

/// Forward-difference gradient of `func` with error capture.
///
/// Clears `closure_err`, runs `forward_diff`, then returns the captured
/// error if any, else the validated gradient.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}
