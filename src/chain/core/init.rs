//! Initial-value solver — steady-state populations at the start of a cycle.
//!
//! Purpose
//! -------
//! Compute, for every untrapped sub-population, the value carried into
//! `t = 0` of a cycle such that the model is periodic: free decay over one
//! full cycle plus that cycle's capture-window production reproduces the
//! starting value.
//!
//! Key behaviors
//! -------------
//! - Closed-form sub-populations (V, W, Z, X): with `e = exp(−cycle/τU)` and
//!   `C` the capture term at `t = cycle_length`, the fixed point of
//!   `x₀ = x₀·e + C` is `x₀ = C/(1 − e)`.
//! - Feeding populations (Y) additionally receive, during free decay, the
//!   decays of all earlier generations' carried-over untrapped ions. Their
//!   fixed point is `y₀ = (C + F(cycle))/(1 − e)` where `F` is the feeding
//!   carry-over of [`feeding_carryover`] started from `y₀ = 0`.
//! - Generations are solved in chain order 1 → 2 → 3; generation `g` reads
//!   only the untrapped totals of generations `< g`, which are already
//!   final when it is reached.
//!
//! Invariants & assumptions
//! ------------------------
//! - Trapped ions are ejected at `cycle_length`; T carries nothing over.
//! - The result depends only on the derived coefficients and the case.
//!
//! Conventions
//! -----------
//! - Arrays are indexed by [`Generation::index`].
//!
//! Testing notes
//! -------------
//! - Periodicity `value(0) == value(cycle_length)` for every species is
//!   checked in the time-domain evaluator's tests and in integration tests.
use crate::chain::core::{
    capture::CaptureTerms,
    case::{CaseConstants, Generation},
    coefficients::ChainCoefficients,
    populations::Species,
};

/// Steady-state values at `t = 0` of the cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialValues {
    pub direct: [f64; 3],
    pub reload_loss: [f64; 3],
    pub decay_branch: [f64; 3],
    pub parent_daughter: [f64; 3],
    pub feeding: [f64; 3],
    /// Sum of all untrapped sub-populations per generation.
    pub untrapped: [f64; 3],
}

impl InitialValues {
    /// Solve the fixed points generation by generation.
    ///
    /// Parameters
    /// ----------
    /// - `terms`: capture-window evaluator over the same coefficients.
    /// - `case`, `coeffs`: the case and derived coefficients.
    ///
    /// Returns
    /// -------
    /// The steady-state initial values; never fails.
    pub fn solve(terms: &CaptureTerms<'_>, case: &CaseConstants, coeffs: &ChainCoefficients) -> Self {
        let cycle = case.cycle_length();
        let mut init = InitialValues {
            direct: [0.0; 3],
            reload_loss: [0.0; 3],
            decay_branch: [0.0; 3],
            parent_daughter: [0.0; 3],
            feeding: [0.0; 3],
            untrapped: [0.0; 3],
        };
        for g in Generation::ALL {
            let i = g.index();
            let carry = 1.0 - (-cycle / coeffs.lifetimes.untrapped[i]).exp();
            init.direct[i] = terms.direct(g, cycle) / carry;
            init.reload_loss[i] = terms.reload_loss(g, cycle) / carry;
            init.decay_branch[i] = terms.decay_branch(g, cycle) / carry;
            init.parent_daughter[i] = terms.parent_daughter(g, cycle) / carry;
            init.feeding[i] = match g {
                Generation::First => 0.0,
                _ => {
                    let fed = feeding_carryover(coeffs, case, g, &init.untrapped, 0.0, cycle);
                    (terms.feeding(g, cycle) + fed) / carry
                }
            };
            init.untrapped[i] = init.direct[i]
                + init.reload_loss[i]
                + init.decay_branch[i]
                + init.parent_daughter[i]
                + init.feeding[i];
        }
        init
    }

    /// Initial value of one sub-population (zero for T).
    pub fn value(&self, species: Species, g: Generation) -> f64 {
        let i = g.index();
        match species {
            Species::T => 0.0,
            Species::V => self.direct[i],
            Species::W => self.reload_loss[i],
            Species::Z => self.decay_branch[i],
            Species::X => self.parent_daughter[i],
            Species::Y => self.feeding[i],
        }
    }
}

/// Free-decay value of a feeding population at time `t` of the cycle.
///
/// Starts from `y0` and adds the daughters of the earlier generations'
/// carried-over untrapped ions (`untrapped[..g]`), using the Bateman-type
/// responses of the modified untrapped lifetimes.
///
/// Returns 0 for the first generation.
pub fn feeding_carryover(
    coeffs: &ChainCoefficients, case: &CaseConstants, g: Generation, untrapped: &[f64; 3], y0: f64,
    t: f64,
) -> f64 {
    let [u1, u2, u3] = coeffs.lifetimes.untrapped;
    let [tau1, tau2, _] = case.lifetimes();
    let e1 = (-t / u1).exp();
    let e2 = (-t / u2).exp();
    let e3 = (-t / u3).exp();
    match g {
        Generation::First => 0.0,
        Generation::Second => y0 * e2 + untrapped[0] * u1 / tau1 * u2 / (u2 - u1) * (e2 - e1),
        Generation::Third => {
            let [c1, c2, c3] = coeffs.shape.untrapped13;
            y0 * e3
                + untrapped[1] * u2 / tau2 * u3 / (u3 - u2) * (e3 - e2)
                + untrapped[0] * u1 / tau1 * u2 / tau2 * u3 / coeffs.shape.theta_u
                    * (c1 * e1 - c2 * e2 + c3 * e3)
        }
    }
}
