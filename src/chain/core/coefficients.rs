//! Derived coefficients — every scalar the evaluators need that depends on
//! the parameter vector and case constants but not on the query time.
//!
//! Purpose
//! -------
//! Collect, in one immutable value, the modified lifetimes, the shape
//! coefficients (products of lifetime differences) used by the
//! three-generation free-decay response, and the amplitudes of every
//! sub-population. Computing them once per accepted
//! parameter vector is what makes per-bin evaluation cheap.
//!
//! Key behaviors
//! -------------
//! - [`ChainCoefficients::compute`] is a pure function of
//!   `(ChainParams, CaseConstants)`.
//! - Naming follows the sub-populations (see
//!   [`Species`](crate::chain::core::populations::Species)):
//!   `trapped` (T), `direct` (V), `reload_loss` (W), `decay_branch` (Z),
//!   `parent_daughter` (X). Y has no amplitude of its own; it is fed from
//!   the others.
//!
//! Invariants & assumptions
//! ------------------------
//! - Degenerate inputs (equal lifetimes across generations) are not
//!   rejected; they surface as non-finite coefficients. Within a generation,
//!   equal trapped/untrapped lifetimes are absorbed by
//!   [`REGULARIZATION`](crate::chain::core::sigma::REGULARIZATION).
//!
//! Conventions
//! -----------
//! - Arrays are indexed by [`Generation::index`]; entries that do not exist
//!   (X for the first generation) are zero.
//! - `τT_g`, `τU_g` denote the modified trapped/untrapped lifetimes and `τ_g`
//!   the nominal lifetime.
use crate::chain::core::{
    case::{CaseConstants, Generation},
    params::{ChainParams, Par},
    sigma::{branching_weight, modified_lifetime},
};

/// Modified lifetimes per generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifiedLifetimes {
    pub trapped: [f64; 3],
    pub untrapped: [f64; 3],
}

impl ModifiedLifetimes {
    pub fn compute(params: &ChainParams, case: &CaseConstants) -> Self {
        let mut trapped = [0.0; 3];
        let mut untrapped = [0.0; 3];
        for g in Generation::ALL {
            let tau = case.lifetime(g);
            trapped[g.index()] = modified_lifetime(tau, params.gamma_trapped(g));
            untrapped[g.index()] = modified_lifetime(tau, params.gamma_untrapped(g));
        }
        Self { trapped, untrapped }
    }
}

/// Lifetime-difference products of the untrapped chain 1 → 2 → 3.
///
/// The triple `(a, b, c)` weights a three-exponential response
/// `a·e^{−t/τU1} − b·e^{−t/τU2} + c·e^{−t/τU3}` that vanishes at `t = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeCoefficients {
    /// Terms on `τU1`, `τU2`, `τU3`.
    pub untrapped13: [f64; 3],
    /// `(τU3 − τU2)(τU3 − τU1)(τU2 − τU1)`.
    pub theta_u: f64,
}

impl ShapeCoefficients {
    pub fn compute(lt: &ModifiedLifetimes) -> Self {
        let [u1, u2, u3] = lt.untrapped;
        Self {
            untrapped13: [u1 * (u3 - u2), u2 * (u3 - u1), u3 * (u2 - u1)],
            theta_u: (u3 - u2) * (u3 - u1) * (u2 - u1),
        }
    }
}

/// Amplitudes of the capture-window terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amplitudes {
    /// `(γT + ι)/(γT − γU + ι)` per generation.
    pub branch_weight: [f64; 3],
    /// T: `r·tCap·p`.
    pub trapped: [f64; 3],
    /// V: `r·tCap·(1 − p)`.
    pub direct: [f64; 3],
    /// W: `r·tCap·(1 − ρ)·p`.
    pub reload_loss: [f64; 3],
    /// Z: `r·tCap·p·weight`.
    pub decay_branch: [f64; 3],
    /// X (generations 2 and 3): trapped parent decaying into this generation.
    pub parent_daughter: [f64; 3],
}

/// Complete derived coefficient set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub lifetimes: ModifiedLifetimes,
    pub shape: ShapeCoefficients,
    pub amps: Amplitudes,
}

impl ChainCoefficients {
    /// Derive every time-independent coefficient.
    ///
    /// Parameters
    /// ----------
    /// - `params`: effective parameter vector (after any tying rule).
    /// - `case`: validated case constants.
    ///
    /// Returns
    /// -------
    /// The coefficient set; never fails. Non-physical inputs propagate as
    /// non-finite values.
    pub fn compute(params: &ChainParams, case: &CaseConstants) -> Self {
        let lifetimes = ModifiedLifetimes::compute(params, case);
        let shape = ShapeCoefficients::compute(&lifetimes);
        let t_cap = case.capture_period();
        let p = params[Par::P];
        let rho = params[Par::Rho];
        let [tt1, tt2, _] = lifetimes.trapped;
        let [_, tu2, tu3] = lifetimes.untrapped;
        let [tau1, tau2, _] = case.lifetimes();

        let mut amps = Amplitudes {
            branch_weight: [0.0; 3],
            trapped: [0.0; 3],
            direct: [0.0; 3],
            reload_loss: [0.0; 3],
            decay_branch: [0.0; 3],
            parent_daughter: [0.0; 3],
        };
        for g in Generation::ALL {
            let i = g.index();
            let produced = params.production(g) * t_cap;
            let weight = branching_weight(params.gamma_trapped(g), params.gamma_untrapped(g));
            amps.branch_weight[i] = weight;
            amps.trapped[i] = produced * p;
            amps.direct[i] = produced * (1.0 - p);
            amps.reload_loss[i] = produced * (1.0 - rho) * p;
            amps.decay_branch[i] = produced * p * weight;
        }
        let r1 = params[Par::R1];
        let r2 = params[Par::R2];
        amps.parent_daughter[1] = r1 * t_cap * p / tau1 * (tt1 * tu2 / (tu2 - tt1));
        amps.parent_daughter[2] = r2 * t_cap * p / tau2 * (tt2 * tu3 / (tu3 - tt2));

        Self { lifetimes, shape, amps }
    }
}
