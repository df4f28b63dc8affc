//! Time-domain evaluator — sub-population values at a query time.
//!
//! Purpose
//! -------
//! Evaluate every (species, generation) population at a time `t` of the
//! cycle from one derived state: the steady-state values carried over from
//! the previous cycle plus, inside the capture window, the contribution of
//! the current cycle's injections.
//!
//! Key behaviors
//! -------------
//! - Three regimes keyed on `t`:
//!   - free decay (`0 ≤ t ≤ cycle_length`): carried-over value
//!     `x₀·e^{−t/τU}` (Y additionally receives the earlier generations'
//!     carried-over decays);
//!   - capture (`background_start ≤ t ≤ cycle_length`): the capture term
//!     is added on top;
//!   - outside both windows the population is zero.
//! - T has no free-decay term: trapped ions are ejected at `cycle_length`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Populations are non-negative for physical parameters. Nothing is
//!   clamped; tests assert the property instead.
//! - At `t = background_start` the capture term is exactly zero, so the
//!   value there equals the free-decay value. At `background_start⁺` W, Z,
//!   X, Y are continuous while T and V jump by the first injection.
//!
//! Conventions
//! -----------
//! - Times in milliseconds; values are ion counts.
use crate::chain::core::{
    capture::CaptureTerms,
    case::{CaseConstants, Generation},
    coefficients::ChainCoefficients,
    init::{feeding_carryover, InitialValues},
    params::ChainParams,
};
use std::fmt;

/// Sub-population label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Held in the trap.
    T,
    /// Produced untrapped.
    V,
    /// Lost from the trap at a reload.
    W,
    /// Untrapped after a trapped-state decay branch.
    Z,
    /// Untrapped daughter of a trapped parent.
    X,
    /// Untrapped daughter of an untrapped parent.
    Y,
}

impl Species {
    pub const ALL: [Species; 6] =
        [Species::T, Species::V, Species::W, Species::Z, Species::X, Species::Y];

    /// Untrapped sub-populations, in aggregation order.
    pub const UNTRAPPED: [Species; 5] = [Species::V, Species::W, Species::Z, Species::X, Species::Y];

    pub const fn name(self) -> &'static str {
        match self {
            Species::T => "T",
            Species::V => "V",
            Species::W => "W",
            Species::Z => "Z",
            Species::X => "X",
            Species::Y => "Y",
        }
    }

    /// X and Y exist only below the head of the chain.
    pub const fn exists_for(self, g: Generation) -> bool {
        !matches!((self, g), (Species::X | Species::Y, Generation::First))
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view over one derived state that evaluates populations.
#[derive(Debug, Clone, Copy)]
pub struct PopulationEvaluator<'a> {
    case: &'a CaseConstants,
    coeffs: &'a ChainCoefficients,
    initial: &'a InitialValues,
    capture: CaptureTerms<'a>,
}

impl<'a> PopulationEvaluator<'a> {
    pub fn new(
        params: &'a ChainParams, case: &'a CaseConstants, coeffs: &'a ChainCoefficients,
        initial: &'a InitialValues,
    ) -> Self {
        Self { case, coeffs, initial, capture: CaptureTerms::new(params, case, coeffs) }
    }

    /// Population of `species` in generation `g` at time `t`.
    ///
    /// Returns 0 outside `[0, cycle_length]` and for species that do not
    /// exist in `g`.
    pub fn value(&self, species: Species, g: Generation, t: f64) -> f64 {
        if !species.exists_for(g) {
            return 0.0;
        }
        let free = if self.case.in_cycle(t) { self.free_decay(species, g, t) } else { 0.0 };
        if self.case.in_capture_window(t) {
            free + self.capture.value(species, g, t)
        } else {
            free
        }
    }

    /// Carried-over part only, without the current cycle's captures.
    pub fn free_decay(&self, species: Species, g: Generation, t: f64) -> f64 {
        let i = g.index();
        let tau_u = self.coeffs.lifetimes.untrapped[i];
        match species {
            Species::T => 0.0,
            Species::Y => feeding_carryover(
                self.coeffs,
                self.case,
                g,
                &self.initial.untrapped,
                self.initial.feeding[i],
                t,
            ),
            _ => self.initial.value(species, g) * (-t / tau_u).exp(),
        }
    }

    pub fn trapped_total(&self, g: Generation, t: f64) -> f64 {
        self.value(Species::T, g, t)
    }

    /// Sum of V, W, Z, X and Y of generation `g`.
    pub fn untrapped_total(&self, g: Generation, t: f64) -> f64 {
        Species::UNTRAPPED.iter().map(|&s| self.value(s, g, t)).sum()
    }
}
