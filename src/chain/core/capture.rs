//! Capture-window terms — populations produced during the current cycle's
//! injections.
//!
//! Purpose
//! -------
//! Evaluate, for a query time inside the capture window
//! (`background_start ≤ t ≤ cycle_length`), the contribution of the current
//! cycle's injections to every sub-population. The time-domain evaluator adds
//! these to the carried-over free-decay terms; the initial-value solver
//! evaluates them at `t = cycle_length`.
//!
//! Key behaviors
//! -------------
//! - Closed-form sub-populations (T, V, W, Z, X) combine the sigma sums at
//!   the current injection index `n` with exponential decay over the time
//!   elapsed in interval `n`.
//! - Feeding populations (Y) have no closed form over `n`; they are a
//!   discrete convolution over the started intervals `k = 1..=n`: each
//!   interval feeds Y exactly from that interval's untrapped parents, and
//!   the result decays through the later intervals. Cost is linear in `n`,
//!   bounded by
//!   [`MAX_INJECTIONS`](crate::chain::core::validation::MAX_INJECTIONS).
//!
//! Invariants & assumptions
//! ------------------------
//! - Callers guarantee `t` lies in the capture window; at
//!   `t = background_start` (`n = 0`) every term is zero.
//! - X and Y do not exist for the first generation and evaluate to zero.
//! - Y assumes distinct untrapped lifetimes across generations and a
//!   trapped lifetime different from the next generation's untrapped one.
//!
//! Conventions
//! -----------
//! - `n` is the 1-based interval index; `s` the time elapsed since its start.
use crate::chain::core::{
    case::{CaseConstants, Generation},
    coefficients::ChainCoefficients,
    params::{ChainParams, Par},
    populations::Species,
    sigma::{sigma_t, sigma_w, sigma_z},
};

/// Capture-window evaluator over one derived coefficient set.
#[derive(Debug, Clone, Copy)]
pub struct CaptureTerms<'a> {
    params: &'a ChainParams,
    case: &'a CaseConstants,
    coeffs: &'a ChainCoefficients,
}

impl<'a> CaptureTerms<'a> {
    pub fn new(
        params: &'a ChainParams, case: &'a CaseConstants, coeffs: &'a ChainCoefficients,
    ) -> Self {
        Self { params, case, coeffs }
    }

    /// Dispatch on the sub-population.
    pub fn value(&self, species: Species, g: Generation, t: f64) -> f64 {
        match species {
            Species::T => self.trapped(g, t),
            Species::V => self.direct(g, t),
            Species::W => self.reload_loss(g, t),
            Species::Z => self.decay_branch(g, t),
            Species::X => self.parent_daughter(g, t),
            Species::Y => self.feeding(g, t),
        }
    }

    /// Injection index and elapsed time in that interval.
    #[inline]
    fn interval(&self, t: f64) -> (i32, f64) {
        let n = self.case.injection_index(t);
        (n, self.case.elapsed_in_interval(t, n))
    }

    #[inline]
    fn rho(&self) -> f64 {
        self.params[Par::Rho]
    }

    /// T: ions currently held in the trap.
    pub fn trapped(&self, g: Generation, t: f64) -> f64 {
        let i = g.index();
        let (n, s) = self.interval(t);
        let tau_t = self.coeffs.lifetimes.trapped[i];
        self.coeffs.amps.trapped[i]
            * sigma_t(self.rho(), tau_t, n, self.case.capture_period())
            * (-s / tau_t).exp()
    }

    /// V: ions produced untrapped.
    pub fn direct(&self, g: Generation, t: f64) -> f64 {
        let i = g.index();
        let (n, s) = self.interval(t);
        let tau_u = self.coeffs.lifetimes.untrapped[i];
        self.coeffs.amps.direct[i]
            * sigma_t(1.0, tau_u, n, self.case.capture_period())
            * (-s / tau_u).exp()
    }

    /// W: trapped ions released at reloads.
    pub fn reload_loss(&self, g: Generation, t: f64) -> f64 {
        let i = g.index();
        let (n, s) = self.interval(t);
        let lt = &self.coeffs.lifetimes;
        self.coeffs.amps.reload_loss[i]
            * sigma_w(self.rho(), lt.trapped[i], lt.untrapped[i], n, self.case.capture_period())
            * (-s / lt.untrapped[i]).exp()
    }

    /// Z: untrapped population fed by the trapped-state decay branch.
    pub fn decay_branch(&self, g: Generation, t: f64) -> f64 {
        let i = g.index();
        let lt = &self.coeffs.lifetimes;
        self.coeffs.amps.decay_branch[i] * self.mixed(lt.trapped[i], lt.untrapped[i], t)
    }

    /// X: untrapped daughters of trapped parents.
    pub fn parent_daughter(&self, g: Generation, t: f64) -> f64 {
        let Some(parent) = g.parent() else {
            return 0.0;
        };
        let lt = &self.coeffs.lifetimes;
        self.coeffs.amps.parent_daughter[g.index()]
            * self.mixed(lt.trapped[parent.index()], lt.untrapped[g.index()], t)
    }

    /// `(Σ_Z + Σ_T)·e^{−s/τU} − Σ_T·e^{−s/τT}` at the current interval.
    fn mixed(&self, tau_t: f64, tau_u: f64, t: f64) -> f64 {
        let (n, s) = self.interval(t);
        let period = self.case.capture_period();
        let st = sigma_t(self.rho(), tau_t, n, period);
        let sz = sigma_z(self.rho(), tau_t, tau_u, n, period);
        (sz + st) * (-s / tau_u).exp() - st * (-s / tau_t).exp()
    }

    /// Y: untrapped daughters of untrapped parents.
    ///
    /// Walks the started intervals `k = 1..=n`, carrying Y across each
    /// injection. Inside an interval the untrapped parents are exponential
    /// sums (see [`untrapped_source`](Self::untrapped_source)), so Y has an
    /// exact solution there; reload transfers into W are included because
    /// the parents are taken at their own interval index.
    pub fn feeding(&self, g: Generation, t: f64) -> f64 {
        if g == Generation::First {
            return 0.0;
        }
        let (n, s) = self.interval(t);
        let period = self.case.capture_period();
        let [tau1, tau2, _] = self.case.lifetimes();
        let [_, tu2, tu3] = self.coeffs.lifetimes.untrapped;
        let (mut second, mut third) = (0.0, 0.0);
        for k in 1..=n {
            let d = if k < n { period } else { s };
            let (fed2, own2) = feed(self.untrapped_source(Generation::First, k), tau1, tu2, second);
            if g == Generation::Third {
                let [a, b, c] = self.untrapped_source(Generation::Second, k);
                let source = [a, b, c, fed2[0], fed2[1], fed2[2], own2];
                let (fed3, own3) = feed(source, tau2, tu3, third);
                third = decays_at(&fed3, d) + decays_at(&[own3], d);
            }
            second = decays_at(&fed2, d) + decays_at(&[own2], d);
        }
        match g {
            Generation::Third => third,
            _ => second,
        }
    }

    /// V + W + Z + X of generation `g` in interval `n`, as `(amplitude,
    /// lifetime)` pairs on `τU_g`, `τT_g` and the trapped parent's `τT`.
    ///
    /// Evaluating the pairs at the elapsed time reproduces the sum of
    /// [`direct`](Self::direct), [`reload_loss`](Self::reload_loss),
    /// [`decay_branch`](Self::decay_branch) and
    /// [`parent_daughter`](Self::parent_daughter). The parent pair has zero
    /// amplitude for the first generation.
    fn untrapped_source(&self, g: Generation, n: i32) -> [(f64, f64); 3] {
        let i = g.index();
        let lt = &self.coeffs.lifetimes;
        let amps = &self.coeffs.amps;
        let period = self.case.capture_period();
        let rho = self.rho();
        let (tt, tu) = (lt.trapped[i], lt.untrapped[i]);

        let st = sigma_t(rho, tt, n, period);
        let mut on_untrapped = amps.direct[i] * sigma_t(1.0, tu, n, period)
            + amps.reload_loss[i] * sigma_w(rho, tt, tu, n, period)
            + amps.decay_branch[i] * (sigma_z(rho, tt, tu, n, period) + st);
        let on_trapped = -amps.decay_branch[i] * st;

        let parent = match g.parent() {
            Some(parent) => {
                let tp = lt.trapped[parent.index()];
                let sp = sigma_t(rho, tp, n, period);
                on_untrapped += amps.parent_daughter[i] * (sigma_z(rho, tp, tu, n, period) + sp);
                (-amps.parent_daughter[i] * sp, tp)
            }
            None => (0.0, tt),
        };
        [(on_untrapped, tu), (on_trapped, tt), parent]
    }
}

/// Solve `y' = Σ a·e^{−s/λ}/tau − y/mu` from `y(0) = start`.
///
/// Returns the driven terms on the source lifetimes and the free term on
/// `mu`. Source and target lifetimes must differ; zero-amplitude sources are
/// skipped.
fn feed<const N: usize>(
    source: [(f64, f64); N], tau: f64, mu: f64, start: f64,
) -> ([(f64, f64); N], (f64, f64)) {
    let driven = source.map(|(a, lambda)| {
        if a == 0.0 {
            (0.0, lambda)
        } else {
            (a / tau * lambda * mu / (lambda - mu), lambda)
        }
    });
    let free = start - driven.iter().map(|&(a, _)| a).sum::<f64>();
    (driven, (free, mu))
}

/// `Σ a·e^{−s/λ}`.
fn decays_at(terms: &[(f64, f64)], s: f64) -> f64 {
    terms.iter().map(|&(a, lambda)| a * (-s / lambda).exp()).sum()
}
