//! Chain coefficient engine — modified lifetimes and the closed-form sums
//! over repeated injections.
//!
//! Purpose
//! -------
//! Provide the pure, stateless building blocks every population formula is
//! assembled from:
//!
//! - [`modified_lifetime`]: lifetime shifted by a decay-rate offset.
//! - [`sigma_t`]: surviving trapped fraction after `n` periodic injections.
//! - [`sigma_w`]: accumulated population lost from the trap at reloads.
//! - [`sigma_z`]: accumulated population fed by decays of trapped ions.
//!
//! Key behaviors
//! -------------
//! With `a = exp(−capture_period/τ)` and, for two lifetimes, `aT`, `aU` and
//! `q = ρ·aT/aU`, the sums satisfy the per-interval recurrences
//!
//! ```text
//! Σ_T(n+1) = ρ·aT·Σ_T(n) + 1                 Σ_T(1) = 1
//! Σ_W(n+1) = aU·Σ_W(n) + aT·Σ_T(n)           Σ_W(1) = 0
//! Σ_Z(n+1) = aU·Σ_Z(n) + (aU − aT)·Σ_T(n)    Σ_Z(1) = 0
//! ```
//!
//! and are evaluated in closed form, so the cost does not depend on `n`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every denominator of `Σ_W`/`Σ_Z` that can vanish for physical inputs
//!   (equal lifetimes, `q = 1`, `ρ = 0`) carries the additive constant
//!   [`REGULARIZATION`]. No branching on degeneracy takes place; the price
//!   is a relative bias of order `REGULARIZATION / |denominator|`.
//! - Small retention is the exception. `Σ_W` carries `ι` in its numerators
//!   as well, so its relative bias grows like `ι/(ρ·(1 − aU))`: about 4e-6
//!   at `ρ = 1e-3` and 5e-3 at `ρ = 1e-6` for 137-Te, and O(1) below
//!   `ρ ≈ 1e-8`. At `ρ = 0` the sum collapses to about `1 − aU^n` instead of
//!   `aT(1 − aU^{n−1})/(1 − aU)`. The reload-loss amplitude is largest
//!   there (it scales with `1 − ρ`), so W curves are unreliable for
//!   `ρ ≲ 1e-6`.
//! - `Σ_W` and `Σ_Z` are zero for `n < 2` (nothing has been reloaded yet).
//! - [`modified_lifetime`] is not guarded: a shift that drives
//!   `1/τ + γ/1000` to zero or below yields a non-finite or negative value.
//!
//! Conventions
//! -----------
//! - Lifetimes and periods in milliseconds; shifts in 1/s.
//! - `n` is the 1-based injection count within the current cycle.
//!
//! Testing notes
//! -------------
//! - Unit tests compare every closed form against the recurrences above
//!   over a full cycle of injections.
/// Additive constant regularizing degenerate denominators.
///
/// Also used in the branching weight `(γT + ι)/(γT − γU + ι)`. With shifts of
/// order 1e-2 1/s the induced relative bias stays below 1e-7.
pub const REGULARIZATION: f64 = 1e-9;

const IOTA: f64 = REGULARIZATION;

/// Lifetime with a decay-rate shift: `1 / (1/τ + γ/1000)`.
///
/// `lifetime` in ms, `shift` in 1/s.
#[inline]
pub fn modified_lifetime(lifetime: f64, shift: f64) -> f64 {
    1.0 / (1.0 / lifetime + shift / 1000.0)
}

/// Weight of the trapped-state decay branch, `(γT + ι)/(γT − γU + ι)`.
///
/// Multiplies every amplitude of a population fed by decays of trapped
/// ions. Equals 1 when both shifts vanish.
#[inline]
pub fn branching_weight(gamma_trapped: f64, gamma_untrapped: f64) -> f64 {
    (gamma_trapped + IOTA) / ((gamma_trapped - gamma_untrapped) + IOTA)
}

/// Surviving trapped fraction after `n` injections.
///
/// `(1 − (ρa)^n)/(1 − ρa)`, `a = exp(−capture_period/τ)`.
#[inline]
pub fn sigma_t(rho: f64, tau: f64, n: i32, capture_period: f64) -> f64 {
    let ra = rho * (-capture_period / tau).exp();
    (1.0 - ra.powi(n)) / (1.0 - ra)
}

/// Accumulated reload-loss population after `n` injections.
///
/// Parameters
/// ----------
/// - `rho`: retention fraction per reload.
/// - `tau_t`, `tau_u`: modified lifetimes of the trapped and untrapped states.
/// - `n`: injection count; returns 0 for `n < 2`.
/// - `capture_period`: injection spacing.
///
/// Notes
/// -----
/// - Closed form of `Σ_{k=1}^{n−1} Σ_T(k)·aT·aU^{n−1−k}`, regularized.
/// - Breaks down for `ρ ≲ 1e-6`; see the module docs.
/// - At `ρ = 1` with `τT = τU` the regularized ratio `(q^n − q)/(q − 1)`
///   collapses to 1 instead of `n − 1`; the reload-loss amplitude carries a
///   factor `1 − ρ` and vanishes there.
pub fn sigma_w(rho: f64, tau_t: f64, tau_u: f64, n: i32, capture_period: f64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let a_t = (-capture_period / tau_t).exp();
    let a_u = (-capture_period / tau_u).exp();
    let q = rho * a_t / a_u;
    let rt = rho * a_t;
    (1.0 + IOTA) / (rho * (a_u - 1.0) + IOTA)
        * (a_u.powi(n) * (q.powi(n) - q + IOTA) / (q - 1.0 + IOTA)
            - (rt.powi(n) - rt + IOTA) / (rt - 1.0 + IOTA))
}

/// Accumulated trapped-decay-branch population after `n` injections.
///
/// Parameters as in [`sigma_w`]; returns 0 for `n < 2`.
///
/// Notes
/// -----
/// - Closed form of `Σ_{k=1}^{n−1} Σ_T(k)·(aU − aT)·aU^{n−1−k}`; vanishes
///   identically when `τT = τU`.
pub fn sigma_z(rho: f64, tau_t: f64, tau_u: f64, n: i32, capture_period: f64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let a_t = (-capture_period / tau_t).exp();
    let a_u = (-capture_period / tau_u).exp();
    let q = rho * a_t / a_u;
    let inv_u = 1.0 / a_u;
    (a_u - a_t) * a_u.powi(n - 1) / (1.0 - rho * a_t)
        * ((inv_u.powi(n) - inv_u) / (inv_u - 1.0) - (q.powi(n) - q) / (q - 1.0 + IOTA))
}
