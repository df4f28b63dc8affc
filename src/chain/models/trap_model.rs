//! Trap chain model — observable aggregator over the cached evaluator.
//!
//! Purpose
//! -------
//! Turn populations into what a detector sees: the per-species decay rates
//! weighted by detection efficiencies, plus a constant background. Two
//! output conventions share the same evaluations:
//!
//! - `rate(v, t)`: instantaneous count rate (counts/ms),
//!   `DC + Σ_g Σ_s eps_s·N_{s,g}(t)/τ_g` with nominal lifetimes `τ_g`;
//! - `observable(v, t)`: expected counts in a bin, `nCyc·dt·rate(v, t)`.
//!
//! Key behaviors
//! -------------
//! - Every evaluation refreshes the owned [`ParameterCache`] first, so
//!   consecutive calls with one vector (one optimizer iteration over many
//!   bins) reuse a single derived state.
//! - [`TrapChainModel::components`] exposes the breakdown the totals are
//!   summed from; per-component curves are scaled like the observable.
//!
//! Invariants & assumptions
//! ------------------------
//! - `observable == nCyc·dt·rate` for every input, bit for bit, since both
//!   read the same [`ComponentRates`].
//! - A model serves one fit session; it is not shared between threads.
//!
//! Downstream usage
//! ----------------
//! - `ChainFit` evaluates [`TrapChainModel::observable`] per bin.
//! - The Python `ChainModel` wraps a `TrapChainModel` one-to-one.
use crate::chain::{
    core::{
        cache::{DerivedState, ParameterCache},
        case::{CaseConstants, CaseTable, Generation},
        options::ChainOptions,
        params::{ChainParams, Par},
        populations::Species,
    },
    errors::ChainResult,
};
use ndarray::{Array1, ArrayView1};

/// Detection-efficiency slot of a species.
pub const fn efficiency(species: Species) -> Par {
    match species {
        Species::T => Par::EpsT,
        Species::V => Par::EpsV,
        Species::W => Par::EpsW,
        Species::Z => Par::EpsZ,
        Species::X => Par::EpsX,
        Species::Y => Par::EpsY,
    }
}

/// One generation's trapped or untrapped contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Trapped(Generation),
    Untrapped(Generation),
}

/// Decay-rate contributions at one time (counts/ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentRates {
    /// Constant background `DC`.
    pub background: f64,
    /// `eps_s·N_{s,g}/τ_g`, indexed `[generation][species]` in
    /// [`Species::ALL`] order.
    pub species: [[f64; 6]; 3],
}

impl ComponentRates {
    /// Rate contribution of one species of generation `g`.
    ///
    /// # Returns
    /// `eps_s·N_{s,g}/τ_g` in counts/ms; 0 for X and Y of generation 1.
    pub fn get(&self, species: Species, g: Generation) -> f64 {
        self.species[g.index()][species_slot(species)]
    }

    /// Trapped (T) contribution of generation `g`.
    pub fn trapped(&self, g: Generation) -> f64 {
        self.get(Species::T, g)
    }

    /// Untrapped contribution of generation `g`: V + W + Z + X + Y.
    pub fn untrapped(&self, g: Generation) -> f64 {
        Species::UNTRAPPED.iter().map(|&s| self.get(s, g)).sum()
    }

    /// Contribution of one [`Component`], without the background.
    pub fn component(&self, component: Component) -> f64 {
        match component {
            Component::Trapped(g) => self.trapped(g),
            Component::Untrapped(g) => self.untrapped(g),
        }
    }

    /// Background plus every species of every generation.
    pub fn total(&self) -> f64 {
        self.background + self.species.iter().flatten().sum::<f64>()
    }
}

fn species_slot(species: Species) -> usize {
    match species {
        Species::T => 0,
        Species::V => 1,
        Species::W => 2,
        Species::Z => 3,
        Species::X => 4,
        Species::Y => 5,
    }
}

/// `nCyc·dt`: converts a rate into expected counts per bin.
pub fn bin_scale(params: &ChainParams) -> f64 {
    params[Par::NCyc] * params[Par::Dt]
}

/// Cached decay-chain trap model for one case.
#[derive(Debug, Clone)]
pub struct TrapChainModel {
    cache: ParameterCache,
}

impl TrapChainModel {
    /// Construct a model with an empty parameter cache.
    ///
    /// # Arguments
    /// - `case`: validated timing and lifetimes of the measurement.
    /// - `options`: cache tolerance and the trapped-shift tie.
    ///
    /// # Returns
    /// A model whose first evaluation builds the derived state
    /// (`change_count() == 0` until then).
    pub fn new(case: CaseConstants, options: ChainOptions) -> Self {
        Self { cache: ParameterCache::new(case, options) }
    }

    /// Model for a case of `table`.
    ///
    /// # Errors
    /// [`ChainError::UnknownCase`](crate::chain::errors::ChainError::UnknownCase)
    /// or the case's validation error.
    pub fn from_case(table: &CaseTable, code: &str, options: ChainOptions) -> ChainResult<Self> {
        let case = table.get(code)?.constants()?;
        Ok(Self::new(case, options))
    }

    /// Refresh the cache for `params` and return the derived state.
    pub fn state(&mut self, params: &ChainParams) -> &DerivedState {
        self.cache.refresh(params)
    }

    /// Population of one sub-population at `t`.
    pub fn population(
        &mut self, params: &ChainParams, species: Species, g: Generation, t: f64,
    ) -> f64 {
        self.cache.refresh(params).population(species, g, t)
    }

    /// Per-species decay-rate contributions at `t`.
    pub fn components(&mut self, params: &ChainParams, t: f64) -> ComponentRates {
        let state = self.cache.refresh(params);
        let eval = state.evaluator();
        let effective = state.params();
        let lifetimes = state.case().lifetimes();
        let mut species = [[0.0; 6]; 3];
        for g in Generation::ALL {
            let tau = lifetimes[g.index()];
            for s in Species::ALL {
                if s.exists_for(g) {
                    species[g.index()][species_slot(s)] =
                        effective[efficiency(s)] * eval.value(s, g, t) / tau;
                }
            }
        }
        ComponentRates { background: effective[Par::Dc], species }
    }

    /// Instantaneous count rate at `t` (counts/ms).
    pub fn rate(&mut self, params: &ChainParams, t: f64) -> f64 {
        self.components(params, t).total()
    }

    /// Expected counts in the bin at `t`: `nCyc·dt·rate`.
    pub fn observable(&mut self, params: &ChainParams, t: f64) -> f64 {
        bin_scale(params) * self.rate(params, t)
    }

    /// Background plus one component, scaled like [`observable`](Self::observable).
    pub fn component_observable(
        &mut self, params: &ChainParams, component: Component, t: f64,
    ) -> f64 {
        let rates = self.components(params, t);
        bin_scale(params) * (rates.background + rates.component(component))
    }

    /// [`observable`](Self::observable) at every entry of `times`.
    ///
    /// # Arguments
    /// - `params`: full 20-slot vector; one cache refresh serves the curve.
    /// - `times`: evaluation times in ms; entries outside `[0, cycleLength]`
    ///   give the background only.
    ///
    /// # Returns
    /// Expected counts per bin, same length as `times`.
    pub fn observable_curve(&mut self, params: &ChainParams, times: ArrayView1<f64>) -> Array1<f64> {
        times.mapv(|t| self.observable(params, t))
    }

    /// [`rate`](Self::rate) at every entry of `times` (counts/ms).
    pub fn rate_curve(&mut self, params: &ChainParams, times: ArrayView1<f64>) -> Array1<f64> {
        times.mapv(|t| self.rate(params, t))
    }

    /// Number of derived-state rebuilds so far.
    pub fn change_count(&self) -> u64 {
        self.cache.change_count()
    }

    /// Case constants the model was built for.
    pub fn case(&self) -> &CaseConstants {
        self.cache.case()
    }

    /// Options passed at construction.
    pub fn options(&self) -> &ChainOptions {
        self.cache.options()
    }
}
