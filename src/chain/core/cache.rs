//! Parameter-dependent cache — derived state keyed on the parameter vector.
//!
//! Purpose
//! -------
//! Own everything that depends on the parameter vector but not on the query
//! time (modified lifetimes, shape coefficients, amplitudes, steady-state
//! initial values) and rebuild it only when the vector actually changes.
//! The model is evaluated once per data bin for every optimizer iteration;
//! between iterations the vector is constant, so repeated refreshes must be
//! O(1).
//!
//! Key behaviors
//! -------------
//! - [`ParameterCache::refresh`] compares the incoming vector slot by slot
//!   against the last accepted one with an absolute tolerance. Within
//!   tolerance it returns the existing [`DerivedState`] untouched; otherwise
//!   it builds a fresh state wholesale, replaces the accepted vector and
//!   increments the change counter.
//! - Every rebuild is logged at `debug` level with the changed slot names.
//! - [`DerivedState::compute`] is a pure function of (parameters, case,
//!   options); the cache never patches an old state.
//!
//! Invariants & assumptions
//! ------------------------
//! - A cache serves one case and one stream of parameter vectors. It is not
//!   shared between threads; concurrent fits each own a cache.
//! - Refresh never fails. Degenerate parameters yield non-finite derived
//!   values rather than errors.
//! - The change counter is monotonically non-decreasing.
//!
//! Downstream usage
//! ----------------
//! - `TrapChainModel` calls `refresh` as the first step of every
//!   evaluation and then reads populations through
//!   [`DerivedState::evaluator`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover purity (bit-identical state, counter unchanged),
//!   sensitivity to every slot, the tolerance boundary and the tying option.
use crate::chain::core::{
    capture::CaptureTerms,
    case::{CaseConstants, Generation},
    coefficients::ChainCoefficients,
    init::InitialValues,
    options::ChainOptions,
    params::ChainParams,
    populations::{PopulationEvaluator, Species},
};

/// Time-independent state derived from one parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedState {
    params: ChainParams,
    case: CaseConstants,
    coefficients: ChainCoefficients,
    initial: InitialValues,
}

impl DerivedState {
    /// Build the state for `params` as seen through `options`.
    ///
    /// Coefficients are derived first; the initial values are solved from
    /// them generation by generation.
    pub fn compute(params: &ChainParams, case: &CaseConstants, options: &ChainOptions) -> Self {
        let params = options.effective(params);
        let coefficients = ChainCoefficients::compute(&params, case);
        let initial =
            InitialValues::solve(&CaptureTerms::new(&params, case, &coefficients), case, &coefficients);
        Self { params, case: *case, coefficients, initial }
    }

    /// Effective parameter vector (after the tying rule).
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn case(&self) -> &CaseConstants {
        &self.case
    }

    pub fn coefficients(&self) -> &ChainCoefficients {
        &self.coefficients
    }

    pub fn initial_values(&self) -> &InitialValues {
        &self.initial
    }

    pub fn evaluator(&self) -> PopulationEvaluator<'_> {
        PopulationEvaluator::new(&self.params, &self.case, &self.coefficients, &self.initial)
    }

    /// Shorthand for `self.evaluator().value(species, g, t)`.
    pub fn population(&self, species: Species, g: Generation, t: f64) -> f64 {
        self.evaluator().value(species, g, t)
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    accepted: ChainParams,
    state: DerivedState,
}

/// Cache owning the derived state of one fit session.
///
/// Fields
/// ------
/// - `case`: immutable case constants of the session.
/// - `options`: tolerance and tying rule.
/// - `current`: last accepted vector with its derived state; `None` until
///   the first refresh.
/// - `change_count`: number of accepted changes (rebuilds).
#[derive(Debug, Clone)]
pub struct ParameterCache {
    case: CaseConstants,
    options: ChainOptions,
    current: Option<Snapshot>,
    change_count: u64,
}

impl ParameterCache {
    pub fn new(case: CaseConstants, options: ChainOptions) -> Self {
        Self { case, options, current: None, change_count: 0 }
    }

    /// Bring the derived state in line with `params`.
    ///
    /// Parameters
    /// ----------
    /// - `params`: full parameter vector of this evaluation.
    ///
    /// Returns
    /// -------
    /// The derived state for `params`. When every slot is within the
    /// tolerance of the accepted vector the existing state is returned
    /// without recomputation.
    pub fn refresh(&mut self, params: &ChainParams) -> &DerivedState {
        let tol = self.options.tolerance();
        let stale = match &self.current {
            Some(snap) if snap.accepted.approx_eq(params, tol) => false,
            Some(snap) => {
                if log::log_enabled!(log::Level::Debug) {
                    let changed: Vec<&str> =
                        snap.accepted.changed_slots(params, tol).iter().map(|p| p.name()).collect();
                    log::debug!(
                        "rebuilding derived state (change {}): {}",
                        self.change_count + 1,
                        changed.join(", ")
                    );
                }
                true
            }
            None => {
                log::debug!("building initial derived state");
                true
            }
        };
        if stale {
            self.current = None;
        }

        let case = &self.case;
        let options = &self.options;
        let counter = &mut self.change_count;
        let snap = self.current.get_or_insert_with(|| {
            *counter += 1;
            Snapshot { accepted: *params, state: DerivedState::compute(params, case, options) }
        });
        &snap.state
    }

    /// State of the last accepted vector, if any.
    pub fn state(&self) -> Option<&DerivedState> {
        self.current.as_ref().map(|snap| &snap.state)
    }

    /// Last accepted parameter vector, if any.
    pub fn accepted(&self) -> Option<&ChainParams> {
        self.current.as_ref().map(|snap| &snap.accepted)
    }

    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub fn case(&self) -> &CaseConstants {
        &self.case
    }

    pub fn options(&self) -> &ChainOptions {
        &self.options
    }
}
