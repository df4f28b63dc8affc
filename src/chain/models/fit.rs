//! Chain fit objective — binned counts, count statistics and the
//! log-likelihood callback handed to an external optimizer.
//!
//! Purpose
//! -------
//! Wire a [`TrapChainModel`] to the [`LogLikelihood`] interface so any
//! argmin-style driver can fit a measured time spectrum. The driver moves a
//! vector θ of free parameters; every evaluation expands θ into the full
//! parameter vector and sums a per-bin statistic over the spectrum.
//!
//! Key behaviors
//! -------------
//! - [`CountStatistic::Poisson`]: `ℓ = Σ n·ln μ − μ − ln Γ(n+1)`; a bin with
//!   `μ ≤ 0` is an error since the likelihood is undefined there.
//! - [`CountStatistic::Neyman`]: `ℓ = −χ²/2` with
//!   `χ² = Σ (n − μ)²/max(n, 1)`.
//! - [`ChainFit::goodness_of_fit`] reports χ² (Neyman weights), degrees of
//!   freedom `bins − free`, reduced χ² and the χ² upper-tail p-value.
//!
//! Invariants & assumptions
//! ------------------------
//! - The model (and therefore the cache) is owned by the fit: one cache per
//!   fit session. It sits in a `RefCell` because `LogLikelihood::value`
//!   takes `&self`; a `ChainFit` is therefore not `Sync`.
//! - All bins of one evaluation share θ, so the cache rebuilds at most once
//!   per evaluation.
//!
//! Testing notes
//! -------------
//! - Unit tests check both statistics on hand-computed values, the
//!   validation in `check`, and the goodness-of-fit bookkeeping. Adapter
//!   wiring is covered in `tests/`.
use crate::{
    chain::{
        core::{
            params::{ChainParams, FreeParams},
            validation::validate_counts,
        },
        errors::{ChainError, ChainResult},
        models::trap_model::TrapChainModel,
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, LogLikelihood, Theta},
    },
};
use ndarray::{Array1, ArrayView1};
use statrs::{
    distribution::{ChiSquared, ContinuousCDF},
    function::gamma::ln_gamma,
};
use std::{cell::RefCell, str::FromStr};

/// Measured time spectrum: bin centres (ms) and counts.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedCounts {
    times: Array1<f64>,
    counts: Array1<f64>,
}

impl BinnedCounts {
    /// # Errors
    /// Any error of [`validate_counts`].
    pub fn new(times: Array1<f64>, counts: Array1<f64>) -> ChainResult<Self> {
        validate_counts(times.view(), counts.view())?;
        Ok(Self { times, counts })
    }

    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    pub fn counts(&self) -> ArrayView1<'_, f64> {
        self.counts.view()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Per-bin statistic of a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStatistic {
    Poisson,
    Neyman,
}

impl FromStr for CountStatistic {
    type Err = ChainError;

    /// Case-insensitive `"poisson"` or `"neyman"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poisson" => Ok(CountStatistic::Poisson),
            "neyman" => Ok(CountStatistic::Neyman),
            _ => Err(ChainError::UnknownStatistic { name: s.to_string() }),
        }
    }
}

/// Neyman χ² contribution of one bin.
fn neyman_term(n: f64, mu: f64) -> f64 {
    (n - mu).powi(2) / n.max(1.0)
}

/// Goodness-of-fit summary at one θ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoodnessOfFit {
    pub chi_square: f64,
    /// `bins − free parameters` (saturating at 0).
    pub dof: usize,
    /// `χ²/dof`; `None` when `dof == 0`.
    pub reduced_chi_square: Option<f64>,
    /// `P(χ²_dof ≥ χ²)`; `None` when `dof == 0`.
    pub p_value: Option<f64>,
}

/// Log-likelihood of a decay-chain spectrum over the free parameters.
#[derive(Debug)]
pub struct ChainFit {
    model: RefCell<TrapChainModel>,
    free: FreeParams,
    statistic: CountStatistic,
}

impl ChainFit {
    pub fn new(model: TrapChainModel, free: FreeParams, statistic: CountStatistic) -> Self {
        Self { model: RefCell::new(model), free, statistic }
    }

    pub fn free_params(&self) -> &FreeParams {
        &self.free
    }

    pub fn statistic(&self) -> CountStatistic {
        self.statistic
    }

    /// Derived-state rebuilds of the owned model so far.
    pub fn change_count(&self) -> u64 {
        self.model.borrow().change_count()
    }

    /// Full parameter vector for θ.
    ///
    /// # Errors
    /// θ length or finiteness errors, as [`OptError`].
    pub fn expand(&self, theta: &Theta) -> OptResult<ChainParams> {
        Ok(self.free.expand(theta.view())?)
    }

    /// Expected counts of every bin at θ.
    pub fn predict(&self, theta: &Theta, data: &BinnedCounts) -> OptResult<Array1<f64>> {
        let params = self.expand(theta)?;
        Ok(self.model.borrow_mut().observable_curve(&params, data.times()))
    }

    /// χ² summary at θ using Neyman weights.
    ///
    /// # Errors
    /// θ errors, or [`OptError::InvalidModelInput`] if the χ² distribution
    /// cannot be built.
    pub fn goodness_of_fit(&self, theta: &Theta, data: &BinnedCounts) -> OptResult<GoodnessOfFit> {
        let predicted = self.predict(theta, data)?;
        let chi_square: f64 =
            data.counts().iter().zip(predicted.iter()).map(|(&n, &mu)| neyman_term(n, mu)).sum();
        let dof = data.len().saturating_sub(self.free.len());
        if dof == 0 {
            return Ok(GoodnessOfFit { chi_square, dof, reduced_chi_square: None, p_value: None });
        }
        let dist = ChiSquared::new(dof as f64)
            .map_err(|e| OptError::InvalidModelInput { text: e.to_string() })?;
        Ok(GoodnessOfFit {
            chi_square,
            dof,
            reduced_chi_square: Some(chi_square / dof as f64),
            p_value: Some(1.0 - dist.cdf(chi_square)),
        })
    }
}

impl LogLikelihood for ChainFit {
    type Data = BinnedCounts;

    /// Log-likelihood of the spectrum at θ.
    ///
    /// # Errors
    /// - θ length or finiteness errors.
    /// - [`OptError::InvalidPrediction`] for a Poisson bin with `μ ≤ 0`.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost> {
        let predicted = self.predict(theta, data)?;
        let counts = data.counts();
        match self.statistic {
            CountStatistic::Poisson => {
                let mut total = 0.0;
                for (index, (&n, &mu)) in counts.iter().zip(predicted.iter()).enumerate() {
                    if !(mu > 0.0) {
                        return Err(OptError::InvalidPrediction { index, value: mu });
                    }
                    total += n * mu.ln() - mu - ln_gamma(n + 1.0);
                }
                Ok(total)
            }
            CountStatistic::Neyman => {
                let chi_square: f64 =
                    counts.iter().zip(predicted.iter()).map(|(&n, &mu)| neyman_term(n, mu)).sum();
                Ok(-0.5 * chi_square)
            }
        }
    }

    /// Validate θ and the physical ranges of its expansion.
    ///
    /// Intended for session setup: evaluation itself never range-checks.
    fn check(&self, theta: &Theta, _data: &Self::Data) -> OptResult<()> {
        let params = self.expand(theta)?;
        let model = self.model.borrow();
        params.validate_physical(model.case())?;
        Ok(())
    }
}
