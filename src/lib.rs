//! rust_decaychain — cached analytic population model of a three-generation
//! decay chain in a periodically reloaded ion trap, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the model to Python via the `_rust_decaychain` extension module.
//! A fit driver calls the model once per time bin for every candidate
//! parameter vector; the model caches everything that depends only on the
//! vector so repeated evaluation inside a fit loop stays cheap.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`chain`, `optimization`) as the
//!   public crate surface.
//! - With `python-bindings`, define the `ChainModel` class and register the
//!   `decay_chain` submodule under `_rust_decaychain` so dotted imports work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion and error mapping.
//! - The library installs no logger. Rust hosts pick one for the `log`
//!   facade; tests use `env_logger`.
//!
//! Conventions
//! -----------
//! - Times in milliseconds, rate shifts in 1/s.
//! - Errors are rich Rust enums internally and become `ValueError` at the
//!   PyO3 boundary.
//!
//! Testing notes
//! -------------
//! - Unit tests sit next to each module; `tests/` holds the ODE
//!   cross-check, cache-contract, adapter and property tests.

pub mod chain;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::IntoPyArray;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    chain::{
        core::{case::Generation, params::Par},
        models::trap_model::{Component, TrapChainModel},
    },
    utils::{build_chain_model, extract_f64_array, extract_params},
};

/// ChainModel — Python-facing wrapper around [`TrapChainModel`].
///
/// Constructed as `ChainModel(case="137i07", case_file=None,
/// tolerance=1e-9, tie_trapped_shift=False)`. `params` arguments accept a
/// `{name: value}` dict or a 20-element array in `param_names()` order;
/// `t` accepts a float or a 1-D array.
///
/// The wrapped model owns its cache, so one `ChainModel` belongs to one fit
/// session.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_decaychain.decay_chain", unsendable)]
pub struct ChainModel {
    inner: TrapChainModel,
}

#[cfg(feature = "python-bindings")]
impl ChainModel {
    /// Scalar or vectorized evaluation of `f` over `t`.
    fn evaluate<'py, F>(
        &mut self, py: Python<'py>, params: &Bound<'py, PyAny>, t: &Bound<'py, PyAny>, f: F,
    ) -> PyResult<PyObject>
    where
        F: Fn(&mut TrapChainModel, &crate::chain::core::params::ChainParams, f64) -> f64,
    {
        let params = extract_params(py, params)?;
        if let Ok(time) = t.extract::<f64>() {
            let value = f(&mut self.inner, &params, time);
            return Ok(pyo3::types::PyFloat::new(py, value).into_any().unbind());
        }
        let times = extract_f64_array(py, t)?;
        let values = times.as_array().mapv(|time| f(&mut self.inner, &params, time));
        Ok(values.into_pyarray(py).into_any().unbind())
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ChainModel {
    #[new]
    #[pyo3(
        signature = (case = "137i07", case_file = None, tolerance = 1e-9, tie_trapped_shift = false),
        text_signature = "(case='137i07', /, case_file=None, tolerance=1e-9, tie_trapped_shift=False)"
    )]
    pub fn new(
        case: &str, case_file: Option<&str>, tolerance: f64, tie_trapped_shift: bool,
    ) -> PyResult<Self> {
        Ok(ChainModel { inner: build_chain_model(case, case_file, tolerance, tie_trapped_shift)? })
    }

    /// Expected counts per bin, `nCyc·dt·rate`.
    pub fn observable<'py>(
        &mut self, py: Python<'py>, params: &Bound<'py, PyAny>, t: &Bound<'py, PyAny>,
    ) -> PyResult<PyObject> {
        self.evaluate(py, params, t, |m, p, time| m.observable(p, time))
    }

    /// Instantaneous count rate (counts/ms).
    pub fn rate<'py>(
        &mut self, py: Python<'py>, params: &Bound<'py, PyAny>, t: &Bound<'py, PyAny>,
    ) -> PyResult<PyObject> {
        self.evaluate(py, params, t, |m, p, time| m.rate(p, time))
    }

    /// Background plus one generation's trapped (`trapped=True`) or
    /// untrapped contribution, scaled like `observable`.
    #[pyo3(signature = (params, t, generation, trapped))]
    pub fn component_observable<'py>(
        &mut self, py: Python<'py>, params: &Bound<'py, PyAny>, t: &Bound<'py, PyAny>,
        generation: usize, trapped: bool,
    ) -> PyResult<PyObject> {
        let g = match generation {
            1 => Generation::First,
            2 => Generation::Second,
            3 => Generation::Third,
            other => {
                return Err(pyo3::exceptions::PyValueError::new_err(format!(
                    "generation must be 1, 2 or 3, got {other}"
                )));
            }
        };
        let component = if trapped { Component::Trapped(g) } else { Component::Untrapped(g) };
        self.evaluate(py, params, t, |m, p, time| m.component_observable(p, component, time))
    }

    /// Parameter slot names in vector order.
    #[staticmethod]
    pub fn param_names() -> Vec<&'static str> {
        Par::ALL.iter().map(|p| p.name()).collect()
    }

    /// Number of derived-state rebuilds so far.
    #[getter]
    pub fn change_count(&self) -> u64 {
        self.inner.change_count()
    }
}

/// _rust_decaychain — PyO3 module initializer.
///
/// Creates the `decay_chain` submodule, attaches it to `_rust_decaychain`
/// and registers it in `sys.modules` so `rust_decaychain.decay_chain` is
/// importable with dot notation.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_decaychain<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let decay_chain_mod = PyModule::new(_py, "decay_chain")?;
    decay_chain(_py, m, &decay_chain_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_decaychain.decay_chain", decay_chain_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn decay_chain<'py>(
    _py: Python, rust_decaychain: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<ChainModel>()?;
    rust_decaychain.add_submodule(m)?;
    Ok(())
}
