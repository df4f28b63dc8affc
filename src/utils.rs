//! Python-side conversion helpers for the `python-bindings` feature.
//!
//! - [`extract_f64_array`]: numpy array, pandas Series or float sequence →
//!   contiguous read-only `f64` view.
//! - [`extract_params`]: dict of slot names or 20-element sequence →
//!   [`ChainParams`].
//! - [`build_chain_model`]: case code or JSON case file → [`TrapChainModel`].
#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::chain::{
    core::{case::CaseTable, options::ChainOptions, params::{ChainParams, Par}},
    models::trap_model::TrapChainModel,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Parameter vector from a `{name: value}` dict (unnamed slots are zero) or
/// a sequence in `param_names()` order.
#[cfg(feature = "python-bindings")]
pub fn extract_params<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>) -> PyResult<ChainParams> {
    if let Ok(dict) = raw.downcast::<PyDict>() {
        let mut params = ChainParams::new();
        for (key, value) in dict.iter() {
            let name: String = key.extract()?;
            let par: Par = name.parse()?;
            params[par] = value.extract()?;
        }
        return Ok(params);
    }
    let arr = extract_f64_array(py, raw)?;
    let values = arr
        .as_slice()
        .map_err(|_| PyValueError::new_err("params must be a 1-D contiguous float64 array"))?;
    Ok(ChainParams::from_slice(values)?)
}

/// Model for a builtin case code, or for a code of a JSON case file.
#[cfg(feature = "python-bindings")]
pub fn build_chain_model(
    case: &str, case_file: Option<&str>, tolerance: f64, tie_trapped_shift: bool,
) -> PyResult<TrapChainModel> {
    let table = match case_file {
        Some(path) => CaseTable::from_file(path)?,
        None => CaseTable::builtin(),
    };
    let options = ChainOptions::new(tolerance, tie_trapped_shift)?;
    Ok(TrapChainModel::from_case(&table, case, options)?)
}
