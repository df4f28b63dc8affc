//! Parameter vector — named, fixed-size fit parameters for the chain model.
//!
//! Purpose
//! -------
//! Represent the fit parameters as an enum-indexed container so that every
//! consumer (cache, evaluators, optimizer glue, reporting) addresses slots
//! by name and indices can never be out of range.
//!
//! Key behaviors
//! -------------
//! - [`Par`] names the 20 slots in their stable order.
//! - [`ChainParams`] stores one `f64` per slot, indexable by [`Par`].
//! - Length is checked once when building from a raw slice
//!   ([`ChainParams::from_slice`]); afterwards no call can fail on layout.
//! - [`ChainParams::validate_physical`] is an optional session-setup check
//!   of physical ranges; evaluation itself never rejects values.
//! - [`FreeParams`] maps an optimizer vector θ onto the free subset of slots,
//!   holding the others at a base vector.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ChainParams` always holds exactly [`Par::COUNT`] values.
//! - `FreeParams` lists each free slot once and at least one slot.
//!
//! Conventions
//! -----------
//! - `p`: fraction of produced ions captured into the trap.
//! - `rho`: fraction of trapped ions retained across a reload.
//! - `r1..r3`: production rates per generation, ions/ms.
//! - `gammaT*`, `gammaU*`: decay-rate shifts (1/s) of trapped/untrapped ions.
//! - `eps*`: detection efficiencies per sub-population.
//! - `DC`: background rate, counts/ms. `dt`: bin width, ms. `nCyc`: number of
//!   summed cycles.
//!
//! Testing notes
//! -------------
//! - Unit tests cover slot naming/parsing, slice length checks, tolerance
//!   comparison and the θ ↔ parameter mapping.
use crate::chain::{
    core::{
        case::{CaseConstants, Generation},
        sigma::modified_lifetime,
        validation::validate_theta,
    },
    errors::{ParamError, ParamResult},
};
use ndarray::{Array1, ArrayView1};
use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

/// Named parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Par {
    P,
    Rho,
    R1,
    R2,
    R3,
    GammaT1,
    GammaT2,
    GammaT3,
    GammaU1,
    GammaU2,
    GammaU3,
    EpsT,
    EpsV,
    EpsW,
    EpsZ,
    EpsX,
    EpsY,
    Dc,
    Dt,
    NCyc,
}

impl Par {
    pub const COUNT: usize = 20;

    /// Every slot in layout order.
    pub const ALL: [Par; Par::COUNT] = [
        Par::P,
        Par::Rho,
        Par::R1,
        Par::R2,
        Par::R3,
        Par::GammaT1,
        Par::GammaT2,
        Par::GammaT3,
        Par::GammaU1,
        Par::GammaU2,
        Par::GammaU3,
        Par::EpsT,
        Par::EpsV,
        Par::EpsW,
        Par::EpsZ,
        Par::EpsX,
        Par::EpsY,
        Par::Dc,
        Par::Dt,
        Par::NCyc,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Par::P => "p",
            Par::Rho => "rho",
            Par::R1 => "r1",
            Par::R2 => "r2",
            Par::R3 => "r3",
            Par::GammaT1 => "gammaT1",
            Par::GammaT2 => "gammaT2",
            Par::GammaT3 => "gammaT3",
            Par::GammaU1 => "gammaU1",
            Par::GammaU2 => "gammaU2",
            Par::GammaU3 => "gammaU3",
            Par::EpsT => "epsT",
            Par::EpsV => "epsV",
            Par::EpsW => "epsW",
            Par::EpsZ => "epsZ",
            Par::EpsX => "epsX",
            Par::EpsY => "epsY",
            Par::Dc => "DC",
            Par::Dt => "dt",
            Par::NCyc => "nCyc",
        }
    }

    /// Production-rate slot of a generation.
    pub const fn production(generation: Generation) -> Par {
        match generation {
            Generation::First => Par::R1,
            Generation::Second => Par::R2,
            Generation::Third => Par::R3,
        }
    }

    /// Trapped rate-shift slot of a generation.
    pub const fn gamma_trapped(generation: Generation) -> Par {
        match generation {
            Generation::First => Par::GammaT1,
            Generation::Second => Par::GammaT2,
            Generation::Third => Par::GammaT3,
        }
    }

    /// Untrapped rate-shift slot of a generation.
    pub const fn gamma_untrapped(generation: Generation) -> Par {
        match generation {
            Generation::First => Par::GammaU1,
            Generation::Second => Par::GammaU2,
            Generation::Third => Par::GammaU3,
        }
    }
}

impl fmt::Display for Par {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Par {
    type Err = ParamError;

    /// Parse a slot name case-insensitively (`"gammaT1"`, `"GAMMAT1"`, `"dc"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Par::ALL
            .iter()
            .copied()
            .find(|par| par.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParamError::UnknownParameter { name: s.to_string() })
    }
}

/// Full parameter vector, one value per [`Par`] slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainParams {
    values: [f64; Par::COUNT],
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainParams {
    /// All slots set to zero.
    pub const fn new() -> Self {
        Self { values: [0.0; Par::COUNT] }
    }

    /// Build from a raw slice in [`Par::ALL`] order.
    ///
    /// # Errors
    /// [`ParamError::LengthMismatch`] when `values.len() != Par::COUNT`.
    pub fn from_slice(values: &[f64]) -> ParamResult<Self> {
        let values: [f64; Par::COUNT] = values.try_into().map_err(|_| {
            ParamError::LengthMismatch { expected: Par::COUNT, actual: values.len() }
        })?;
        Ok(Self { values })
    }

    /// Build from named assignments; unnamed slots are zero.
    pub fn from_pairs<I: IntoIterator<Item = (Par, f64)>>(pairs: I) -> Self {
        let mut params = Self::new();
        for (par, value) in pairs {
            params[par] = value;
        }
        params
    }

    /// Copy with one slot replaced.
    pub fn with(mut self, par: Par, value: f64) -> Self {
        self[par] = value;
        self
    }

    pub fn get(&self, par: Par) -> f64 {
        self.values[par.index()]
    }

    pub fn set(&mut self, par: Par, value: f64) {
        self.values[par.index()] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Par, f64)> + '_ {
        Par::ALL.iter().map(move |&par| (par, self.values[par.index()]))
    }

    pub fn production(&self, generation: Generation) -> f64 {
        self[Par::production(generation)]
    }

    pub fn gamma_trapped(&self, generation: Generation) -> f64 {
        self[Par::gamma_trapped(generation)]
    }

    pub fn gamma_untrapped(&self, generation: Generation) -> f64 {
        self[Par::gamma_untrapped(generation)]
    }

    /// Copy with `gammaT3` tied to `gammaT2`.
    pub fn with_tied_trapped_shift(self) -> Self {
        let tied = self[Par::GammaT2];
        self.with(Par::GammaT3, tied)
    }

    /// `true` when every slot differs from `other` by at most `tol`.
    ///
    /// NaN in either vector compares unequal, so a cache fed a vector that
    /// contains NaN rebuilds on every refresh. A change from a finite value
    /// to NaN is always detected.
    pub fn approx_eq(&self, other: &ChainParams, tol: f64) -> bool {
        self.values.iter().zip(other.values.iter()).all(|(a, b)| (a - b).abs() <= tol)
    }

    /// Slots whose values differ from `other` by more than `tol`.
    pub fn changed_slots(&self, other: &ChainParams, tol: f64) -> Vec<Par> {
        Par::ALL.iter().copied().filter(|&par| !((self[par] - other[par]).abs() <= tol)).collect()
    }

    /// Check physical ranges for a case.
    ///
    /// Checks
    /// ------
    /// - every slot finite;
    /// - `0 ≤ p ≤ 1`, `0 ≤ rho ≤ 1`;
    /// - production rates, efficiencies, `DC` and `nCyc` non-negative;
    /// - `dt > 0`;
    /// - every modified lifetime finite and > 0.
    ///
    /// `rho = 0` passes, but the reload-loss sum is only trustworthy for
    /// `rho ≳ 1e-6`: below that its regularization bias reaches percent
    /// level and becomes O(1) near `rho = 1e-8` (see
    /// [`sigma`](crate::chain::core::sigma)). Pin `rho` away from zero when
    /// the W populations matter.
    ///
    /// # Errors
    /// The first failing check as [`ParamError::NonFiniteParameter`],
    /// [`ParamError::OutOfRange`] or [`ParamError::NonPositiveModifiedLifetime`].
    pub fn validate_physical(&self, case: &CaseConstants) -> ParamResult<()> {
        for (par, value) in self.iter() {
            if !value.is_finite() {
                return Err(ParamError::NonFiniteParameter { name: par.name(), value });
            }
        }
        for par in [Par::P, Par::Rho] {
            let value = self[par];
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamError::OutOfRange {
                    name: par.name(),
                    value,
                    reason: "Fractions must lie in [0, 1].",
                });
            }
        }
        for par in [
            Par::R1,
            Par::R2,
            Par::R3,
            Par::EpsT,
            Par::EpsV,
            Par::EpsW,
            Par::EpsZ,
            Par::EpsX,
            Par::EpsY,
            Par::Dc,
            Par::NCyc,
        ] {
            if self[par] < 0.0 {
                return Err(ParamError::OutOfRange {
                    name: par.name(),
                    value: self[par],
                    reason: "Rates, efficiencies and counts must be non-negative.",
                });
            }
        }
        if self[Par::Dt] <= 0.0 {
            return Err(ParamError::OutOfRange {
                name: Par::Dt.name(),
                value: self[Par::Dt],
                reason: "Bin width must be strictly positive.",
            });
        }
        for generation in Generation::ALL {
            let tau = case.lifetime(generation);
            for par in [Par::gamma_trapped(generation), Par::gamma_untrapped(generation)] {
                let modified = modified_lifetime(tau, self[par]);
                if !modified.is_finite() || modified <= 0.0 {
                    return Err(ParamError::NonPositiveModifiedLifetime {
                        name: par.name(),
                        value: modified,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Index<Par> for ChainParams {
    type Output = f64;

    fn index(&self, par: Par) -> &f64 {
        &self.values[par.index()]
    }
}

impl IndexMut<Par> for ChainParams {
    fn index_mut(&mut self, par: Par) -> &mut f64 {
        &mut self.values[par.index()]
    }
}

/// Mapping between an optimizer vector θ and the full parameter vector.
///
/// θ holds the free slots in the order given at construction; all other
/// slots keep their value from `base`.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeParams {
    base: ChainParams,
    free: Vec<Par>,
}

impl FreeParams {
    /// # Errors
    /// - [`ParamError::EmptyFreeSet`] when `free` is empty.
    /// - [`ParamError::DuplicateFreeParameter`] when a slot repeats.
    pub fn new(base: ChainParams, free: Vec<Par>) -> ParamResult<Self> {
        if free.is_empty() {
            return Err(ParamError::EmptyFreeSet);
        }
        for (i, par) in free.iter().enumerate() {
            if free[..i].contains(par) {
                return Err(ParamError::DuplicateFreeParameter { name: par.name() });
            }
        }
        Ok(Self { base, free })
    }

    /// Parse free slot names, e.g. from a Python or CLI front-end.
    ///
    /// # Errors
    /// [`ParamError::UnknownParameter`] for an unknown name, otherwise as
    /// [`FreeParams::new`].
    pub fn from_names<S: AsRef<str>>(base: ChainParams, names: &[S]) -> ParamResult<Self> {
        let free = names.iter().map(|n| n.as_ref().parse::<Par>()).collect::<ParamResult<Vec<_>>>()?;
        Self::new(base, free)
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn slots(&self) -> &[Par] {
        &self.free
    }

    pub fn base(&self) -> &ChainParams {
        &self.base
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.free.iter().map(|p| p.name()).collect()
    }

    /// θ read from the base vector.
    pub fn theta(&self) -> Array1<f64> {
        self.free.iter().map(|&par| self.base[par]).collect()
    }

    /// Full parameter vector for θ.
    ///
    /// # Errors
    /// [`ParamError::ThetaLengthMismatch`] or [`ParamError::InvalidThetaInput`].
    pub fn expand(&self, theta: ArrayView1<f64>) -> ParamResult<ChainParams> {
        validate_theta(theta, self.free.len())?;
        let mut params = self.base;
        for (&par, &value) in self.free.iter().zip(theta.iter()) {
            params[par] = value;
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Check that slot names are unique, ordered and parse back.
    //
    // Given
    // -----
    // - `Par::ALL`.
    //
    // Expect
    // ------
    // - `index()` equals the position in `ALL`.
    // - Each name parses back to its slot, ignoring case.
    // - Unknown names fail with `UnknownParameter`.
    fn par_names_round_trip() {
        for (i, par) in Par::ALL.iter().enumerate() {
            assert_eq!(par.index(), i);
            assert_eq!(par.name().parse::<Par>().unwrap(), *par);
            assert_eq!(par.name().to_uppercase().parse::<Par>().unwrap(), *par);
        }
        assert_eq!("nCyc".parse::<Par>().unwrap(), Par::NCyc);
        assert!(matches!("gamma".parse::<Par>(), Err(ParamError::UnknownParameter { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Ensure raw slices are accepted only with the exact slot count.
    //
    // Given
    // -----
    // - Slices of length 20, 19 and 21.
    //
    // Expect
    // ------
    // - Length 20 maps positionally; the others fail fast.
    fn from_slice_checks_length() {
        let raw: Vec<f64> = (0..Par::COUNT).map(|i| i as f64).collect();
        let params = ChainParams::from_slice(&raw).unwrap();
        assert_eq!(params[Par::P], 0.0);
        assert_eq!(params[Par::GammaU1], 8.0);
        assert_eq!(params[Par::NCyc], 19.0);
        assert_eq!(
            ChainParams::from_slice(&raw[..19]),
            Err(ParamError::LengthMismatch { expected: 20, actual: 19 })
        );
        let mut long = raw.clone();
        long.push(0.0);
        assert!(ChainParams::from_slice(&long).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Verify tolerance comparison and changed-slot reporting.
    //
    // Given
    // -----
    // - A vector and copies nudged below and above a 1e-9 tolerance, and one
    //   with a NaN slot.
    //
    // Expect
    // ------
    // - Nudge below tolerance compares equal; above it reports that slot.
    // - NaN never compares equal.
    fn approx_eq_uses_absolute_tolerance() {
        let a = ChainParams::new().with(Par::Rho, 0.8).with(Par::R1, 0.5);
        let below = a.with(Par::Rho, 0.8 + 5e-10);
        let above = a.with(Par::R1, 0.5 + 1e-6);
        assert!(a.approx_eq(&below, 1e-9));
        assert!(!a.approx_eq(&above, 1e-9));
        assert_eq!(a.changed_slots(&above, 1e-9), vec![Par::R1]);
        let nan = a.with(Par::Dc, f64::NAN);
        assert!(!a.approx_eq(&nan, 1e-9));
        assert_eq!(a.changed_slots(&nan, 1e-9), vec![Par::Dc]);
    }

    #[test]
    // Purpose
    // -------
    // Exercise physical-range validation.
    //
    // Given
    // -----
    // - A valid vector for a simple case, then copies with p > 1, dt = 0 and
    //   a shift large and negative enough to flip a modified lifetime.
    //
    // Expect
    // ------
    // - The valid vector passes; each broken copy fails with its variant.
    fn validate_physical_reports_first_violation() {
        let case = CaseConstants::new([1000.0, 2000.0, 3000.0], 100.0, 200.0, 1000.0).unwrap();
        let ok = ChainParams::from_pairs([(Par::P, 0.5), (Par::Rho, 0.9), (Par::Dt, 10.0)]);
        assert!(ok.validate_physical(&case).is_ok());
        assert!(matches!(
            ok.with(Par::P, 1.5).validate_physical(&case),
            Err(ParamError::OutOfRange { name: "p", .. })
        ));
        assert!(matches!(
            ok.with(Par::Dt, 0.0).validate_physical(&case),
            Err(ParamError::OutOfRange { name: "dt", .. })
        ));
        assert!(matches!(
            ok.with(Par::GammaU2, -1.0).validate_physical(&case),
            Err(ParamError::NonPositiveModifiedLifetime { name: "gammaU2", .. })
        ));
        assert!(matches!(
            ok.with(Par::EpsY, f64::NAN).validate_physical(&case),
            Err(ParamError::NonFiniteParameter { name: "epsY", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Check the θ ↔ parameter mapping of `FreeParams`.
    //
    // Given
    // -----
    // - A base vector and free slots [rho, DC].
    //
    // Expect
    // ------
    // - `theta()` reads the base values in order.
    // - `expand` writes θ into the free slots only.
    // - Wrong-length θ, empty and duplicated free sets are rejected.
    fn free_params_map_theta() {
        let base = ChainParams::from_pairs([(Par::Rho, 0.8), (Par::Dc, 0.01), (Par::P, 0.9)]);
        let free = FreeParams::from_names(base, &["rho", "DC"]).unwrap();
        assert_eq!(free.theta(), array![0.8, 0.01]);
        assert_eq!(free.names(), vec!["rho", "DC"]);

        let expanded = free.expand(array![0.7, 0.02].view()).unwrap();
        assert_eq!(expanded[Par::Rho], 0.7);
        assert_eq!(expanded[Par::Dc], 0.02);
        assert_eq!(expanded[Par::P], 0.9);

        assert!(matches!(
            free.expand(array![0.7].view()),
            Err(ParamError::ThetaLengthMismatch { expected: 2, actual: 1 })
        ));
        assert_eq!(FreeParams::new(base, vec![]), Err(ParamError::EmptyFreeSet));
        assert!(matches!(
            FreeParams::new(base, vec![Par::Rho, Par::Rho]),
            Err(ParamError::DuplicateFreeParameter { name: "rho" })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Check tying of the generation-3 trapped shift.
    //
    // Given
    // -----
    // - gammaT2 = 0.03 and gammaT3 = 0.01.
    //
    // Expect
    // ------
    // - The tied copy has gammaT3 = 0.03 and leaves the original untouched.
    fn tied_shift_copies_generation_two() {
        let params = ChainParams::from_pairs([(Par::GammaT2, 0.03), (Par::GammaT3, 0.01)]);
        let tied = params.with_tied_trapped_shift();
        assert_eq!(tied[Par::GammaT3], 0.03);
        assert_eq!(params[Par::GammaT3], 0.01);
    }
}
