//! Case constants — per-chain lifetimes and cycle timing, plus the case table.
//!
//! Purpose
//! -------
//! Describe one measured decay chain (three generations) and the timing of
//! its trap cycle. A [`CaseRecord`] is the persisted, human-facing form
//! (half-lives with uncertainties, member names); [`CaseConstants`] is the
//! validated numeric view the engine consumes.
//!
//! Key behaviors
//! -------------
//! - Convert half-lives into nominal lifetimes (`τ = t½ / ln 2`).
//! - Validate timings once, at construction (`0 < capture period ≤
//!   background start ≤ cycle length`, bounded injection count).
//! - Provide the cycle geometry used by every evaluator: injection index,
//!   elapsed time in the current capture interval, window membership.
//! - Load case tables from JSON via serde, or use the builtin table.
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`CaseConstants`] value is immutable and valid for its whole lifetime.
//! - Cycle layout: free decay starts at `t = 0`; captures start at
//!   `background_start` and repeat every `capture_period` until
//!   `cycle_length`, when trapped ions are ejected and the cycle restarts.
//!
//! Conventions
//! -----------
//! - All times are milliseconds.
//! - Generations are addressed with [`Generation`] (parent, daughter,
//!   granddaughter).
//!
//! Downstream usage
//! ----------------
//! - Build a model with `CaseTable::builtin().get("137i07")?.constants()?`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover lifetime conversion, the builtin case, JSON round trips
//!   through the loader, and the interval geometry at boundaries.
use crate::chain::{
    core::validation::{
        validate_half_life, validate_injection_count, validate_lifetime, validate_timings,
    },
    errors::{ChainError, ChainResult},
};
use serde::{Deserialize, Serialize};
use std::{f64::consts::LN_2, path::Path};

/// One member of the three-generation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Generation {
    First,
    Second,
    Third,
}

impl Generation {
    pub const ALL: [Generation; 3] = [Generation::First, Generation::Second, Generation::Third];

    /// 0-based position in the chain.
    pub const fn index(self) -> usize {
        match self {
            Generation::First => 0,
            Generation::Second => 1,
            Generation::Third => 2,
        }
    }

    /// Generation that feeds this one, if any.
    pub const fn parent(self) -> Option<Generation> {
        match self {
            Generation::First => None,
            Generation::Second => Some(Generation::First),
            Generation::Third => Some(Generation::Second),
        }
    }
}

/// Reference half-life with its one-sigma uncertainty (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfLife {
    pub value_ms: f64,
    #[serde(default)]
    pub uncertainty_ms: f64,
}

impl HalfLife {
    pub const fn new(value_ms: f64, uncertainty_ms: f64) -> Self {
        Self { value_ms, uncertainty_ms }
    }

    /// Mean lifetime `t½ / ln 2`.
    pub fn lifetime(&self) -> f64 {
        self.value_ms / LN_2
    }

    /// Lifetime uncertainty `σ(t½) / ln 2`.
    pub fn lifetime_uncertainty(&self) -> f64 {
        self.uncertainty_ms / LN_2
    }
}

/// Persisted description of one measurement case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub code: String,
    /// Data file the case was measured into; informational only.
    #[serde(default)]
    pub data_file: Option<String>,
    pub members: [String; 3],
    pub capture_period_ms: f64,
    /// Time between the last capture and ejection; informational only.
    #[serde(default)]
    pub last_capture_ms: f64,
    pub background_start_ms: f64,
    pub cycle_length_ms: f64,
    pub half_lives: [HalfLife; 3],
}

impl CaseRecord {
    /// Build the validated numeric constants for this case.
    ///
    /// # Errors
    /// - [`ChainError::InvalidHalfLife`] for unusable half-lives.
    /// - Any timing error from [`CaseConstants::new`].
    pub fn constants(&self) -> ChainResult<CaseConstants> {
        for (g, half_life) in self.half_lives.iter().enumerate() {
            validate_half_life(g, half_life.value_ms, half_life.uncertainty_ms)?;
        }
        CaseConstants::new(
            [
                self.half_lives[0].lifetime(),
                self.half_lives[1].lifetime(),
                self.half_lives[2].lifetime(),
            ],
            self.capture_period_ms,
            self.background_start_ms,
            self.cycle_length_ms,
        )
    }

    /// Nominal lifetime uncertainty of a generation (milliseconds).
    pub fn lifetime_uncertainty(&self, generation: Generation) -> f64 {
        self.half_lives[generation.index()].lifetime_uncertainty()
    }

    /// Name of the chain member for a generation.
    pub fn member(&self, generation: Generation) -> &str {
        &self.members[generation.index()]
    }
}

/// Validated numeric case constants used by the engine.
///
/// Fields are private so the timing invariants established by
/// [`CaseConstants::new`] cannot be broken afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseConstants {
    lifetimes: [f64; 3],
    capture_period: f64,
    background_start: f64,
    cycle_length: f64,
}

impl CaseConstants {
    /// Construct validated case constants.
    ///
    /// Parameters
    /// ----------
    /// - `lifetimes`: nominal (unshifted) mean lifetimes of the three
    ///   generations, milliseconds.
    /// - `capture_period`: spacing of successive injections.
    /// - `background_start`: time of the first injection in the cycle.
    /// - `cycle_length`: time of ejection and cycle restart.
    ///
    /// Errors
    /// ------
    /// - [`ChainError::NonPositiveLifetime`] for a lifetime that is not
    ///   finite and > 0.
    /// - [`ChainError::InvalidTiming`] / [`ChainError::TimingOrder`] for
    ///   malformed timings.
    /// - [`ChainError::TooManyInjections`] when the capture window holds more
    ///   than [`MAX_INJECTIONS`](crate::chain::core::validation::MAX_INJECTIONS)
    ///   intervals.
    pub fn new(
        lifetimes: [f64; 3], capture_period: f64, background_start: f64, cycle_length: f64,
    ) -> ChainResult<Self> {
        for (g, &tau) in lifetimes.iter().enumerate() {
            validate_lifetime(g, tau)?;
        }
        validate_timings(capture_period, background_start, cycle_length)?;
        let case = Self { lifetimes, capture_period, background_start, cycle_length };
        validate_injection_count(case.injection_count())?;
        Ok(case)
    }

    pub fn lifetime(&self, generation: Generation) -> f64 {
        self.lifetimes[generation.index()]
    }

    pub fn lifetimes(&self) -> [f64; 3] {
        self.lifetimes
    }

    pub fn capture_period(&self) -> f64 {
        self.capture_period
    }

    pub fn background_start(&self) -> f64 {
        self.background_start
    }

    pub fn cycle_length(&self) -> f64 {
        self.cycle_length
    }

    /// Number of capture intervals started within one cycle.
    pub fn injection_count(&self) -> usize {
        ((self.cycle_length - self.background_start) / self.capture_period).ceil() as usize
    }

    /// `0 ≤ t ≤ cycle_length`: carried-over populations decay freely.
    pub fn in_cycle(&self, t: f64) -> bool {
        0.0 <= t && t <= self.cycle_length
    }

    /// `(background_start, cycle_length)`: bounds of the capture window.
    pub fn capture_window(&self) -> (f64, f64) {
        (self.background_start, self.cycle_length)
    }

    /// `background_start ≤ t ≤ cycle_length`: captures are running.
    pub fn in_capture_window(&self, t: f64) -> bool {
        self.background_start <= t && t <= self.cycle_length
    }

    /// Index `n = ceil((t − background_start)/capture_period)` of the capture
    /// interval containing `t`.
    ///
    /// `n = 0` at `t = background_start` exactly, so every capture term
    /// vanishes there and the regime switch is continuous from the left.
    pub fn injection_index(&self, t: f64) -> i32 {
        ((t - self.background_start) / self.capture_period).ceil() as i32
    }

    /// Start time of capture interval `k` (1-based).
    pub fn injection_start(&self, k: i32) -> f64 {
        self.background_start + f64::from(k - 1) * self.capture_period
    }

    /// Time elapsed since the start of capture interval `n`.
    pub fn elapsed_in_interval(&self, t: f64, n: i32) -> f64 {
        t - self.injection_start(n)
    }
}

/// Lookup table of measurement cases, keyed by case code.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTable {
    records: Vec<CaseRecord>,
}

impl CaseTable {
    /// Table with the cases shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            records: vec![CaseRecord {
                code: "137i07".to_string(),
                data_file: Some("137i07.root".to_string()),
                members: ["137-Te".to_string(), "137-I".to_string(), "137-Xe".to_string()],
                capture_period_ms: 6000.0,
                last_capture_ms: 1000.0,
                background_start_ms: 101000.0,
                cycle_length_ms: 246000.0,
                half_lives: [
                    HalfLife::new(1000.0 * 2.49, 1000.0 * 0.05),
                    HalfLife::new(1000.0 * 24.5, 1000.0 * 0.20),
                    HalfLife::new(60.0 * 1000.0 * 3.818, 60.0 * 1000.0 * 0.013),
                ],
            }],
        }
    }

    /// Parse a JSON array of [`CaseRecord`]s.
    ///
    /// Every record is validated; the first invalid record aborts the load.
    ///
    /// # Errors
    /// - [`ChainError::CaseFileParse`] for malformed JSON.
    /// - [`ChainError::DuplicateCase`] when two records share a code.
    /// - Any validation error from [`CaseRecord::constants`].
    pub fn from_json(text: &str) -> ChainResult<Self> {
        let records: Vec<CaseRecord> = serde_json::from_str(text)?;
        for (i, record) in records.iter().enumerate() {
            if records[..i].iter().any(|r| r.code == record.code) {
                log::warn!("case table rejected: duplicate code '{}'", record.code);
                return Err(ChainError::DuplicateCase { code: record.code.clone() });
            }
            if let Err(err) = record.constants() {
                log::warn!("case table rejected: case '{}': {err}", record.code);
                return Err(err);
            }
        }
        log::info!("loaded case table with {} case(s)", records.len());
        Ok(Self { records })
    }

    /// Read and parse a JSON case table from disk.
    ///
    /// # Errors
    /// [`ChainError::CaseFileRead`] when the file cannot be read, otherwise as
    /// [`CaseTable::from_json`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> ChainResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| ChainError::CaseFileRead {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json(&contents)
    }

    /// Serialize the table as pretty JSON.
    pub fn to_json(&self) -> ChainResult<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Look up a case by code.
    ///
    /// # Errors
    /// [`ChainError::UnknownCase`] if no record has this code.
    pub fn get(&self, code: &str) -> ChainResult<&CaseRecord> {
        self.records
            .iter()
            .find(|r| r.code == code)
            .ok_or_else(|| ChainError::UnknownCase { code: code.to_string() })
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.code.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
