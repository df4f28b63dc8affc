//! models — user-facing decay-chain models.
//!
//! - [`trap_model`]: [`TrapChainModel`], the cached observable aggregator
//!   (`observable`, `rate`, component breakdowns and curves).
//! - [`fit`]: [`ChainFit`], the log-likelihood callback over binned counts,
//!   with [`BinnedCounts`], [`CountStatistic`] and [`GoodnessOfFit`].
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule cover the aggregation formula, the
//!   observable/rate consistency, both count statistics and the
//!   goodness-of-fit bookkeeping. Integration tests under `tests/` drive
//!   the models through the argmin adapter and against a numerical ODE.

pub mod fit;
pub mod trap_model;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::fit::{BinnedCounts, ChainFit, CountStatistic, GoodnessOfFit};
pub use self::trap_model::{Component, ComponentRates, TrapChainModel, bin_scale, efficiency};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::fit::{BinnedCounts, ChainFit, CountStatistic, GoodnessOfFit};
    pub use super::trap_model::{Component, ComponentRates, TrapChainModel};
}
