//! Property-based tests for the decay-chain model using proptest.
//!
//! Covers: non-negativity of every sub-population, cycle periodicity of the
//! untrapped populations, rate bookkeeping, and history independence of the
//! parameter cache.

use proptest::prelude::*;
use rust_decaychain::chain::{
    core::{
        case::{CaseTable, Generation},
        options::ChainOptions,
        params::{ChainParams, Par},
        populations::Species,
    },
    models::trap_model::{TrapChainModel, bin_scale, efficiency},
};

const SAMPLE_TIMES: [f64; 11] = [
    0.0, 1000.0, 50_000.0, 100_999.0, 101_001.0, 103_000.0, 130_000.0, 180_000.0, 230_000.0,
    245_500.0, 246_000.0,
];

fn builtin_model() -> TrapChainModel {
    TrapChainModel::from_case(&CaseTable::builtin(), "137i07", ChainOptions::default())
        .expect("builtin case should build a model")
}

/// Physically admissible vectors. Trapped and untrapped shifts are drawn
/// independently, so either may be the larger; they are kept 1e-6 1/s apart,
/// well above the regularization scale. Retention hits both ends of [0, 1].
fn chain_params() -> impl Strategy<Value = ChainParams> {
    (
        0.0f64..=1.0,
        prop_oneof![Just(0.0f64), Just(1.0f64), 0.0f64..=1.0],
        prop::array::uniform3(0.01f64..2.0),
        prop::array::uniform3(0.0f64..0.05),
        prop::array::uniform3(0.0f64..0.05),
        prop::array::uniform6(0.0f64..1.0),
        0.0f64..0.1,
    )
        .prop_filter(
            "shifts within a generation must differ",
            |(_, _, _, gamma_t, gamma_u, _, _)| {
                gamma_t.iter().zip(gamma_u).all(|(t, u)| (t - u).abs() > 1e-6)
            },
        )
        .prop_map(|(p, rho, r, gamma_t, gamma_u, eff, dc)| {
            let mut params = ChainParams::from_pairs([
                (Par::P, p),
                (Par::Rho, rho),
                (Par::Dc, dc),
                (Par::Dt, 100.0),
                (Par::NCyc, 20.0),
            ]);
            for g in Generation::ALL {
                let i = g.index();
                params[Par::production(g)] = r[i];
                params[Par::gamma_trapped(g)] = gamma_t[i];
                params[Par::gamma_untrapped(g)] = gamma_u[i];
            }
            for (s, e) in Species::ALL.iter().zip(eff) {
                params[efficiency(*s)] = e;
            }
            params
        })
}

fn magnitude(params: &ChainParams) -> f64 {
    let r_max = Generation::ALL.iter().map(|&g| params.production(g)).fold(0.0, f64::max);
    r_max * 6000.0 * 30.0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every sub-population stays non-negative across the cycle, up to
    /// round-off relative to the population scale.
    #[test]
    fn populations_are_non_negative(params in chain_params()) {
        let mut model = builtin_model();
        let floor = -1e-9 * magnitude(&params);
        for &t in SAMPLE_TIMES.iter() {
            for g in Generation::ALL {
                for s in Species::ALL {
                    let value = model.population(&params, s, g, t);
                    prop_assert!(value.is_finite(), "{}{:?} at {} is {}", s, g, t, value);
                    prop_assert!(value >= floor, "{}{:?} at {} is {}", s, g, t, value);
                }
            }
        }
        prop_assert_eq!(model.change_count(), 1);
    }

    /// Untrapped populations return to their start value at the end of the
    /// cycle.
    #[test]
    fn untrapped_populations_close_over_a_cycle(params in chain_params()) {
        let mut model = builtin_model();
        let t_cyc = model.case().cycle_length();
        let tol = 1e-9 * magnitude(&params);
        for g in Generation::ALL {
            for s in Species::UNTRAPPED {
                let start = model.population(&params, s, g, 0.0);
                let end = model.population(&params, s, g, t_cyc);
                prop_assert!((start - end).abs() <= tol, "{}{:?}: {} vs {}", s, g, start, end);
            }
        }
    }

    /// The rate is the background plus efficiency-weighted decays, and the
    /// observable scales it by nCyc·dt.
    #[test]
    fn rate_is_weighted_sum_of_decays(params in chain_params(), t in 0.0f64..246_000.0) {
        let mut model = builtin_model();
        let lifetimes = model.case().lifetimes();
        let mut expected = params[Par::Dc];
        for g in Generation::ALL {
            for s in Species::ALL {
                expected += params[efficiency(s)] * model.population(&params, s, g, t)
                    / lifetimes[g.index()];
            }
        }
        let rate = model.rate(&params, t);
        prop_assert!((rate - expected).abs() <= 1e-12 * expected.abs().max(1.0));
        let observable = model.observable(&params, t);
        prop_assert!((observable - bin_scale(&params) * rate).abs() <= 1e-12 * observable.abs().max(1.0));
    }

    /// Results depend only on the current vector, never on what the cache
    /// saw before.
    #[test]
    fn cache_is_history_independent(
        first in chain_params(),
        second in chain_params(),
        t in 0.0f64..246_000.0,
    ) {
        let mut warm = builtin_model();
        warm.observable(&first, t);
        let after_history = warm.observable(&second, t);
        let mut cold = builtin_model();
        prop_assert_eq!(after_history, cold.observable(&second, t));
    }
}
