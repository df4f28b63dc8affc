//! Integration tests for the decay-chain population model and its objective.
//!
//! Purpose
//! -------
//! - Cross-check the closed-form populations against a direct numerical
//!   integration of the underlying decay equations with injection events.
//! - Validate the cache contract and the observable scaling seen by a fit
//!   driver.
//! - Exercise the objective end to end through the argmin adapter.
//!
//! Coverage
//! --------
//! - `chain::core`:
//!   - Builtin case table, steady-state initial values, time-domain regimes
//!     of all eighteen sub-populations, including the feeding populations.
//! - `chain::models::trap_model::TrapChainModel`:
//!   - Rebuild counting, history independence, observable vs rate.
//! - `chain::models::fit::ChainFit` with `optimization::loglik_optimizer`:
//!   - Cost sign, finite-difference gradient and error propagation.
//!
//! Exclusions
//! ----------
//! - Low-level sigma sums, coefficient formulas and validation helpers are
//!   covered by unit tests.
//! - Python bindings are tested at the Python level.
use argmin::core::{CostFunction, Gradient};
use ndarray::{Array1, array};
use rust_decaychain::{
    chain::{
        core::{
            case::{CaseConstants, CaseTable, Generation},
            options::ChainOptions,
            params::{ChainParams, FreeParams, Par},
            populations::Species,
            sigma::modified_lifetime,
        },
        models::{
            fit::{BinnedCounts, ChainFit, CountStatistic},
            trap_model::TrapChainModel,
        },
    },
    optimization::{
        errors::OptError,
        loglik_optimizer::{adapter::ArgMinAdapter, traits::LogLikelihood},
    },
};

const STEP_MS: f64 = 4.0;
const CYCLES: usize = 25;

/// Integrated state: one row per species in [`Species::ALL`] order, one
/// column per generation.
type ChainState = [[f64; 3]; 6];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn builtin_case() -> CaseConstants {
    CaseTable::builtin()
        .get("137i07")
        .expect("builtin table should contain 137i07")
        .constants()
        .expect("builtin case should validate")
}

fn builtin_model() -> TrapChainModel {
    TrapChainModel::from_case(&CaseTable::builtin(), "137i07", ChainOptions::default())
        .expect("builtin case should build a model")
}

/// Purpose
/// -------
/// Parameter vector with every generation produced and non-trivial rate
/// shifts, so all sub-populations are populated.
fn shifted_params() -> ChainParams {
    ChainParams::from_pairs([
        (Par::P, 0.9),
        (Par::Rho, 0.8),
        (Par::R1, 0.5),
        (Par::R2, 0.3),
        (Par::R3, 0.2),
        (Par::GammaT1, 0.05),
        (Par::GammaT2, 0.02),
        (Par::GammaT3, 0.01),
        (Par::GammaU1, 0.02),
        (Par::GammaU2, 0.005),
        (Par::GammaU3, 0.003),
        (Par::EpsT, 0.5),
        (Par::EpsV, 0.4),
        (Par::EpsW, 0.4),
        (Par::EpsZ, 0.4),
        (Par::EpsX, 0.3),
        (Par::EpsY, 0.3),
        (Par::Dc, 0.01),
        (Par::Dt, 100.0),
        (Par::NCyc, 20.0),
    ])
}

/// Same production and efficiencies with every rate shift zero.
fn unshifted_params() -> ChainParams {
    let mut params = shifted_params();
    for g in Generation::ALL {
        params[Par::gamma_trapped(g)] = 0.0;
        params[Par::gamma_untrapped(g)] = 0.0;
    }
    params
}

/// Purpose
/// -------
/// Integrate the full three-generation decay equations over enough cycles
/// to reach the periodic steady state and record the state of the last
/// cycle at selected step indices.
///
/// Model
/// -----
/// Per generation `g`, with modified lifetimes `τT`, `τU` and nominal `τ`:
/// - `T' = −T/τT`, `V' = −V/τU`, `W' = −W/τU`, `Z' = γT/1000·T − Z/τU`.
/// - `X_{g+1}' = T_g/τ_g − X_{g+1}/τU_{g+1}`.
/// - `Y_{g+1}' = (V_g + W_g + Z_g + X_g + Y_g)/τ_g − Y_{g+1}/τU_{g+1}`.
/// - At each injection `k`: for `k ≥ 2` a fraction `1 − ρ` of T moves to W,
///   then T gains `r·tCap·p` and V gains `r·tCap·(1 − p)`.
/// - T is ejected at the end of every cycle.
///
/// Returns
/// -------
/// - One state per requested step index, taken after any injection at that
///   instant.
fn integrate_chain(
    case: &CaseConstants, params: &ChainParams, record_steps: &[usize],
) -> Vec<ChainState> {
    const T: usize = 0;
    const V: usize = 1;
    const W: usize = 2;
    const Z: usize = 3;
    const X: usize = 4;
    const Y: usize = 5;

    let tau = case.lifetimes();
    let mut tau_t = [0.0; 3];
    let mut tau_u = [0.0; 3];
    let mut loss = [0.0; 3];
    for g in Generation::ALL {
        let i = g.index();
        tau_t[i] = modified_lifetime(tau[i], params.gamma_trapped(g));
        tau_u[i] = modified_lifetime(tau[i], params.gamma_untrapped(g));
        loss[i] = params.gamma_trapped(g) / 1000.0;
    }

    let rhs = |y: &ChainState| -> ChainState {
        let mut d = [[0.0; 3]; 6];
        for g in 0..3 {
            d[T][g] = -y[T][g] / tau_t[g];
            d[V][g] = -y[V][g] / tau_u[g];
            d[W][g] = -y[W][g] / tau_u[g];
            d[Z][g] = loss[g] * y[T][g] - y[Z][g] / tau_u[g];
        }
        for g in 1..3 {
            let parent = g - 1;
            let untrapped: f64 = [V, W, Z, X, Y].iter().map(|&s| y[s][parent]).sum();
            d[X][g] = y[T][parent] / tau[parent] - y[X][g] / tau_u[g];
            d[Y][g] = untrapped / tau[parent] - y[Y][g] / tau_u[g];
        }
        d
    };
    let axpy = |y: &ChainState, k: &ChainState, h: f64| -> ChainState {
        let mut out = *y;
        for (row, k_row) in out.iter_mut().zip(k) {
            for (value, slope) in row.iter_mut().zip(k_row) {
                *value += h * slope;
            }
        }
        out
    };

    let steps = (case.cycle_length() / STEP_MS).round() as usize;
    let first_injection = (case.background_start() / STEP_MS).round() as usize;
    let period_steps = (case.capture_period() / STEP_MS).round() as usize;
    let p = params[Par::P];
    let rho = params[Par::Rho];
    let produced: Vec<f64> =
        Generation::ALL.iter().map(|&g| params.production(g) * case.capture_period()).collect();

    let mut y: ChainState = [[0.0; 3]; 6];
    let mut records = vec![[[0.0; 3]; 6]; record_steps.len()];
    for cycle in 0..CYCLES {
        for i in 0..=steps {
            if i >= first_injection && i < steps && (i - first_injection) % period_steps == 0 {
                for g in 0..3 {
                    if i > first_injection {
                        y[W][g] += (1.0 - rho) * y[T][g];
                        y[T][g] *= rho;
                    }
                    y[T][g] += produced[g] * p;
                    y[V][g] += produced[g] * (1.0 - p);
                }
            }
            if cycle + 1 == CYCLES {
                for (slot, &at) in record_steps.iter().enumerate() {
                    if at == i {
                        records[slot] = y;
                    }
                }
            }
            if i < steps {
                let k1 = rhs(&y);
                let k2 = rhs(&axpy(&y, &k1, STEP_MS / 2.0));
                let k3 = rhs(&axpy(&y, &k2, STEP_MS / 2.0));
                let k4 = rhs(&axpy(&y, &k3, STEP_MS));
                for s in 0..6 {
                    for g in 0..3 {
                        y[s][g] += STEP_MS / 6.0
                            * (k1[s][g] + 2.0 * k2[s][g] + 2.0 * k3[s][g] + k4[s][g]);
                    }
                }
            }
        }
        y[T] = [0.0; 3];
    }
    records
}

fn assert_matches_ode(params: ChainParams) {
    let case = builtin_case();
    let mut model = builtin_model();
    // Step indices at 0, 50 s, 101.5 s, 130 s, 200 s, 245.996 s and 246 s;
    // none falls on an injection instant after the first.
    let record_steps = [0usize, 12_500, 25_375, 32_500, 50_000, 61_499, 61_500];
    let records = integrate_chain(&case, &params, &record_steps);
    let scale = params[Par::R1] * case.capture_period();

    for (&step, ode) in record_steps.iter().zip(records.iter()) {
        let t = step as f64 * STEP_MS;
        for (row, s) in Species::ALL.into_iter().enumerate() {
            for g in Generation::ALL {
                if !s.exists_for(g) {
                    continue;
                }
                let closed = model.population(&params, s, g, t);
                let o = ode[row][g.index()];
                let err = (closed - o).abs();
                assert!(
                    err <= 1e-6 * o.abs() + 1e-9 * scale,
                    "{s}{} at t = {t}: closed form {closed} vs ODE {o}",
                    g.index() + 1
                );
            }
        }
    }
    assert_eq!(model.change_count(), 1);
}

#[test]
// Purpose
// -------
// Cross-check the steady-state closed form against direct integration with
// every rate shift at zero.
//
// Given
// -----
// - The builtin 137i07 case (lifetimes ≈ 3.6 s / 35.3 s / 330.5 s,
//   tCap = 6000 ms, tBac = 101000 ms, tCyc = 246000 ms).
// - RK4 over 25 cycles with a 4 ms step, starting from an empty trap.
//
// Expect
// ------
// - Every sub-population of every generation agrees with the integration
//   within 1e-6 relative error, at the cycle start, in the free-decay
//   window and across the capture window.
fn closed_form_matches_ode_without_rate_shifts() {
    init_logging();
    assert_matches_ode(unshifted_params());
}

#[test]
// Purpose
// -------
// Same cross-check with non-zero trapped and untrapped rate shifts.
//
// Given
// -----
// - γT = (0.05, 0.02, 0.01) 1/s, γU = (0.02, 0.005, 0.003) 1/s.
//
// Expect
// ------
// - Agreement within 1e-6 relative error, including the loss-fed Z and the
//   feeding populations Y₂, Y₃.
fn closed_form_matches_ode_with_rate_shifts() {
    init_logging();
    assert_matches_ode(shifted_params());
}

#[test]
// Purpose
// -------
// Cross-check at low retention, where most trapped ions are released into
// W at each reload and feed the next generation from there.
//
// Given
// -----
// - The shifted vector with ρ = 0.3.
//
// Expect
// ------
// - Agreement within 1e-6 relative error for every sub-population.
fn closed_form_matches_ode_at_low_retention() {
    init_logging();
    assert_matches_ode(shifted_params().with(Par::Rho, 0.3));
}

#[test]
// Purpose
// -------
// Cross-check with full retention and no shift on generation 1, so Z₁
// vanishes and Y₃ is fed only through V₁ → Y₂ and the second generation.
//
// Given
// -----
// - ρ = 1, γT₁ = γU₁ = 0, other shifts as in the shifted vector.
//
// Expect
// ------
// - Agreement within 1e-6 relative error; W vanishes everywhere.
fn closed_form_matches_ode_at_full_retention() {
    init_logging();
    let params = shifted_params()
        .with(Par::Rho, 1.0)
        .with(Par::GammaT1, 0.0)
        .with(Par::GammaU1, 0.0);
    assert_matches_ode(params);
    let mut model = builtin_model();
    for g in Generation::ALL {
        assert_eq!(model.population(&params, Species::W, g, 200_000.0), 0.0);
    }
}

#[test]
// Purpose
// -------
// Verify that the untrapped populations close on themselves over a cycle
// and that the trap is empty outside the capture window.
//
// Given
// -----
// - The shifted parameter vector on the builtin case.
//
// Expect
// ------
// - Every untrapped sub-population has value(0) == value(tCyc) within 1e-9
//   relative error.
// - T is zero in the free-decay window and every species is zero after
//   the cycle ends.
fn cycle_is_periodic_and_bounded() {
    init_logging();
    let params = shifted_params();
    let mut model = builtin_model();
    let t_cyc = model.case().cycle_length();
    for g in Generation::ALL {
        for s in Species::UNTRAPPED {
            let start = model.population(&params, s, g, 0.0);
            let end = model.population(&params, s, g, t_cyc);
            assert!((start - end).abs() <= 1e-9 * (1.0 + start.abs()), "{s} gen {g:?}");
        }
        assert_eq!(model.population(&params, Species::T, g, 50_000.0), 0.0);
        for s in Species::ALL {
            assert_eq!(model.population(&params, s, g, t_cyc + 1.0), 0.0);
        }
    }
}

#[test]
// Purpose
// -------
// Check the cache contract seen by a fit driver.
//
// Given
// -----
// - Repeated evaluations at one vector, sub-tolerance and super-tolerance
//   perturbations, and a second model evaluated only at the final vector.
//
// Expect
// ------
// - One rebuild per accepted change, none for repeats or sub-tolerance
//   jitter.
// - Results depend only on the current vector, not on the history.
fn cache_rebuilds_only_on_accepted_changes() {
    init_logging();
    let params = shifted_params();
    let mut model = builtin_model();
    assert_eq!(model.change_count(), 0);

    let first = model.observable(&params, 150_000.0);
    for t in [0.0, 110_000.0, 150_000.0, 240_000.0] {
        model.observable(&params, t);
    }
    assert_eq!(model.change_count(), 1);
    assert_eq!(model.observable(&params, 150_000.0), first);

    let jitter = params.with(Par::Rho, params[Par::Rho] + 1e-12);
    model.observable(&jitter, 150_000.0);
    assert_eq!(model.change_count(), 1);

    let moved = params.with(Par::GammaU2, 0.006);
    let after_history = model.observable(&moved, 150_000.0);
    assert_eq!(model.change_count(), 2);

    let mut fresh = builtin_model();
    assert_eq!(fresh.observable(&moved, 150_000.0), after_history);
}

#[test]
// Purpose
// -------
// Confirm the observable is the rate scaled by the bin exposure and that
// the curve helpers agree with pointwise evaluation.
//
// Given
// -----
// - nCyc = 20, dt = 100 ms and a grid of bin centers.
//
// Expect
// ------
// - observable(t) == 2000 · rate(t) for every t.
// - Between cycles only the background remains: rate == DC.
fn observable_scales_rate_by_exposure() {
    init_logging();
    let params = shifted_params();
    let mut model = builtin_model();
    let times = Array1::linspace(50.0, 245_950.0, 64);
    let rates = model.rate_curve(&params, times.view());
    let observed = model.observable_curve(&params, times.view());
    for ((&t, &r), &o) in times.iter().zip(rates.iter()).zip(observed.iter()) {
        assert!((o - 2000.0 * r).abs() <= 1e-12 * o.abs(), "t = {t}");
        assert!(r >= params[Par::Dc]);
    }
    assert_eq!(model.rate(&params, 300_000.0), params[Par::Dc]);
}

#[test]
// Purpose
// -------
// Drive the Poisson objective through the argmin adapter.
//
// Given
// -----
// - Free slots (r1, DC) on the shifted vector.
// - Synthetic counts at twice the predicted mean on 32 bins.
//
// Expect
// ------
// - cost(θ) == −ℓ(θ).
// - The finite-difference gradient along DC matches
//   −nCyc·dt·Σ(n/μ − 1) within 1e-5 relative error.
// - Finite-difference evaluations are accepted parameter changes and trigger rebuilds.
fn adapter_exposes_chain_objective() {
    init_logging();
    let free = FreeParams::new(shifted_params(), vec![Par::R1, Par::Dc])
        .expect("free slots should be distinct");
    let fit = ChainFit::new(builtin_model(), free, CountStatistic::Poisson);
    let theta = fit.free_params().theta();

    let times = Array1::linspace(101_500.0, 245_500.0, 32);
    let template = BinnedCounts::new(times.clone(), Array1::zeros(32)).expect("valid bins");
    let mu = fit.predict(&theta, &template).expect("prediction at θ₀");
    let counts = mu.mapv(|m| (2.0 * m).round());
    let data = BinnedCounts::new(times, counts.clone()).expect("valid bins");

    let adapter = ArgMinAdapter::new(&fit, &data);
    let cost = adapter.cost(&theta).expect("cost at θ₀");
    let loglik = fit.value(&theta, &data).expect("log-likelihood at θ₀");
    assert_eq!(cost, -loglik);

    let rebuilds_before = fit.change_count();
    let grad = adapter.gradient(&theta).expect("finite-difference gradient");
    assert_eq!(grad.len(), 2);
    assert!(fit.change_count() > rebuilds_before);

    let expected_dc: f64 =
        -2000.0 * counts.iter().zip(mu.iter()).map(|(&n, &m)| n / m - 1.0).sum::<f64>();
    assert!(
        (grad[1] - expected_dc).abs() <= 1e-5 * expected_dc.abs(),
        "dc gradient {} vs {expected_dc}",
        grad[1]
    );
    assert!(grad[0].is_finite());
}

#[test]
// Purpose
// -------
// Check that objective errors cross the argmin boundary intact.
//
// Given
// -----
// - A θ of the wrong length and a θ that zeroes every source of counts.
//
// Expect
// ------
// - `OptError::ThetaLengthMismatch` and `OptError::InvalidPrediction`
//   recovered from the argmin error.
fn adapter_preserves_objective_errors() {
    init_logging();
    let free = FreeParams::new(shifted_params(), vec![Par::R1, Par::Dc])
        .expect("free slots should be distinct");
    let fit = ChainFit::new(builtin_model(), free, CountStatistic::Poisson);
    let data = BinnedCounts::new(array![300_000.0], array![3.0]).expect("valid bins");
    let adapter = ArgMinAdapter::new(&fit, &data);

    let err = adapter.cost(&array![0.5]).expect_err("length mismatch");
    assert_eq!(OptError::from(err), OptError::ThetaLengthMismatch { expected: 2, actual: 1 });

    let err = adapter.cost(&array![0.5, 0.0]).expect_err("zero prediction");
    assert_eq!(OptError::from(err), OptError::InvalidPrediction { index: 0, value: 0.0 });
}
