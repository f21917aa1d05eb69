//! Integration tests for the simulation batch.

use approx::assert_relative_eq;

use wealthmc::core::types::{DriftMode, Phase, RebalanceCadence, ValuationMode};
use wealthmc::core::{PriceHistory, WealthError};
use wealthmc::metrics::MarketParameters;
use wealthmc::simulation::{
    run_batch, run_batch_with_cancel, simulate, CancellationToken, GbmPathGenerator,
    SimulationConfig,
};

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Three years of synthetic daily closes with different trends.
fn sample_history() -> PriceHistory {
    let n = 3 * 365;
    let mut a = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    let mut c = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64;
        a.push(100.0 + t * 0.05 + (t * 0.3).sin() * 2.0);
        b.push(50.0 + (t * 0.1).cos() * 3.0);
        c.push(20.0 + t * 0.01 + (t * 0.7).sin());
    }
    PriceHistory::from_columns(symbols(&["AAA", "BBB", "CCC"]), vec![a, b, c]).unwrap()
}

fn flat_history() -> PriceHistory {
    PriceHistory::from_columns(
        symbols(&["X", "Y"]),
        vec![vec![10.0; 30], vec![250.0; 30]],
    )
    .unwrap()
}

#[test]
fn test_flat_market_keeps_initial_capital() {
    let config = SimulationConfig::new(symbols(&["X", "Y"]))
        .with_initial_capital(1000.0)
        .with_inflation(0.0)
        .with_simulations(5);

    let result = run_batch(&flat_history(), &config).unwrap();

    for mode in [ValuationMode::Real, ValuationMode::Nominal] {
        for terminal in result.terminal(mode) {
            assert_eq!(terminal.iter().sum::<f64>(), 1000.0);
        }
        for path in result.trajectories(mode) {
            assert_eq!(path.len(), 366);
            assert!(path.iter().all(|&v| v == 1000.0));
        }
    }
}

#[test]
fn test_zero_drift_zero_volatility_parameters() {
    let config = SimulationConfig::new(symbols(&["A", "B"]))
        .with_initial_capital(1000.0)
        .with_inflation(0.0)
        .with_simulations(4);
    let params = MarketParameters::broadcast(0.0, 0.0, vec![37.0, 112.5]);

    let result = simulate(&params, &config, &CancellationToken::new()).unwrap();

    for run in 0..result.num_runs() {
        assert_eq!(result.terminal_real[run], vec![500.0, 500.0]);
        assert_eq!(result.terminal_nominal[run], vec![500.0, 500.0]);
    }
}

#[test]
fn test_deterministic_growth_and_inflation() {
    let mu = 0.073;
    let inflation = 2.0;
    let config = SimulationConfig::new(symbols(&["A", "B"]))
        .with_initial_capital(1000.0)
        .with_inflation(inflation)
        .with_simulations(2);
    let params = MarketParameters::broadcast(mu, 0.0, vec![10.0, 20.0]);

    let result = simulate(&params, &config, &CancellationToken::new()).unwrap();

    let growth = 1.0 + mu * config.dt;
    let discount = 1.0 - (inflation / 365.0) / 100.0;
    let nominal = &result.trajectory_nominal[0];
    let real = &result.trajectory_real[0];
    for (i, (&n, &r)) in nominal.iter().zip(real).enumerate() {
        assert_relative_eq!(n, 1000.0 * growth.powi(i as i32), max_relative = 1e-10);
        assert_relative_eq!(
            r,
            1000.0 * growth.powi(i as i32) * discount.powi(i as i32 + 1),
            max_relative = 1e-10
        );
    }
}

#[test]
fn test_zero_inflation_real_matches_nominal() {
    let config = SimulationConfig::new(symbols(&["AAA", "BBB", "CCC"]))
        .with_inflation(0.0)
        .with_phase(Phase::Accumulation, 10.0)
        .with_simulations(6);

    let result = run_batch(&sample_history(), &config).unwrap();

    assert_eq!(result.trajectory_real, result.trajectory_nominal);
    assert_eq!(result.terminal_real, result.terminal_nominal);
}

#[test]
fn test_positive_inflation_real_below_nominal() {
    let config = SimulationConfig::new(symbols(&["AAA", "BBB"]))
        .with_inflation(4.0)
        .with_simulations(6);

    let result = run_batch(&sample_history(), &config).unwrap();

    for (real, nominal) in result.trajectory_real.iter().zip(&result.trajectory_nominal) {
        for (r, n) in real.iter().zip(nominal) {
            assert!(r <= n);
        }
    }
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let history = sample_history();
    let config = SimulationConfig::new(symbols(&["AAA", "CCC"]))
        .with_horizon(2.0)
        .with_cadence(RebalanceCadence::Quarterly)
        .with_phase(Phase::Distribution, 5.0)
        .with_simulations(16)
        .with_seed(2024);

    let first = run_batch(&history, &config).unwrap();
    let second = run_batch(&history, &config).unwrap();
    assert_eq!(first, second);

    let other = run_batch(&history, &config.clone().with_seed(2025)).unwrap();
    assert_ne!(first.trajectory_nominal, other.trajectory_nominal);
}

#[test]
fn test_thread_count_does_not_change_results() {
    let history = sample_history();
    let config = SimulationConfig::new(symbols(&["AAA", "BBB", "CCC"])).with_simulations(12);

    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| run_batch(&history, &config))
        .unwrap();
    let multi = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap()
        .install(|| run_batch(&history, &config))
        .unwrap();

    assert_eq!(single, multi);
}

#[test]
fn test_runs_are_independent() {
    let config = SimulationConfig::new(symbols(&["AAA"])).with_simulations(3);
    let result = run_batch(&sample_history(), &config).unwrap();

    assert_ne!(result.trajectory_nominal[0], result.trajectory_nominal[1]);
    assert_ne!(result.trajectory_nominal[1], result.trajectory_nominal[2]);
}

#[test]
fn test_output_shapes() {
    let config = SimulationConfig::new(symbols(&["CCC", "AAA"]))
        .with_horizon(3.0)
        .with_simulations(7);
    let steps = GbmPathGenerator::new(3.0).unwrap().num_steps();

    let result = run_batch(&sample_history(), &config).unwrap();

    assert_eq!(result.assets, symbols(&["CCC", "AAA"]));
    assert_eq!(result.num_runs(), 7);
    assert_eq!(result.terminal_real.len(), 7);
    assert_eq!(result.terminal_nominal.len(), 7);
    assert!(result.terminal_real.iter().all(|row| row.len() == 2));
    assert!(result.trajectory_real.iter().all(|path| path.len() == steps));
    assert_eq!(steps, 1096);

    // Each trajectory ends at its run's terminal total.
    for (terminal, path) in result.terminal_nominal.iter().zip(&result.trajectory_nominal) {
        let total: f64 = terminal.iter().sum();
        assert_eq!(total, *path.last().unwrap());
    }

    let records = result.period_records(ValuationMode::Real);
    assert_eq!(records.len(), 7 * steps);
    assert_eq!(records[steps].simulation, 2);
    assert_eq!(records[steps].period, 1);
}

#[test]
fn test_per_asset_drift_mode() {
    let history = sample_history();
    let base = SimulationConfig::new(symbols(&["AAA", "BBB"])).with_simulations(4);

    let broadcast = run_batch(&history, &base).unwrap();
    let per_asset =
        run_batch(&history, &base.clone().with_drift_mode(DriftMode::PerAsset)).unwrap();

    assert_ne!(broadcast.terminal_nominal, per_asset.terminal_nominal);
}

#[test]
fn test_summary() {
    let config = SimulationConfig::new(symbols(&["X", "Y"]))
        .with_inflation(0.0)
        .with_simulations(3);
    let result = run_batch(&flat_history(), &config).unwrap();

    let summary = result.summary(ValuationMode::Nominal, Some(999.0)).unwrap();
    assert_eq!(summary.runs, 3);
    assert_relative_eq!(summary.total.mean, 1000.0, epsilon = 1e-9);
    assert_eq!(summary.total.std, 0.0);
    assert_eq!(summary.per_asset.len(), 2);
    assert_relative_eq!(summary.per_asset[0].best, 500.0, epsilon = 1e-9);
    assert_eq!(summary.target_probability_pct, Some(100.0));

    let unreachable = result.summary(ValuationMode::Nominal, Some(1000.0)).unwrap();
    assert_eq!(unreachable.target_probability_pct, Some(0.0));
}

#[test]
fn test_insufficient_history() {
    let history = PriceHistory::from_columns(symbols(&["X"]), vec![vec![10.0]]).unwrap();
    let config = SimulationConfig::new(symbols(&["X"]));

    let err = run_batch(&history, &config).unwrap_err();
    assert_eq!(
        err,
        WealthError::InsufficientData {
            required: 2,
            available: 1
        }
    );
}

#[test]
fn test_unknown_symbol() {
    let config = SimulationConfig::new(symbols(&["AAA", "ZZZ"]));
    let err = run_batch(&sample_history(), &config).unwrap_err();
    assert!(matches!(err, WealthError::InvalidParameter { .. }));
}

#[test]
fn test_invalid_weights_rejected_before_running() {
    let mut config = SimulationConfig::new(symbols(&["AAA", "BBB"]));
    config.weights = vec![0.6, 0.6];
    let err = run_batch(&sample_history(), &config).unwrap_err();
    assert!(matches!(err, WealthError::InvalidParameter { .. }));
}

#[test]
fn test_cancelled_batch_returns_no_results() {
    let token = CancellationToken::new();
    token.cancel();
    let config = SimulationConfig::new(symbols(&["AAA"])).with_simulations(50);

    let err = run_batch_with_cancel(&sample_history(), &config, &token).unwrap_err();
    assert_eq!(err, WealthError::Cancelled);
}

#[test]
fn test_oversized_horizon_rejected() {
    let config = SimulationConfig::new(symbols(&["AAA"])).with_horizon(1e30);
    let err = run_batch(&sample_history(), &config).unwrap_err();
    assert!(matches!(err, WealthError::InvalidParameter { .. }));
}

#[test]
fn test_gaps_in_history_are_forward_filled() {
    let mut gappy = vec![100.0; 40];
    gappy[10] = f64::NAN;
    gappy[25] = f64::NAN;
    let history =
        PriceHistory::from_columns(symbols(&["G", "H"]), vec![gappy, vec![5.0; 40]]).unwrap();
    let config = SimulationConfig::new(symbols(&["G", "H"]))
        .with_inflation(0.0)
        .with_simulations(2);

    let result = run_batch(&history, &config).unwrap();

    for terminal in result.terminal(ValuationMode::Nominal) {
        assert_eq!(terminal.iter().sum::<f64>(), 1000.0);
    }
}
