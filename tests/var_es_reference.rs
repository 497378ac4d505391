//! VaR / ES Reference Tests
//!
//! Reference values computed from analytical closed-form formulas
//! (McNeil, Frey, Embrechts (2015), Ex. 2.14 and 2.15).
//!
//! Standard normal: VaR_alpha = Phi^{-1}(alpha), ES_alpha = phi(Phi^{-1}(alpha)) / (1 - alpha)
//! Scaled N(mu, sigma) returns: VaR = -mu + sigma * Phi^{-1}(alpha), ES = -mu + sigma * ES_std
//! Student-t(nu): ES_std = f_nu(t) (nu + t^2) / ((1 - alpha)(nu - 1)), t = t_nu^{-1}(alpha)

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal, StudentT};
use tailrisk::TailRiskError;
use tailrisk::risk::{
    TailEstimator, fit_normal_params, fit_t_params, historical_es, historical_var,
    parametric_es_normal, parametric_es_t, parametric_var_normal, parametric_var_t,
};

struct NormalVarCase {
    alpha: f64,
    expected_var: f64,
    expected_es: f64,
}

fn standard_normal_cases() -> Vec<NormalVarCase> {
    vec![
        NormalVarCase {
            alpha: 0.90,
            expected_var: 1.2815515655446,
            expected_es: 1.7549833193249,
        },
        NormalVarCase {
            alpha: 0.95,
            expected_var: 1.6448536269515,
            expected_es: 2.0627128075074,
        },
        NormalVarCase {
            alpha: 0.975,
            expected_var: 1.9599639845401,
            expected_es: 2.3378027922014,
        },
        NormalVarCase {
            alpha: 0.99,
            expected_var: 2.3263478740408,
            expected_es: 2.6652142203458,
        },
        NormalVarCase {
            alpha: 0.995,
            expected_var: 2.5758293035489,
            expected_es: 2.8919486053835,
        },
    ]
}

// ============================================================================
// Normal
// ============================================================================

#[test]
fn standard_normal_var_es_reference() {
    for case in standard_normal_cases() {
        let var = parametric_var_normal(0.0, 1.0, case.alpha).unwrap();
        let es = parametric_es_normal(0.0, 1.0, case.alpha).unwrap();
        assert_relative_eq!(var, case.expected_var, epsilon = 1e-8);
        assert_relative_eq!(es, case.expected_es, epsilon = 1e-8);
    }
}

#[test]
fn scaled_normal_var_es_reference() {
    let (mu, sigma) = (0.0005, 0.012);
    for case in standard_normal_cases() {
        let var = parametric_var_normal(mu, sigma, case.alpha).unwrap();
        let es = parametric_es_normal(mu, sigma, case.alpha).unwrap();
        assert_abs_diff_eq!(var, -mu + sigma * case.expected_var, epsilon = 1e-10);
        assert_abs_diff_eq!(es, -mu + sigma * case.expected_es, epsilon = 1e-10);
    }
}

#[test]
fn zero_volatility_collapses_to_the_mean_loss() {
    assert_relative_eq!(parametric_var_normal(-0.01, 0.0, 0.99).unwrap(), 0.01);
    assert_relative_eq!(parametric_es_normal(-0.01, 0.0, 0.99).unwrap(), 0.01);
}

// ============================================================================
// Student-t
// ============================================================================

#[test]
fn student_t_five_dof_reference() {
    let var = parametric_var_t(5.0, 0.0, 1.0, 0.99).unwrap();
    let es = parametric_es_t(5.0, 0.0, 1.0, 0.99).unwrap();
    assert_relative_eq!(var, 3.364_929_998_822_305, epsilon = 1e-5);
    assert_relative_eq!(es, 4.452_429_112_129_727, epsilon = 1e-4);

    let scaled = parametric_var_t(5.0, 0.001, 0.01, 0.99).unwrap();
    assert_relative_eq!(scaled, -0.001 + 0.01 * var, epsilon = 1e-10);
}

#[test]
fn student_t_es_needs_more_than_one_dof() {
    assert!(matches!(
        parametric_es_t(0.8, 0.0, 1.0, 0.99),
        Err(TailRiskError::NonFiniteTailMean { .. })
    ));
    assert!(parametric_var_t(0.8, 0.0, 1.0, 0.99).unwrap().is_finite());
}

#[test]
fn fitted_student_t_feeds_parametric_estimator() {
    let mut rng = StdRng::seed_from_u64(17);
    let dist = StudentT::new(4.0).unwrap();
    let returns: Vec<f64> = (0..4000).map(|_| 0.0002 + 0.01 * dist.sample(&mut rng)).collect();

    let p = fit_t_params(&returns).unwrap();
    assert!((p.degrees_of_freedom - 4.0).abs() < 1.2, "nu = {}", p.degrees_of_freedom);

    let fitted = parametric_var_t(p.degrees_of_freedom, p.location, p.scale, 0.99).unwrap();
    let truth = parametric_var_t(4.0, 0.0002, 0.01, 0.99).unwrap();
    assert_relative_eq!(fitted, truth, max_relative = 0.08);
}

// ============================================================================
// Historical
// ============================================================================

#[test]
fn historical_fixture_reference() {
    // Sorted: [-0.10, -0.07, -0.05, -0.03, -0.02].
    let returns = [-0.05, -0.03, -0.07, -0.02, -0.10];
    // Rank 0.5 * 4 = 2 -> -0.05; tail {-0.10, -0.07, -0.05}.
    assert_relative_eq!(historical_var(&returns, 0.5).unwrap(), 0.05, epsilon = 1e-15);
    assert_relative_eq!(historical_es(&returns, 0.5).unwrap(), 0.22 / 3.0, epsilon = 1e-15);
}

#[test]
fn historical_matches_normal_on_large_gaussian_sample() {
    let mut rng = StdRng::seed_from_u64(5);
    let returns: Vec<f64> = (0..50_000)
        .map(|_| {
            let z: f64 = StandardNormal.sample(&mut rng);
            0.01 * z
        })
        .collect();

    let p = fit_normal_params(&returns).unwrap();
    assert_abs_diff_eq!(p.std_dev, 0.01, epsilon = 2e-4);
    assert_relative_eq!(
        historical_var(&returns, 0.99).unwrap(),
        parametric_var_normal(p.mean, p.std_dev, 0.99).unwrap(),
        max_relative = 0.04
    );
    assert_relative_eq!(
        historical_es(&returns, 0.99).unwrap(),
        parametric_es_normal(p.mean, p.std_dev, 0.99).unwrap(),
        max_relative = 0.05
    );
}

// ============================================================================
// Cross-estimator properties
// ============================================================================

#[test]
fn es_dominates_var_for_every_estimator() {
    let mut rng = StdRng::seed_from_u64(31);
    let dist = StudentT::new(3.5).unwrap();
    let returns: Vec<f64> = (0..2500).map(|_| 0.012 * dist.sample(&mut rng)).collect();

    for alpha in [0.95, 0.99] {
        for est in [
            TailEstimator::Historical,
            TailEstimator::Normal,
            TailEstimator::StudentT,
            TailEstimator::Evt { threshold: 0.02 },
        ] {
            let e = est.estimate(&returns, alpha).unwrap();
            assert!(
                e.es >= e.var,
                "{} alpha={alpha}: es {} < var {}",
                est.name(),
                e.es,
                e.var
            );
        }
    }
}
