//! VaR Backtest Reference Tests
//!
//! Kupiec (1995): LR_uc = -2 [n1 ln(pi0) + (n-n1) ln(1-pi0) - n1 ln(pi_hat) - (n-n1) ln(1-pi_hat)].
//! Christoffersen (1998) independence: LR_ind = -2 (ln L(pi) - ln L(pi01, pi11)).
//! Reference values computed by hand with 0 * ln(0) = 0 and chi-square(1) tails
//! P(X > x) = erfc(sqrt(x / 2)).
//!
//! Alternating 0,1,0,1,... of length 10:
//!   n01 = 5, n10 = 4, n00 = n11 = 0 -> pi01 = 1, pi11 = 0, pi = 5/9
//!   LR_ind = -2 (5 ln(5/9) + 4 ln(4/9)) = 12.365308378751820, p = 4.373853160859073e-4
//!   LR_uc (alpha = 0.95, n1 = 5, n = 10) = 16.607312068216505, p = 4.597343462880895e-5

use approx::assert_relative_eq;
use chrono::NaiveDate;
use tailrisk::risk::{
    LikelihoodRatio, TransitionCounts, backtest_var, christoffersen_test, kupiec_test,
};
use tailrisk::series::{DailySeries, TimeSeries};

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.checked_add_days(chrono::Days::new(offset as u64)))
        .unwrap()
}

fn daily(values: &[f64]) -> DailySeries {
    TimeSeries::new(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (day(i as u32), *v))
            .collect(),
    )
    .unwrap()
}

/// Returns that breach a flat 2% VaR where `pattern` is true.
fn pattern_returns(pattern: &[bool]) -> Vec<f64> {
    pattern
        .iter()
        .map(|&hit| if hit { -0.035 } else { 0.004 })
        .collect()
}

fn alternating(n: usize) -> Vec<bool> {
    (0..n).map(|i| i % 2 == 1).collect()
}

#[test]
fn kupiec_without_exceedances_is_undefined_but_counted() {
    let returns = daily(&[0.001; 100]);
    let var = daily(&[0.02; 100]);
    let res = kupiec_test(&returns, &var, 0.99).unwrap();

    assert_eq!(res.likelihood_ratio, LikelihoodRatio::Undefined);
    assert_eq!(res.likelihood_ratio.statistic(), None);
    assert_eq!(res.likelihood_ratio.p_value(), None);
    assert_eq!(res.exceedances, 0);
    assert_eq!(res.observations, 100);
    assert_relative_eq!(res.expected_exceedances, 1.0, epsilon = 1e-12);
}

#[test]
fn alternating_pattern_transition_counts() {
    let returns = daily(&pattern_returns(&alternating(10)));
    let var = daily(&[0.02; 10]);
    let res = christoffersen_test(&returns, &var, 0.95).unwrap();

    assert_eq!(
        res.transitions,
        TransitionCounts {
            n00: 0,
            n01: 5,
            n10: 4,
            n11: 0
        }
    );
}

#[test]
fn christoffersen_and_kupiec_differ_on_alternating_pattern() {
    let returns = daily(&pattern_returns(&alternating(10)));
    let var = daily(&[0.02; 10]);

    let ind = christoffersen_test(&returns, &var, 0.95).unwrap();
    let uc = kupiec_test(&returns, &var, 0.95).unwrap();

    let lr_ind = ind.likelihood_ratio.statistic().unwrap();
    let lr_uc = uc.likelihood_ratio.statistic().unwrap();
    assert_relative_eq!(lr_ind, 12.365_308_378_751_82, epsilon = 1e-10);
    assert_relative_eq!(lr_uc, 16.607_312_068_216_505, epsilon = 1e-10);
    assert!((lr_ind - lr_uc).abs() > 1.0);

    assert_relative_eq!(
        ind.likelihood_ratio.p_value().unwrap(),
        4.373_853_160_859_073e-4,
        max_relative = 1e-8
    );
    assert_relative_eq!(
        uc.likelihood_ratio.p_value().unwrap(),
        4.597_343_462_880_895e-5,
        max_relative = 1e-8
    );
}

#[test]
fn combined_backtest_matches_individual_tests() {
    let mut pattern = vec![false; 250];
    for i in [17, 18, 90, 140, 141, 142, 230] {
        pattern[i] = true;
    }
    let returns = daily(&pattern_returns(&pattern));
    let var = daily(&[0.02; 250]);

    let bt = backtest_var(&returns, &var, 0.99).unwrap();
    assert_eq!(bt.kupiec, kupiec_test(&returns, &var, 0.99).unwrap());
    assert_eq!(
        bt.christoffersen,
        christoffersen_test(&returns, &var, 0.99).unwrap()
    );
    assert_eq!(bt.kupiec.exceedances, 7);
    assert_eq!(bt.christoffersen.transitions.n11, 3);
}

#[test]
fn tests_run_on_the_inner_join_of_the_series() {
    // VaR forecasts exist only for the second half; one return is missing.
    let mut values = pattern_returns(&alternating(20));
    values[15] = f64::NAN;
    let returns = daily(&values);
    let var = TimeSeries::new((10..20).map(|i| (day(i), 0.02)).collect()).unwrap();

    let res = kupiec_test(&returns, &var, 0.95).unwrap();
    assert_eq!(res.observations, 9);
    // Odd offsets 11, 13, 17, 19 breach; 15 was dropped.
    assert_eq!(res.exceedances, 4);
}

#[test]
fn disjoint_series_give_an_undefined_backtest() {
    let returns = daily(&[-0.05; 5]);
    let var = TimeSeries::new((30..35).map(|i| (day(i), 0.02)).collect()).unwrap();
    let bt = backtest_var(&returns, &var, 0.99).unwrap();
    assert_eq!(bt.kupiec.observations, 0);
    assert!(bt.kupiec.likelihood_ratio.is_undefined());
    assert!(bt.christoffersen.likelihood_ratio.is_undefined());
    assert_eq!(bt.kupiec.exceedance_rate(), None);
}

#[test]
fn undefined_results_serialize_as_tagged_state() {
    let json = serde_json::to_string(&LikelihoodRatio::Undefined).unwrap();
    assert_eq!(json, r#"{"state":"undefined"}"#);
    let computed: LikelihoodRatio =
        serde_json::from_str(r#"{"state":"computed","statistic":1.5,"p_value":0.22}"#).unwrap();
    assert_eq!(computed.statistic(), Some(1.5));
}
