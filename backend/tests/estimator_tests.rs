//! Tests for the yield estimator
//!
//! The estimator is the contract between the backend, the external compute
//! worker and the WASM preview, so its numeric behavior is pinned down here.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{condition_coef, estimate_yield, YieldFactors};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn factors(
    base_yield: &str,
    ideal_temp: &str,
    ideal_precip: &str,
    avg_temp: &str,
    sum_precipitation: &str,
) -> YieldFactors {
    YieldFactors {
        base_yield: dec(base_yield),
        ideal_temp: dec(ideal_temp),
        ideal_precip: dec(ideal_precip),
        avg_temp: dec(avg_temp),
        sum_precipitation: dec(sum_precipitation),
    }
}

mod coefficients {
    use super::*;

    #[test]
    fn exact_match_scores_one() {
        assert_eq!(condition_coef(dec("20"), dec("20")), Decimal::ONE);
        assert_eq!(condition_coef(dec("50"), dec("50")), Decimal::ONE);
    }

    #[test]
    fn double_ideal_scores_zero() {
        assert_eq!(condition_coef(dec("20"), dec("40")), Decimal::ZERO);
    }

    #[test]
    fn linear_decay_between() {
        // 25% deviation leaves a 0.75 coefficient
        assert_eq!(condition_coef(dec("20"), dec("25")), dec("0.75"));
        // Deviation below ideal counts the same as above
        assert_eq!(condition_coef(dec("20"), dec("15")), dec("0.75"));
    }

    #[test]
    fn zero_ideal_with_zero_actual_scores_one() {
        assert_eq!(condition_coef(dec("0"), dec("0")), Decimal::ONE);
    }

    #[test]
    fn zero_ideal_decays_hyperbolically() {
        assert_eq!(condition_coef(dec("0"), dec("3")), dec("0.25"));
        assert_eq!(condition_coef(dec("0"), dec("1")), dec("0.5"));
    }

    #[test]
    fn far_off_observation_clamps_to_zero() {
        // More than 100% off ideal would go negative without the clamp
        assert_eq!(condition_coef(dec("20"), dec("-5")), Decimal::ZERO);
        assert_eq!(condition_coef(dec("20"), dec("100")), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn coefficient_stays_in_unit_interval(ideal in -100_000i64..100_000, actual in -100_000i64..100_000) {
            let coef = condition_coef(Decimal::new(ideal, 2), Decimal::new(actual, 2));
            prop_assert!(coef >= Decimal::ZERO);
            prop_assert!(coef <= Decimal::ONE);
        }
    }
}

mod totals {
    use super::*;

    #[test]
    fn empty_order_estimates_exactly_zero() {
        let result = estimate_yield(&[]);
        assert_eq!(result, dec("0.00"));
        assert_eq!(result.to_string(), "0.00");
    }

    #[test]
    fn perfect_conditions_keep_full_base_yield() {
        let result = estimate_yield(&[factors("100.00", "20", "50", "20", "50")]);
        assert_eq!(result.to_string(), "100.00");
    }

    #[test]
    fn one_severely_off_condition_zeroes_the_month() {
        // Temperature at double ideal zeroes the contribution regardless of
        // how good precipitation looks
        let result = estimate_yield(&[factors("100.00", "20", "50", "40", "50")]);
        assert_eq!(result.to_string(), "0.00");
    }

    #[test]
    fn contributions_sum_across_months() {
        // 30.00 from a perfect month, 12.50 from one at half proximity on
        // both conditions (50.00 * 0.5 * 0.5)
        let result = estimate_yield(&[
            factors("30.00", "20", "50", "20", "50"),
            factors("50.00", "10", "100", "15", "150"),
        ]);
        assert_eq!(result.to_string(), "42.50");
    }

    #[test]
    fn result_rounds_half_up_away_from_zero() {
        // A raw total of 10.005 must not round bankers-style to 10.00
        let result = estimate_yield(&[factors("10.005", "20", "50", "20", "50")]);
        assert_eq!(result.to_string(), "10.01");
    }

    #[test]
    fn result_always_carries_two_decimals() {
        let result = estimate_yield(&[factors("30", "20", "50", "20", "50")]);
        assert_eq!(result.to_string(), "30.00");
    }

    #[test]
    fn estimate_is_deterministic() {
        let input = vec![
            factors("30.00", "20", "50", "18", "61"),
            factors("50.00", "0", "100", "3", "40"),
        ];
        let first = estimate_yield(&input);
        let second = estimate_yield(&input);
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }
}
