//! Interest compounding and rate conversions

use super::{to_decimal, SLOTS_PER_SECOND, SLOTS_PER_YEAR};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};

/// Compounds a yearly `rate` over `elapsed_slots` the way the lending program does.
///
/// Up to four slots the exact power is used, with `(1 + r)^4` computed as
/// `((1 + r)^2)^2`. From five slots on the result is the third order binomial
/// expansion `1 + n*r + C(n,2)*r^2 + C(n,3)*r^3`, which undershoots true compounding.
pub fn approximate_compounded_interest(rate: &BigDecimal, elapsed_slots: u64) -> BigDecimal {
    let base = rate / to_decimal(SLOTS_PER_YEAR);
    let one_plus_base = BigDecimal::one() + &base;
    match elapsed_slots {
        0 => BigDecimal::one(),
        1 => one_plus_base,
        2 => &one_plus_base * &one_plus_base,
        3 => &one_plus_base * &one_plus_base * &one_plus_base,
        4 => {
            let pow_two = &one_plus_base * &one_plus_base;
            &pow_two * &pow_two
        }
        n => {
            let n = BigInt::from(n);
            let n_minus_one = &n - 1u8;
            let n_minus_two = &n - 2u8;
            let base_pow_two = &base * &base;
            let second_coefficient = &n * &n_minus_one / 2u8;
            let third_coefficient = &n * &n_minus_one * &n_minus_two / 6u8;
            let first_term = to_decimal(n) * &base;
            let second_term = to_decimal(second_coefficient) * &base_pow_two;
            let third_term = to_decimal(third_coefficient) * &base_pow_two * &base;
            BigDecimal::one() + first_term + second_term + third_term
        }
    }
}

/// Ratio between the nominal slot time and the measured one.
///
/// Rates are configured per wall-clock year but accrue per slot, so a slower chain
/// needs a proportionally higher per-slot rate.
pub fn slot_adjustment_factor(recent_slot_duration_ms: u64) -> BigDecimal {
    to_decimal(1000u64) / to_decimal(SLOTS_PER_SECOND) / to_decimal(recent_slot_duration_ms)
}

/// Converts an APR into an APY with per-slot compounding.
/// Display figure only, computed in floating point.
pub fn calculate_apy_from_apr(apr: &BigDecimal) -> f64 {
    let apr = apr.to_f64().unwrap_or(0.0);
    let slots = SLOTS_PER_YEAR as f64;
    (1.0 + apr / slots).powf(slots) - 1.0
}
