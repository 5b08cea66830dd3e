mod utils;

use klend_sdk::math::{
    big_sf_from_raw, big_sf_to_decimal, decimal_to_sf, div_or_zero, from_bps, from_percent,
    sf_to_decimal, ten_pow,
};
use klend_sdk::state::BigFractionBytes;
use num_traits::Zero;
use utils::*;

#[test]
fn test_zero_and_one() {
    assert!(sf_to_decimal(0).is_zero());
    assert_eq!(sf_to_decimal(1 << 60), dec("1"));
}

#[test]
fn test_smallest_fractions_are_exact() {
    assert_eq!(
        sf_to_decimal(3),
        dec("0.000000000000000002602085213965210641617886722087860107421875")
    );
    assert_eq!(sf_to_decimal(3 << 59), dec("1.5"));
}

#[test]
fn test_big_fraction_limbs() {
    let one = big_sf_from_raw(1 << 60);
    assert_eq!(big_sf_to_decimal(&one), dec("1"));

    // 2^64 / 2^60
    let sixteen = BigFractionBytes {
        value: [0, 1, 0, 0],
        padding: [0; 2],
    };
    assert_eq!(big_sf_to_decimal(&sixteen), dec("16"));

    // 2^128 / 2^60 = 2^68
    let high_limb = BigFractionBytes {
        value: [0, 0, 1, 0],
        padding: [0; 2],
    };
    assert_eq!(big_sf_to_decimal(&high_limb), dec("295147905179352825856"));
}

#[test]
fn test_decimal_to_sf() {
    assert_eq!(decimal_to_sf(&dec("1.5")), 3 << 59);
    assert_eq!(decimal_to_sf(&dec("-2")), 0);
    assert_eq!(decimal_to_sf(&sf_to_decimal(123_456_789)), 123_456_789);
}

#[test]
fn test_ratio_helpers() {
    assert_eq!(from_percent(15u8), dec("0.15"));
    assert_eq!(from_bps(150u16), dec("0.015"));
    assert_eq!(ten_pow(6), dec("1000000"));
    assert!(div_or_zero(&dec("5"), &dec("0")).is_zero());
    assert_eq!(div_or_zero(&dec("5"), &dec("2")), dec("2.5"));
}
