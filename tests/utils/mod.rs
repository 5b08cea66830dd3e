#![allow(dead_code)]

use bigdecimal::BigDecimal;
use std::str::FromStr;

pub mod market;
pub mod obligation;
pub mod reserve;

pub use market::*;
pub use obligation::*;
pub use reserve::*;

/// Scaled fraction of a whole number of base units
pub const fn sf(amount: u64) -> u128 {
    (amount as u128) << 60
}

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn assert_close(actual: &BigDecimal, expected: &BigDecimal, tolerance: &str) {
    let difference = (actual - expected).abs();
    assert!(
        difference < dec(tolerance),
        "{} differs from {} by {}",
        actual,
        expected,
        difference
    );
}
