//! Scaled fraction conversion
//!
//! On-chain amounts are unsigned integers scaled by 2^60. Dividing by a power of two
//! terminates in base ten, so `raw / 2^60 == raw * 5^60 / 10^60` exactly.

use crate::state::BigFractionBytes;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};

/// Number of fractional bits of a scaled fraction
pub const FRACTION_BITS: u32 = 60;

fn five_pow_fraction_bits() -> BigInt {
    BigInt::from(5u8).pow(FRACTION_BITS)
}

fn scaled_int_to_decimal(raw: BigInt) -> BigDecimal {
    BigDecimal::new(raw * five_pow_fraction_bits(), FRACTION_BITS as i64)
}

/// Converts a scaled fraction to a decimal
pub fn sf_to_decimal(sf: u128) -> BigDecimal {
    scaled_int_to_decimal(BigInt::from(sf))
}

/// Converts a 256 bit scaled fraction stored as little endian limbs to a decimal
pub fn big_sf_to_decimal(bsf: &BigFractionBytes) -> BigDecimal {
    let raw = bsf
        .value
        .iter()
        .rev()
        .fold(BigInt::zero(), |acc, limb| (acc << 64) + BigInt::from(*limb));
    scaled_int_to_decimal(raw)
}

/// Converts a decimal back to a scaled fraction, rounding toward zero.
/// Negative values map to zero and values above `u128::MAX` saturate.
pub fn decimal_to_sf(value: &BigDecimal) -> u128 {
    let (digits, scale) = (value * BigDecimal::new(BigInt::from(1u8) << FRACTION_BITS, 0))
        .with_scale(0)
        .into_bigint_and_exponent();
    debug_assert_eq!(scale, 0);
    if digits.sign() == Sign::Minus {
        return 0;
    }
    digits.to_u128().unwrap_or(u128::MAX)
}

/// Packs an integer scaled fraction into limbs
pub fn big_sf_from_raw(raw: u128) -> BigFractionBytes {
    BigFractionBytes {
        value: [raw as u64, (raw >> 64) as u64, 0, 0],
        padding: [0; 2],
    }
}
