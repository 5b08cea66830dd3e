//! Decimal math shared by the reserve and obligation models

mod borrow_rate_curve;
mod fraction;
mod interest;

pub use borrow_rate_curve::*;
pub use fraction::*;
pub use interest::*;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;

/// Slots produced per second at the nominal slot time
pub const SLOTS_PER_SECOND: u64 = 2;
/// Slots per minute
pub const SLOTS_PER_MINUTE: u64 = SLOTS_PER_SECOND * 60;
/// Slots per hour
pub const SLOTS_PER_HOUR: u64 = SLOTS_PER_MINUTE * 60;
/// Slots per day, also the withdrawal cap window
pub const SLOTS_PER_DAY: u64 = SLOTS_PER_HOUR * 24;
/// Slots per year, the compounding period of borrow rates
pub const SLOTS_PER_YEAR: u64 = SLOTS_PER_DAY * 365;

/// 100% expressed in basis points
pub const ONE_HUNDRED_PCT_IN_BPS: u64 = 10_000;

/// Slot time assumed when the caller does not measure one
pub const DEFAULT_RECENT_SLOT_DURATION_MS: u64 = 450;

/// Significant digits kept by divisions and by compounded values
pub const DECIMAL_PRECISION: u64 = 100;

/// Integer to decimal
pub fn to_decimal<T: Into<BigInt>>(value: T) -> BigDecimal {
    BigDecimal::new(value.into(), 0)
}

/// Whole percent to ratio, 15 -> 0.15
pub fn from_percent<T: Into<BigInt>>(pct: T) -> BigDecimal {
    BigDecimal::new(pct.into(), 2)
}

/// Basis points to ratio, 150 -> 0.015
pub fn from_bps<T: Into<BigInt>>(bps: T) -> BigDecimal {
    BigDecimal::new(bps.into(), 4)
}

/// 10^decimals, the number of base units per token
pub fn ten_pow(decimals: u64) -> BigDecimal {
    BigDecimal::new(BigInt::from(1u8), -(decimals as i64))
}

/// `numerator / denominator`, or zero when the denominator is zero
pub fn div_or_zero(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    if denominator.is_zero() {
        BigDecimal::zero()
    } else {
        numerator / denominator
    }
}

/// Round to [`DECIMAL_PRECISION`] significant digits
pub fn round_decimal(value: BigDecimal) -> BigDecimal {
    value.with_prec(DECIMAL_PRECISION)
}

/// Clamp a value to be non-negative
pub fn floor_at_zero(value: BigDecimal) -> BigDecimal {
    std::cmp::max(value, BigDecimal::zero())
}
