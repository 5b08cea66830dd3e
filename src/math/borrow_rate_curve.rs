//! Utilization to borrow rate curve

use super::from_bps;
use crate::{
    error::{LendingError, LendingResult},
    state::BorrowRateCurve,
};
use bigdecimal::BigDecimal;

/// Utilization of 100% in basis points, last meaningful point of a curve
pub const MAX_UTILIZATION_RATE_BPS: u32 = 10_000;

/// Curve point as ratios
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateCurvePoint {
    /// Utilization in [0, 1]
    pub utilization_rate: BigDecimal,
    /// Yearly borrow rate
    pub borrow_rate: BigDecimal,
}

/// Converts the on-chain curve into ratios, dropping every point after the first one
/// at 100% utilization
pub fn truncate_borrow_curve(curve: &BorrowRateCurve) -> Vec<RateCurvePoint> {
    let mut points = Vec::with_capacity(curve.points.len());
    for point in curve.points.iter() {
        points.push(RateCurvePoint {
            utilization_rate: from_bps(point.utilization_rate_bps),
            borrow_rate: from_bps(point.borrow_rate_bps),
        });
        if point.utilization_rate_bps == MAX_UTILIZATION_RATE_BPS {
            break;
        }
    }
    points
}

/// Borrow rate at `utilization`, linearly interpolated between the bracketing points
/// and flat outside the curve
pub fn get_borrow_rate(
    utilization: &BigDecimal,
    curve: &[RateCurvePoint],
) -> LendingResult<BigDecimal> {
    let (first, last) = match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(LendingError::InvalidBorrowRateCurve("curve has no points")),
    };

    if *utilization <= first.utilization_rate {
        return Ok(first.borrow_rate.clone());
    }
    if *utilization >= last.utilization_rate {
        return Ok(last.borrow_rate.clone());
    }

    for window in curve.windows(2) {
        let (start, end) = (&window[0], &window[1]);
        if *utilization == start.utilization_rate {
            return Ok(start.borrow_rate.clone());
        }
        if *utilization == end.utilization_rate {
            return Ok(end.borrow_rate.clone());
        }
        if start.utilization_rate < *utilization && *utilization < end.utilization_rate {
            if end.utilization_rate == start.utilization_rate {
                return Ok(start.borrow_rate.clone());
            }
            let rise = (&end.borrow_rate - &start.borrow_rate)
                * (utilization - &start.utilization_rate);
            let run = &end.utilization_rate - &start.utilization_rate;
            return Ok(&start.borrow_rate + rise / run);
        }
    }

    Err(LendingError::InvalidBorrowRateCurve(
        "utilization values are not ordered",
    ))
}
