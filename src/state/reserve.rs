//! Reserve account state

use super::*;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Number of elevation groups a reserve can belong to
pub const RESERVE_ELEVATION_GROUPS_COUNT: usize = 20;

/// Number of points of an on-chain borrow rate curve
pub const CURVE_POINTS_COUNT: usize = 11;

/// Reserve status
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ReserveStatus {
    /// Open for every operation
    Active = 0,
    /// Winding down, only repay and withdraw
    Obsolete = 1,
    /// Active but not listed
    Hidden = 2,
}

/// Reserve
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Reserve {
    /// State version
    pub version: u64,
    /// Last refresh
    pub last_update: LastUpdate,
    /// Lending market
    pub lending_market: Pubkey,
    /// Farm attached to the collateral side
    pub farm_collateral: Pubkey,
    /// Farm attached to the debt side
    pub farm_debt: Pubkey,
    /// Liquidity side
    pub liquidity: ReserveLiquidity,
    /// Collateral side
    pub collateral: ReserveCollateral,
    /// Configuration
    pub config: ReserveConfig,
    /// Debt taken by obligations outside of any elevation group
    pub borrowed_amount_outside_elevation_group: u64,
    /// Debt taken against this reserve as collateral, per elevation group id - 1
    pub borrowed_amounts_against_this_reserve_in_elevation_groups: [u64; ELEVATION_GROUPS_COUNT],
}

impl AccountState for Reserve {
    const NAME: &'static str = "Reserve";
}

impl Reserve {
    /// Decoded status
    pub fn status(&self) -> LendingResult<ReserveStatus> {
        ReserveStatus::try_from(self.config.status)
            .map_err(|_| LendingError::InvalidReserveStatus(self.config.status))
    }
}

/// Reserve liquidity
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ReserveLiquidity {
    /// Liquidity mint
    pub mint_pubkey: Pubkey,
    /// Liquidity supply vault
    pub supply_vault: Pubkey,
    /// Fee receiver
    pub fee_vault: Pubkey,
    /// Tokens available to borrow or withdraw
    pub available_amount: u64,
    /// Borrowed tokens, scaled fraction
    pub borrowed_amount_sf: u128,
    /// Cached price, scaled fraction
    pub market_price_sf: u128,
    /// Unix timestamp of the cached price
    pub market_price_last_updated_ts: u64,
    /// Liquidity mint decimals
    pub mint_decimals: u64,
    /// Timestamp at which the deposit limit was crossed, 0 if not crossed
    pub deposit_limit_crossed_timestamp: u64,
    /// Timestamp at which the borrow limit was crossed, 0 if not crossed
    pub borrow_limit_crossed_timestamp: u64,
    /// Cumulative borrow rate
    pub cumulative_borrow_rate_bsf: BigFractionBytes,
    /// Fees owed to the protocol, scaled fraction
    pub accumulated_protocol_fees_sf: u128,
    /// Fees owed to referrers, scaled fraction
    pub accumulated_referrer_fees_sf: u128,
    /// Referrer fees not yet credited, scaled fraction
    pub pending_referrer_fees_sf: u128,
    /// Referral share of interest, scaled fraction
    pub absolute_referral_rate_sf: u128,
    /// Token program of the liquidity mint
    pub token_program: Pubkey,
}

/// Reserve collateral
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ReserveCollateral {
    /// Collateral mint
    pub mint_pubkey: Pubkey,
    /// Collateral tokens in circulation
    pub mint_total_supply: u64,
    /// Collateral supply vault
    pub supply_vault: Pubkey,
}

/// Reserve configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ReserveConfig {
    /// Status code, see [`ReserveStatus`]
    pub status: u8,
    /// Asset tier
    pub asset_tier: u8,
    /// Fixed yearly interest paid to the host, bps
    pub host_fixed_interest_rate_bps: u16,
    /// Share of variable interest taken by the protocol, percent
    pub protocol_take_rate_pct: u8,
    /// Share of liquidation bonus taken by the protocol, percent
    pub protocol_liquidation_fee_pct: u8,
    /// Loan to value, percent
    pub loan_to_value_pct: u8,
    /// Liquidation threshold, percent
    pub liquidation_threshold_pct: u8,
    /// Minimum liquidation bonus, bps
    pub min_liquidation_bonus_bps: u16,
    /// Maximum liquidation bonus, bps
    pub max_liquidation_bonus_bps: u16,
    /// Liquidation bonus for bad debt, bps
    pub bad_debt_liquidation_bonus_bps: u16,
    /// Fees
    pub fees: ReserveFees,
    /// Borrow rate curve
    pub borrow_rate_curve: BorrowRateCurve,
    /// Debt weight, percent (100 is neutral)
    pub borrow_factor_pct: u64,
    /// Deposit limit in tokens
    pub deposit_limit: u64,
    /// Borrow limit in tokens
    pub borrow_limit: u64,
    /// Token info
    pub token_info: TokenInfo,
    /// Daily deposit withdrawal cap
    pub deposit_withdrawal_cap: WithdrawalCaps,
    /// Daily debt withdrawal cap
    pub debt_withdrawal_cap: WithdrawalCaps,
    /// Elevation groups the reserve belongs to, 0 for unused entries
    pub elevation_groups: [u8; RESERVE_ELEVATION_GROUPS_COUNT],
    /// Non-zero when the reserve only counts as collateral inside an elevation group
    pub disable_usage_as_coll_outside_emode: u8,
    /// Borrowing stops above this utilization, percent, 0 disables it
    pub utilization_limit_block_borrowing_above_pct: u8,
    /// Borrow limit outside of elevation groups in tokens
    pub borrow_limit_outside_elevation_group: u64,
    /// Debt limit against this reserve as collateral, per elevation group id - 1
    pub borrow_limit_against_this_collateral_in_elevation_group: [u64; ELEVATION_GROUPS_COUNT],
}

/// Reserve fees
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ReserveFees {
    /// Origination fee, scaled fraction
    pub borrow_fee_sf: u64,
    /// Flash loan fee, scaled fraction
    pub flash_loan_fee_sf: u64,
    /// Padding
    pub padding: [u8; 8],
}

/// Borrow rate curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct BorrowRateCurve {
    /// Points ordered by utilization
    pub points: [CurvePoint; CURVE_POINTS_COUNT],
}

impl BorrowRateCurve {
    /// Curve from points, the remaining entries repeat the last one
    pub fn from_points(points: &[CurvePoint]) -> Self {
        let mut curve = Self::default();
        let last = points.last().copied().unwrap_or_default();
        for (index, slot) in curve.points.iter_mut().enumerate() {
            *slot = points.get(index).copied().unwrap_or(last);
        }
        curve
    }
}

/// Borrow rate curve point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct CurvePoint {
    /// Utilization, bps
    pub utilization_rate_bps: u32,
    /// Yearly borrow rate, bps
    pub borrow_rate_bps: u32,
}

/// Token info
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct TokenInfo {
    /// Symbol, zero padded
    pub name: [u8; 32],
    /// Maximum price age
    pub max_age_price_seconds: u64,
}

impl TokenInfo {
    /// Symbol with the zero padding removed
    pub fn symbol(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// Rolling withdrawal cap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct WithdrawalCaps {
    /// Maximum net outflow per interval, 0 disables the cap
    pub config_capacity: i64,
    /// Net outflow in the current interval
    pub current_total: i64,
    /// Start of the current interval
    pub last_interval_start_timestamp: u64,
    /// Interval length
    pub config_interval_length_seconds: u64,
}

/// 256 bit scaled fraction stored as little endian limbs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct BigFractionBytes {
    /// Limbs, least significant first
    pub value: [u64; 4],
    /// Padding
    pub padding: [u64; 2],
}
