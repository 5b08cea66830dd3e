//! Obligation account state

use super::*;

/// Deposit slots of an obligation
pub const OBLIGATION_DEPOSITS_COUNT: usize = 8;

/// Borrow slots of an obligation
pub const OBLIGATION_BORROWS_COUNT: usize = 5;

/// Obligation
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Obligation {
    /// Obligation kind
    pub tag: u64,
    /// Last refresh
    pub last_update: LastUpdate,
    /// Lending market
    pub lending_market: Pubkey,
    /// Obligation owner
    pub owner: Pubkey,
    /// Deposited collateral, unused slots hold the default key
    pub deposits: [ObligationCollateral; OBLIGATION_DEPOSITS_COUNT],
    /// Lowest liquidation LTV among the deposit reserves
    pub lowest_reserve_deposit_liquidation_ltv: u64,
    /// Market value of deposits, scaled fraction
    pub deposited_value_sf: u128,
    /// Borrowed liquidity, unused slots hold the default key
    pub borrows: [ObligationLiquidity; OBLIGATION_BORROWS_COUNT],
    /// Market value of debt weighted by borrow factor, scaled fraction
    pub borrow_factor_adjusted_debt_value_sf: u128,
    /// Market value of debt, scaled fraction
    pub borrowed_assets_market_value_sf: u128,
    /// Maximum debt value, scaled fraction
    pub allowed_borrow_value_sf: u128,
    /// Debt value at which the obligation can be liquidated, scaled fraction
    pub unhealthy_borrow_value_sf: u128,
    /// Elevation group, 0 for none
    pub elevation_group: u8,
    /// Number of deposits in obsolete reserves
    pub num_of_obsolete_deposit_reserves: u8,
    /// Non-zero when the obligation has debt
    pub has_debt: u8,
    /// Referrer of the owner
    pub referrer: Pubkey,
    /// Non-zero when new borrows are blocked
    pub borrowing_disabled: u8,
}

impl AccountState for Obligation {
    const NAME: &'static str = "Obligation";
}

/// Obligation collateral
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ObligationCollateral {
    /// Reserve the collateral was deposited in
    pub deposit_reserve: Pubkey,
    /// Collateral tokens deposited
    pub deposited_amount: u64,
    /// Cached market value, scaled fraction
    pub market_value_sf: u128,
    /// Debt taken against this collateral inside the elevation group
    pub borrowed_amount_against_this_collateral_in_elevation_group: u64,
}

/// Obligation liquidity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ObligationLiquidity {
    /// Reserve the liquidity was borrowed from
    pub borrow_reserve: Pubkey,
    /// Reserve cumulative borrow rate at the last refresh
    pub cumulative_borrow_rate_bsf: BigFractionBytes,
    /// Borrowed tokens including interest, scaled fraction
    pub borrowed_amount_sf: u128,
    /// Cached market value, scaled fraction
    pub market_value_sf: u128,
    /// Cached market value weighted by borrow factor, scaled fraction
    pub borrow_factor_adjusted_market_value_sf: u128,
    /// Part of the debt taken outside of elevation groups
    pub borrowed_amount_outside_elevation_groups: u64,
}
