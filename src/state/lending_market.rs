//! Lending market account state

use super::*;

/// Lending market
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct LendingMarket {
    /// State version
    pub version: u64,
    /// Bump seed of the market authority
    pub bump_seed: u64,
    /// Market owner
    pub lending_market_owner: Pubkey,
    /// Quote currency, zero padded
    pub quote_currency: [u8; 32],
    /// Share of protocol fees paid to referrers, bps
    pub referral_fee_bps: u16,
    /// Non-zero while the market is frozen
    pub emergency_mode: u8,
    /// Non-zero when borrowing is disabled market wide
    pub borrow_disabled: u8,
    /// Elevation groups, group `id` is stored at `id - 1`
    pub elevation_groups: [ElevationGroup; ELEVATION_GROUPS_COUNT],
    /// Market name, zero padded
    pub name: [u8; 32],
}

impl AccountState for LendingMarket {
    const NAME: &'static str = "LendingMarket";
}

impl LendingMarket {
    /// Configured elevation group, `None` for id 0 or an unset entry
    pub fn get_elevation_group(&self, id: u8) -> Option<&ElevationGroup> {
        if id == ELEVATION_GROUP_NONE {
            return None;
        }
        self.elevation_groups
            .get(id as usize - 1)
            .filter(|group| group.id == id)
    }
}

/// Elevation group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ElevationGroup {
    /// Maximum liquidation bonus, bps
    pub max_liquidation_bonus_bps: u16,
    /// Group id, 0 for an unset entry
    pub id: u8,
    /// Loan to value inside the group, percent
    pub ltv_pct: u8,
    /// Liquidation threshold inside the group, percent
    pub liquidation_threshold_pct: u8,
    /// Non-zero when new loans are accepted
    pub allow_new_loans: u8,
    /// Maximum number of collateral reserves
    pub max_reserves_as_collateral: u8,
    /// Padding
    pub padding: u8,
    /// Only reserve that can be borrowed inside the group, default key for any
    pub debt_reserve: Pubkey,
}
