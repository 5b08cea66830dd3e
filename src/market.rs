//! Market context: reserve lookup and elevation group configuration

use crate::{
    error::{LendingError, LendingResult},
    reserve::KaminoReserve,
    state::{ElevationGroup, LendingMarket, ELEVATION_GROUP_NONE},
};
use solana_program::pubkey::Pubkey;
use std::collections::HashMap;

/// Lookups the reserve and obligation models need from a lending market
pub trait MarketContext {
    /// Reserve by account address
    fn get_reserve_by_address(&self, address: &Pubkey) -> Option<&KaminoReserve>;

    /// Reserve by liquidity mint
    fn get_reserve_by_mint(&self, mint: &Pubkey) -> Option<&KaminoReserve>;

    /// Elevation group configuration, `None` for group 0 or an unset id
    fn get_elevation_group(&self, id: u8) -> Option<&ElevationGroup>;

    /// Share of protocol fees owed to referrers, bps
    fn referral_fee_bps(&self) -> u16;

    /// Reserve by account address, not found is an error
    fn get_existing_reserve_by_address(&self, address: &Pubkey) -> LendingResult<&KaminoReserve> {
        self.get_reserve_by_address(address)
            .ok_or(LendingError::ReserveNotFound(*address))
    }

    /// Reserve by liquidity mint, not found is an error
    fn get_existing_reserve_by_mint(&self, mint: &Pubkey) -> LendingResult<&KaminoReserve> {
        self.get_reserve_by_mint(mint)
            .ok_or(LendingError::ReserveNotFoundForMint(*mint))
    }

    /// Elevation groups both reserves belong to and that allow borrowing `debt_reserve`
    fn get_common_elevation_groups_for_pair(
        &self,
        coll_reserve: &KaminoReserve,
        debt_reserve: &KaminoReserve,
    ) -> Vec<ElevationGroup> {
        coll_reserve
            .elevation_groups()
            .into_iter()
            .filter(|id| debt_reserve.is_in_elevation_group(*id))
            .filter_map(|id| self.get_elevation_group(id))
            .filter(|group| group_allows_debt_reserve(group, &debt_reserve.address))
            .copied()
            .collect()
    }

    /// Group with the highest LTV, first one wins ties
    fn get_elevation_group_with_max_ltv(&self, groups: &[ElevationGroup]) -> Option<ElevationGroup> {
        groups.iter().fold(None, |best: Option<ElevationGroup>, group| match best {
            Some(best) if best.ltv_pct >= group.ltv_pct => Some(best),
            _ => Some(*group),
        })
    }
}

/// True when the group has no dedicated debt reserve or it is `debt_reserve`
pub fn group_allows_debt_reserve(group: &ElevationGroup, debt_reserve: &Pubkey) -> bool {
    group.debt_reserve == Pubkey::default() || group.debt_reserve == *debt_reserve
}

/// Lending market with its reserves loaded in memory
#[derive(Clone, Debug)]
pub struct KaminoMarket {
    /// Market address
    pub address: Pubkey,
    /// Market account state
    pub state: LendingMarket,
    /// Reserves by address
    pub reserves: HashMap<Pubkey, KaminoReserve>,
}

impl KaminoMarket {
    /// Market from its state and reserves
    pub fn new(address: Pubkey, state: LendingMarket, reserves: Vec<KaminoReserve>) -> Self {
        let reserves = reserves
            .into_iter()
            .map(|reserve| (reserve.address, reserve))
            .collect::<HashMap<_, _>>();
        log::debug!("Loaded market {} with {} reserves", address, reserves.len());
        Self {
            address,
            state,
            reserves,
        }
    }

    /// Replace one reserve snapshot, returns the previous one
    pub fn set_reserve(&mut self, reserve: KaminoReserve) -> Option<KaminoReserve> {
        self.reserves.insert(reserve.address, reserve)
    }
}

impl MarketContext for KaminoMarket {
    fn get_reserve_by_address(&self, address: &Pubkey) -> Option<&KaminoReserve> {
        self.reserves.get(address)
    }

    fn get_reserve_by_mint(&self, mint: &Pubkey) -> Option<&KaminoReserve> {
        self.reserves
            .values()
            .find(|reserve| reserve.get_liquidity_mint() == *mint)
    }

    fn get_elevation_group(&self, id: u8) -> Option<&ElevationGroup> {
        if id == ELEVATION_GROUP_NONE {
            return None;
        }
        self.state.get_elevation_group(id)
    }

    fn referral_fee_bps(&self) -> u16 {
        self.state.referral_fee_bps
    }
}
