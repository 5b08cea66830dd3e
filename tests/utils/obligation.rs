use super::sf;
use klend_sdk::{
    math::big_sf_from_raw,
    state::{Obligation, ObligationCollateral, ObligationLiquidity},
    KaminoMarket, KaminoObligation, LendingResult,
};
use solana_program::pubkey::Pubkey;

#[derive(Debug, Clone)]
pub struct ObligationInfo {
    pub address: Pubkey,
    pub state: Obligation,
}

impl ObligationInfo {
    pub fn new() -> Self {
        let mut state = Obligation::default();
        state.owner = Pubkey::new_unique();
        Self {
            address: Pubkey::new_unique(),
            state,
        }
    }

    /// Deposit of collateral tokens in the first free slot
    pub fn deposit(mut self, reserve: &Pubkey, collateral_amount: u64) -> Self {
        let slot = self
            .state
            .deposits
            .iter_mut()
            .find(|deposit| deposit.deposit_reserve == Pubkey::default())
            .unwrap();
        *slot = ObligationCollateral {
            deposit_reserve: *reserve,
            deposited_amount: collateral_amount,
            ..ObligationCollateral::default()
        };
        self
    }

    /// Borrow of base units in the first free slot, taken at a cumulative rate of 1
    pub fn borrow(self, reserve: &Pubkey, amount: u64) -> Self {
        self.borrow_at_rate(reserve, sf(amount), sf(1))
    }

    pub fn borrow_at_rate(mut self, reserve: &Pubkey, amount_sf: u128, rate_sf: u128) -> Self {
        let slot = self
            .state
            .borrows
            .iter_mut()
            .find(|borrow| borrow.borrow_reserve == Pubkey::default())
            .unwrap();
        *slot = ObligationLiquidity {
            borrow_reserve: *reserve,
            cumulative_borrow_rate_bsf: big_sf_from_raw(rate_sf),
            borrowed_amount_sf: amount_sf,
            ..ObligationLiquidity::default()
        };
        self
    }

    pub fn elevation_group(mut self, id: u8) -> Self {
        self.state.elevation_group = id;
        self
    }

    pub fn try_load(&self, market: &KaminoMarket, slot: u64) -> LendingResult<KaminoObligation> {
        KaminoObligation::load(market, self.address, self.state.clone(), slot)
    }

    pub fn load(&self, market: &KaminoMarket, slot: u64) -> KaminoObligation {
        self.try_load(market, slot).unwrap()
    }
}
