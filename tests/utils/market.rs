use klend_sdk::{
    state::{ElevationGroup, LendingMarket},
    KaminoMarket, KaminoReserve,
};
use solana_program::pubkey::Pubkey;

#[derive(Debug, Clone)]
pub struct MarketInfo {
    pub address: Pubkey,
    pub state: LendingMarket,
}

impl MarketInfo {
    pub fn new() -> Self {
        let mut state = LendingMarket::default();
        state.version = 1;
        state.lending_market_owner = Pubkey::new_unique();
        Self {
            address: Pubkey::new_unique(),
            state,
        }
    }

    pub fn elevation_group(mut self, id: u8, ltv_pct: u8, liquidation_threshold_pct: u8) -> Self {
        self.state.elevation_groups[id as usize - 1] = ElevationGroup {
            id,
            ltv_pct,
            liquidation_threshold_pct,
            allow_new_loans: 1,
            max_reserves_as_collateral: 8,
            ..ElevationGroup::default()
        };
        self
    }

    pub fn elevation_group_debt_reserve(mut self, id: u8, debt_reserve: Pubkey) -> Self {
        self.state.elevation_groups[id as usize - 1].debt_reserve = debt_reserve;
        self
    }

    pub fn referral_fee_bps(mut self, bps: u16) -> Self {
        self.state.referral_fee_bps = bps;
        self
    }

    pub fn build(&self, reserves: Vec<KaminoReserve>) -> KaminoMarket {
        KaminoMarket::new(self.address, self.state.clone(), reserves)
    }
}
