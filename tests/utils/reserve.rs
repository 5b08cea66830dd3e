use super::{dec, sf};
use bigdecimal::BigDecimal;
use klend_sdk::{
    math::big_sf_from_raw,
    state::{BorrowRateCurve, CurvePoint, Reserve, TokenOraclePrice, ELEVATION_GROUPS_COUNT},
    KaminoReserve,
};
use solana_program::pubkey::Pubkey;

#[derive(Debug, Clone)]
pub struct ReserveInfo {
    pub address: Pubkey,
    pub state: Reserve,
    pub price: BigDecimal,
    pub recent_slot_duration_ms: u64,
}

impl ReserveInfo {
    pub fn new(symbol: &str) -> Self {
        let mut state = Reserve::default();
        state.version = 1;
        state.liquidity.mint_pubkey = Pubkey::new_unique();
        state.liquidity.mint_decimals = 6;
        state.liquidity.cumulative_borrow_rate_bsf = big_sf_from_raw(sf(1));
        state.collateral.mint_pubkey = Pubkey::new_unique();
        state.config.borrow_factor_pct = 100;
        state.config.deposit_limit = u64::MAX;
        state.config.borrow_limit = u64::MAX;
        state.config.borrow_limit_outside_elevation_group = u64::MAX;
        state.config.borrow_limit_against_this_collateral_in_elevation_group =
            [u64::MAX; ELEVATION_GROUPS_COUNT];
        state.config.token_info.name[..symbol.len()].copy_from_slice(symbol.as_bytes());

        Self {
            address: Pubkey::new_unique(),
            state,
            price: dec("1"),
            recent_slot_duration_ms: 500,
        }
    }

    pub fn mint(&self) -> Pubkey {
        self.state.liquidity.mint_pubkey
    }

    pub fn available(mut self, amount: u64) -> Self {
        self.state.liquidity.available_amount = amount;
        self
    }

    pub fn borrowed(mut self, amount: u64) -> Self {
        self.state.liquidity.borrowed_amount_sf = sf(amount);
        self
    }

    pub fn borrowed_sf(mut self, amount_sf: u128) -> Self {
        self.state.liquidity.borrowed_amount_sf = amount_sf;
        self
    }

    pub fn collateral_supply(mut self, amount: u64) -> Self {
        self.state.collateral.mint_total_supply = amount;
        self
    }

    pub fn ltv(mut self, ltv_pct: u8, liquidation_threshold_pct: u8) -> Self {
        self.state.config.loan_to_value_pct = ltv_pct;
        self.state.config.liquidation_threshold_pct = liquidation_threshold_pct;
        self
    }

    pub fn borrow_factor(mut self, borrow_factor_pct: u64) -> Self {
        self.state.config.borrow_factor_pct = borrow_factor_pct;
        self
    }

    pub fn curve(mut self, points: &[(u32, u32)]) -> Self {
        let points = points
            .iter()
            .map(|(utilization_rate_bps, borrow_rate_bps)| CurvePoint {
                utilization_rate_bps: *utilization_rate_bps,
                borrow_rate_bps: *borrow_rate_bps,
            })
            .collect::<Vec<_>>();
        self.state.config.borrow_rate_curve = BorrowRateCurve::from_points(&points);
        self
    }

    pub fn protocol_take_rate(mut self, pct: u8) -> Self {
        self.state.config.protocol_take_rate_pct = pct;
        self
    }

    pub fn host_fixed_interest_rate(mut self, bps: u16) -> Self {
        self.state.config.host_fixed_interest_rate_bps = bps;
        self
    }

    pub fn elevation_groups(mut self, groups: &[u8]) -> Self {
        self.state.config.elevation_groups = Default::default();
        self.state.config.elevation_groups[..groups.len()].copy_from_slice(groups);
        self
    }

    pub fn price(mut self, price: &str) -> Self {
        self.price = dec(price);
        self
    }

    pub fn deposit_limit(mut self, limit: u64) -> Self {
        self.state.config.deposit_limit = limit;
        self
    }

    pub fn borrow_limit(mut self, limit: u64) -> Self {
        self.state.config.borrow_limit = limit;
        self
    }

    pub fn borrow_fee_sf(mut self, fee_sf: u64) -> Self {
        self.state.config.fees.borrow_fee_sf = fee_sf;
        self
    }

    pub fn utilization_ceiling(mut self, pct: u8) -> Self {
        self.state.config.utilization_limit_block_borrowing_above_pct = pct;
        self
    }

    pub fn deposit_cap(mut self, capacity: i64, current: i64) -> Self {
        self.state.config.deposit_withdrawal_cap.config_capacity = capacity;
        self.state.config.deposit_withdrawal_cap.current_total = current;
        self
    }

    pub fn debt_cap(mut self, capacity: i64, current: i64) -> Self {
        self.state.config.debt_withdrawal_cap.config_capacity = capacity;
        self.state.config.debt_withdrawal_cap.current_total = current;
        self
    }

    pub fn last_update_slot(mut self, slot: u64) -> Self {
        self.state.last_update.slot = slot;
        self
    }

    pub fn cumulative_borrow_rate_sf(mut self, rate_sf: u128) -> Self {
        self.state.liquidity.cumulative_borrow_rate_bsf = big_sf_from_raw(rate_sf);
        self
    }

    pub fn status(mut self, status: u8) -> Self {
        self.state.config.status = status;
        self
    }

    pub fn disable_collateral_outside_elevation_group(mut self) -> Self {
        self.state.config.disable_usage_as_coll_outside_emode = 1;
        self
    }

    pub fn slot_duration_ms(mut self, ms: u64) -> Self {
        self.recent_slot_duration_ms = ms;
        self
    }

    pub fn oracle_price(&self) -> TokenOraclePrice {
        TokenOraclePrice {
            mint_address: self.mint(),
            price: self.price.clone(),
            timestamp: 0,
            decimals: self.state.liquidity.mint_decimals as u8,
            valid: true,
        }
    }

    pub fn try_build(&self) -> klend_sdk::LendingResult<KaminoReserve> {
        KaminoReserve::new(
            self.address,
            self.state.clone(),
            self.oracle_price(),
            self.recent_slot_duration_ms,
        )
    }

    pub fn build(&self) -> KaminoReserve {
        self.try_build().unwrap()
    }
}
