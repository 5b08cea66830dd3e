//! Reserve model
//!
//! Wraps one reserve snapshot with its oracle price. Statistics derived from the
//! snapshot are computed once at construction; a fresh snapshot means a new value.

use crate::{
    action::ActionType,
    config::LendingConfig,
    error::{LendingError, LendingResult},
    market::MarketContext,
    math::{
        approximate_compounded_interest, big_sf_to_decimal, calculate_apy_from_apr,
        div_or_zero, floor_at_zero, from_bps, from_percent, get_borrow_rate, round_decimal,
        sf_to_decimal, slot_adjustment_factor, ten_pow, to_decimal, truncate_borrow_curve, RateCurvePoint,
        SLOTS_PER_DAY,
    },
    state::{Reserve, ReserveStatus, TokenOraclePrice, WithdrawalCaps, ELEVATION_GROUP_NONE},
};
use bigdecimal::BigDecimal;
use num_traits::{One, Zero};
use solana_program::pubkey::Pubkey;
use std::cmp::min;

/// Statistics derived from a reserve snapshot
#[derive(Clone, Debug, PartialEq)]
pub struct ReserveStats {
    /// Decoded status
    pub status: ReserveStatus,
    /// Liquidity mint
    pub mint_address: Pubkey,
    /// Curve truncated at 100% utilization
    pub borrow_curve: Vec<RateCurvePoint>,
    /// Loan to value ratio
    pub loan_to_value: BigDecimal,
    /// Liquidation threshold ratio
    pub liquidation_threshold: BigDecimal,
    /// Minimum liquidation bonus ratio
    pub min_liquidation_bonus: BigDecimal,
    /// Maximum liquidation bonus ratio
    pub max_liquidation_bonus: BigDecimal,
    /// Share of variable interest kept by the protocol
    pub protocol_take_rate: BigDecimal,
    /// Deposit limit in tokens
    pub reserve_deposit_limit: BigDecimal,
    /// Borrow limit in tokens
    pub reserve_borrow_limit: BigDecimal,
    /// Borrow factor, percent
    pub borrow_factor_pct: u64,
    /// Liquidity mint decimals
    pub decimals: u64,
    /// Token symbol
    pub symbol: String,
    /// Collateral tokens in circulation
    pub mint_total_supply: BigDecimal,
    /// Protocol fees at the snapshot
    pub accumulated_protocol_fees: BigDecimal,
    /// Supply APY at the snapshot
    pub supply_apy: f64,
    /// Borrow APY at the snapshot
    pub borrow_apy: f64,
}

/// Debt and supply projected to a slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebtAndSupply {
    /// Borrowed liquidity including accrued interest
    pub debt: BigDecimal,
    /// Total liquidity owned by depositors
    pub total_supply: BigDecimal,
}

/// Result of compounding interest over elapsed slots
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundedInterest {
    /// Borrowed liquidity including accrued interest
    pub new_debt: BigDecimal,
    /// Protocol fees including the new share
    pub new_acc_protocol_fees: BigDecimal,
    /// Referrer fees not yet credited
    pub pending_referral_fees: BigDecimal,
    /// Total liquidity owned by depositors
    pub new_total_supply: BigDecimal,
}

/// Reserve snapshot with its oracle price and derived statistics
#[derive(Clone, Debug)]
pub struct KaminoReserve {
    /// Reserve address
    pub address: Pubkey,
    /// Reserve account state
    pub state: Reserve,
    /// Oracle price of the liquidity token
    pub oracle_price: TokenOraclePrice,
    /// Measured slot time
    pub recent_slot_duration_ms: u64,
    /// Derived statistics
    pub stats: ReserveStats,
}

impl KaminoReserve {
    /// Reserve from its account state, derived statistics are computed here
    pub fn new(
        address: Pubkey,
        state: Reserve,
        oracle_price: TokenOraclePrice,
        recent_slot_duration_ms: u64,
    ) -> LendingResult<Self> {
        if !oracle_price.valid {
            log::warn!(
                "Reserve {} loaded with an invalid oracle price for {}",
                address,
                oracle_price.mint_address
            );
        }
        let stats = Self::format_reserve_stats(&state, recent_slot_duration_ms)?;
        let mut reserve = Self {
            address,
            state,
            oracle_price,
            recent_slot_duration_ms,
            stats,
        };
        reserve.stats.borrow_apy = calculate_apy_from_apr(&reserve.calculate_borrow_apr()?);
        reserve.stats.supply_apy = calculate_apy_from_apr(&reserve.calculate_supply_apr()?);
        log::debug!(
            "Loaded reserve {} ({}) at slot {}",
            reserve.address,
            reserve.stats.symbol,
            reserve.state.last_update.slot
        );
        Ok(reserve)
    }

    /// Reserve using the slot time from `config`
    pub fn from_config(
        address: Pubkey,
        state: Reserve,
        oracle_price: TokenOraclePrice,
        config: &LendingConfig,
    ) -> LendingResult<Self> {
        config.validate()?;
        Self::new(address, state, oracle_price, config.recent_slot_duration_ms)
    }

    /// Same reserve with a newer account state
    pub fn with_state(&self, state: Reserve) -> LendingResult<Self> {
        Self::new(
            self.address,
            state,
            self.oracle_price.clone(),
            self.recent_slot_duration_ms,
        )
    }

    /// Same reserve with a newer oracle price
    pub fn with_oracle_price(&self, oracle_price: TokenOraclePrice) -> LendingResult<Self> {
        Self::new(
            self.address,
            self.state.clone(),
            oracle_price,
            self.recent_slot_duration_ms,
        )
    }

    fn format_reserve_stats(
        state: &Reserve,
        recent_slot_duration_ms: u64,
    ) -> LendingResult<ReserveStats> {
        if recent_slot_duration_ms == 0 {
            return Err(LendingError::InvalidConfig(
                "recent_slot_duration_ms must be positive".to_string(),
            ));
        }
        let config = &state.config;
        Ok(ReserveStats {
            status: state.status()?,
            mint_address: state.liquidity.mint_pubkey,
            borrow_curve: truncate_borrow_curve(&config.borrow_rate_curve),
            loan_to_value: from_percent(config.loan_to_value_pct),
            liquidation_threshold: from_percent(config.liquidation_threshold_pct),
            min_liquidation_bonus: from_bps(config.min_liquidation_bonus_bps),
            max_liquidation_bonus: from_bps(config.max_liquidation_bonus_bps),
            protocol_take_rate: from_percent(config.protocol_take_rate_pct),
            reserve_deposit_limit: to_decimal(config.deposit_limit),
            reserve_borrow_limit: to_decimal(config.borrow_limit),
            borrow_factor_pct: config.borrow_factor_pct,
            decimals: state.liquidity.mint_decimals,
            symbol: config.token_info.symbol(),
            mint_total_supply: to_decimal(state.collateral.mint_total_supply),
            accumulated_protocol_fees: sf_to_decimal(state.liquidity.accumulated_protocol_fees_sf),
            supply_apy: 0.0,
            borrow_apy: 0.0,
        })
    }

    /// Token symbol
    pub fn symbol(&self) -> &str {
        &self.stats.symbol
    }

    /// Liquidity mint
    pub fn get_liquidity_mint(&self) -> Pubkey {
        self.state.liquidity.mint_pubkey
    }

    /// Collateral mint
    pub fn get_collateral_mint(&self) -> Pubkey {
        self.state.collateral.mint_pubkey
    }

    /// Elevation groups the reserve belongs to, without the unused entries
    pub fn elevation_groups(&self) -> Vec<u8> {
        let mut groups = Vec::new();
        for id in self.state.config.elevation_groups.iter() {
            if *id != ELEVATION_GROUP_NONE && !groups.contains(id) {
                groups.push(*id);
            }
        }
        groups
    }

    /// True when `id` is a non-zero group the reserve belongs to
    pub fn is_in_elevation_group(&self, id: u8) -> bool {
        id != ELEVATION_GROUP_NONE && self.state.config.elevation_groups.contains(&id)
    }

    /// Liquidity available to borrow or withdraw
    pub fn get_liquidity_available_amount(&self) -> BigDecimal {
        to_decimal(self.state.liquidity.available_amount)
    }

    /// Borrowed liquidity at the snapshot
    pub fn get_borrowed_amount(&self) -> BigDecimal {
        sf_to_decimal(self.state.liquidity.borrowed_amount_sf)
    }

    /// Protocol fees at the snapshot
    pub fn get_accumulated_protocol_fees(&self) -> BigDecimal {
        sf_to_decimal(self.state.liquidity.accumulated_protocol_fees_sf)
    }

    /// Referrer fees at the snapshot
    pub fn get_accumulated_referrer_fees(&self) -> BigDecimal {
        sf_to_decimal(self.state.liquidity.accumulated_referrer_fees_sf)
    }

    /// Referrer fees not yet credited at the snapshot
    pub fn get_pending_referrer_fees(&self) -> BigDecimal {
        sf_to_decimal(self.state.liquidity.pending_referrer_fees_sf)
    }

    /// Price cached in the reserve at the last refresh
    pub fn get_reserve_market_price(&self) -> BigDecimal {
        sf_to_decimal(self.state.liquidity.market_price_sf)
    }

    /// Oracle price
    pub fn get_oracle_market_price(&self) -> BigDecimal {
        self.oracle_price.price.clone()
    }

    /// Base units per whole token
    pub fn get_mint_factor(&self) -> BigDecimal {
        ten_pow(self.state.liquidity.mint_decimals)
    }

    /// Cumulative borrow rate at the snapshot
    pub fn get_cumulative_borrow_rate(&self) -> BigDecimal {
        big_sf_to_decimal(&self.state.liquidity.cumulative_borrow_rate_bsf)
    }

    /// Collateral tokens in circulation
    pub fn get_collateral_mint_total_supply(&self) -> BigDecimal {
        self.stats.mint_total_supply.clone()
    }

    /// Liquidity owned by depositors: available + borrowed - fees owed
    pub fn get_total_supply(&self) -> BigDecimal {
        self.get_liquidity_available_amount() + self.get_borrowed_amount()
            - self.get_accumulated_protocol_fees()
            - self.get_accumulated_referrer_fees()
            - self.get_pending_referrer_fees()
    }

    /// Borrowed / total supply at the snapshot
    pub fn calculate_utilization_ratio(&self) -> BigDecimal {
        div_or_zero(&self.get_borrowed_amount(), &self.get_total_supply())
    }

    /// Collateral tokens per liquidity token at the snapshot
    pub fn get_collateral_exchange_rate(&self) -> BigDecimal {
        exchange_rate(&self.stats.mint_total_supply, &self.get_total_supply())
    }

    /// Origination fee ratio
    pub fn get_borrow_fee(&self) -> BigDecimal {
        sf_to_decimal(self.state.config.fees.borrow_fee_sf as u128)
    }

    /// Flash loan fee ratio
    pub fn get_flash_loan_fee(&self) -> BigDecimal {
        sf_to_decimal(self.state.config.fees.flash_loan_fee_sf as u128)
    }

    /// Fixed yearly rate paid to the host on top of the curve rate
    pub fn get_fixed_host_interest_rate(&self) -> BigDecimal {
        from_bps(self.state.config.host_fixed_interest_rate_bps)
    }

    /// Share of variable interest kept by the protocol
    pub fn get_protocol_take_rate(&self) -> BigDecimal {
        self.stats.protocol_take_rate.clone()
    }

    /// Debt weight
    pub fn get_borrow_factor(&self) -> BigDecimal {
        from_percent(self.stats.borrow_factor_pct)
    }

    /// Ratio between nominal and measured slot time
    pub fn slot_adjustment_factor(&self) -> BigDecimal {
        slot_adjustment_factor(self.recent_slot_duration_ms)
    }

    fn slots_elapsed(&self, slot: u64) -> u64 {
        slot.saturating_sub(self.state.last_update.slot)
    }

    /// Curve rate at `utilization`, adjusted to the measured slot time
    pub fn borrow_rate_at(&self, utilization: &BigDecimal) -> LendingResult<BigDecimal> {
        Ok(get_borrow_rate(utilization, &self.stats.borrow_curve)? * self.slot_adjustment_factor())
    }

    /// Variable borrow rate at the snapshot utilization
    pub fn current_borrow_rate(&self) -> LendingResult<BigDecimal> {
        self.borrow_rate_at(&self.calculate_utilization_ratio())
    }

    /// Borrow APR at the snapshot, variable rate plus host rate
    pub fn calculate_borrow_apr(&self) -> LendingResult<BigDecimal> {
        Ok(self.current_borrow_rate()? + self.get_fixed_host_interest_rate())
    }

    /// Supply APR at the snapshot
    pub fn calculate_supply_apr(&self) -> LendingResult<BigDecimal> {
        self.supply_apr_at(&self.calculate_utilization_ratio())
    }

    fn supply_apr_at(&self, utilization: &BigDecimal) -> LendingResult<BigDecimal> {
        let borrow_apr = self.borrow_rate_at(utilization)? + self.get_fixed_host_interest_rate();
        Ok(utilization * borrow_apr * (BigDecimal::one() - self.get_protocol_take_rate()))
    }

    /// Accrues interest over `slots_elapsed` and splits it between debt and fees
    pub fn compound_interest(
        &self,
        slots_elapsed: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<CompoundedInterest> {
        let current_borrow_rate = self.current_borrow_rate()?;
        let host_fixed_interest_rate = self.get_fixed_host_interest_rate();
        let protocol_take_rate = self.get_protocol_take_rate();
        let previous_debt = self.get_borrowed_amount();

        let compounded_interest_rate = round_decimal(approximate_compounded_interest(
            &(&current_borrow_rate + &host_fixed_interest_rate),
            slots_elapsed,
        ));
        let compounded_fixed_rate = round_decimal(approximate_compounded_interest(
            &host_fixed_interest_rate,
            slots_elapsed,
        ));

        let new_debt = round_decimal(&previous_debt * compounded_interest_rate);
        let fixed_host_fee = round_decimal(&previous_debt * compounded_fixed_rate) - &previous_debt;
        let net_new_debt = &new_debt - &previous_debt - &fixed_host_fee;

        let variable_protocol_fee = &net_new_debt * &protocol_take_rate;
        let absolute_referral_rate = &protocol_take_rate * from_bps(referral_fee_bps);
        let max_referral_fees = &net_new_debt * absolute_referral_rate;

        let new_acc_protocol_fees = variable_protocol_fee + fixed_host_fee - &max_referral_fees
            + self.get_accumulated_protocol_fees();
        let pending_referral_fees = self.get_pending_referrer_fees() + max_referral_fees;

        let new_total_supply = self.get_liquidity_available_amount() + &new_debt
            - &new_acc_protocol_fees
            - self.get_accumulated_referrer_fees()
            - &pending_referral_fees;

        Ok(CompoundedInterest {
            new_debt,
            new_acc_protocol_fees,
            pending_referral_fees,
            new_total_supply,
        })
    }

    fn estimate(&self, slot: u64, referral_fee_bps: u16) -> LendingResult<Option<CompoundedInterest>> {
        match self.slots_elapsed(slot) {
            0 => Ok(None),
            slots_elapsed => self
                .compound_interest(slots_elapsed, referral_fee_bps)
                .map(Some),
        }
    }

    /// Debt and supply projected to `slot`
    pub fn get_estimated_debt_and_supply(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<DebtAndSupply> {
        Ok(match self.estimate(slot, referral_fee_bps)? {
            Some(interest) => DebtAndSupply {
                debt: interest.new_debt,
                total_supply: interest.new_total_supply,
            },
            None => DebtAndSupply {
                debt: self.get_borrowed_amount(),
                total_supply: self.get_total_supply(),
            },
        })
    }

    /// Total supply projected to `slot`
    pub fn get_estimated_total_supply(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        Ok(self
            .get_estimated_debt_and_supply(slot, referral_fee_bps)?
            .total_supply)
    }

    /// Protocol fees projected to `slot`
    pub fn get_estimated_accumulated_protocol_fees(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        Ok(match self.estimate(slot, referral_fee_bps)? {
            Some(interest) => interest.new_acc_protocol_fees,
            None => self.get_accumulated_protocol_fees(),
        })
    }

    /// Pending referrer fees projected to `slot`
    pub fn get_estimated_pending_referrer_fees(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        Ok(match self.estimate(slot, referral_fee_bps)? {
            Some(interest) => interest.pending_referral_fees,
            None => self.get_pending_referrer_fees(),
        })
    }

    /// Utilization projected to `slot`
    pub fn get_estimated_utilization_ratio(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        let DebtAndSupply { debt, total_supply } =
            self.get_estimated_debt_and_supply(slot, referral_fee_bps)?;
        Ok(div_or_zero(&debt, &total_supply))
    }

    /// Collateral tokens per liquidity token projected to `slot`
    pub fn get_estimated_collateral_exchange_rate(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        let total_supply = self.get_estimated_total_supply(slot, referral_fee_bps)?;
        Ok(exchange_rate(&self.stats.mint_total_supply, &total_supply))
    }

    /// Borrow APR projected to `slot`
    pub fn calculate_estimated_borrow_apr(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        let utilization = self.get_estimated_utilization_ratio(slot, referral_fee_bps)?;
        Ok(self.borrow_rate_at(&utilization)? + self.get_fixed_host_interest_rate())
    }

    /// Supply APR projected to `slot`
    pub fn calculate_estimated_supply_apr(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        let utilization = self.get_estimated_utilization_ratio(slot, referral_fee_bps)?;
        self.supply_apr_at(&utilization)
    }

    /// Cumulative borrow rate projected to `slot`
    pub fn get_estimated_cumulative_borrow_rate(
        &self,
        slot: u64,
        referral_fee_bps: u16,
    ) -> LendingResult<BigDecimal> {
        let borrow_apr = self.calculate_estimated_borrow_apr(slot, referral_fee_bps)?;
        let compounded = round_decimal(approximate_compounded_interest(
            &borrow_apr,
            self.slots_elapsed(slot),
        ));
        Ok(round_decimal(self.get_cumulative_borrow_rate() * compounded))
    }

    /// Borrow APY at `slot`
    pub fn total_borrow_apy(&self, slot: u64, referral_fee_bps: u16) -> LendingResult<f64> {
        Ok(calculate_apy_from_apr(
            &self.calculate_estimated_borrow_apr(slot, referral_fee_bps)?,
        ))
    }

    /// Supply APY at `slot`
    pub fn total_supply_apy(&self, slot: u64, referral_fee_bps: u16) -> LendingResult<f64> {
        Ok(calculate_apy_from_apr(
            &self.calculate_estimated_supply_apr(slot, referral_fee_bps)?,
        ))
    }

    /// Value of total supply in the quote currency
    pub fn get_deposit_tvl(&self) -> BigDecimal {
        self.get_total_supply() * self.get_oracle_market_price() / self.get_mint_factor()
    }

    /// Value of borrowed liquidity in the quote currency
    pub fn get_borrow_tvl(&self) -> BigDecimal {
        self.get_borrowed_amount() * self.get_oracle_market_price() / self.get_mint_factor()
    }

    /// Total supply is above the deposit limit
    pub fn deposit_limit_crossed(&self) -> bool {
        self.get_total_supply() > self.stats.reserve_deposit_limit
    }

    /// Borrowed amount is above the borrow limit
    pub fn borrow_limit_crossed(&self) -> bool {
        self.get_borrowed_amount() > self.stats.reserve_borrow_limit
    }

    fn withdrawal_cap_current(&self, cap: &WithdrawalCaps, slot: u64) -> BigDecimal {
        if self.slots_elapsed(slot) >= SLOTS_PER_DAY {
            BigDecimal::zero()
        } else {
            to_decimal(cap.current_total)
        }
    }

    /// Deposit withdrawal cap per interval, 0 when disabled
    pub fn get_deposit_withdrawal_cap_capacity(&self) -> BigDecimal {
        to_decimal(self.state.config.deposit_withdrawal_cap.config_capacity)
    }

    /// Deposit outflow counted against the cap at `slot`
    pub fn get_deposit_withdrawal_cap_current(&self, slot: u64) -> BigDecimal {
        self.withdrawal_cap_current(&self.state.config.deposit_withdrawal_cap, slot)
    }

    /// Debt withdrawal cap per interval, 0 when disabled
    pub fn get_debt_withdrawal_cap_capacity(&self) -> BigDecimal {
        to_decimal(self.state.config.debt_withdrawal_cap.config_capacity)
    }

    /// Debt outflow counted against the cap at `slot`
    pub fn get_debt_withdrawal_cap_current(&self, slot: u64) -> BigDecimal {
        self.withdrawal_cap_current(&self.state.config.debt_withdrawal_cap, slot)
    }

    /// Borrow limit for obligations outside of elevation groups
    pub fn get_borrow_limit_outside_elevation_group(&self) -> BigDecimal {
        to_decimal(self.state.config.borrow_limit_outside_elevation_group)
    }

    /// Debt borrowed from this reserve outside of elevation groups
    pub fn get_borrowed_amount_outside_elevation_group(&self) -> BigDecimal {
        to_decimal(self.state.borrowed_amount_outside_elevation_group)
    }

    /// Debt limit against this reserve as collateral inside group `id`
    pub fn get_borrow_limit_against_collateral_in_elevation_group(&self, id: u8) -> BigDecimal {
        elevation_group_entry(
            &self.state.config.borrow_limit_against_this_collateral_in_elevation_group,
            id,
        )
    }

    /// Debt taken against this reserve as collateral inside group `id`
    pub fn get_borrowed_amount_against_collateral_in_elevation_group(&self, id: u8) -> BigDecimal {
        elevation_group_entry(
            &self.state.borrowed_amounts_against_this_reserve_in_elevation_groups,
            id,
        )
    }

    /// Room left under the debt limit against this collateral in group `id`, or under
    /// the outside limit of this reserve for group 0
    pub fn get_elevation_group_borrow_headroom(&self, id: u8) -> BigDecimal {
        if id == ELEVATION_GROUP_NONE {
            self.get_borrow_limit_outside_elevation_group()
                - self.get_borrowed_amount_outside_elevation_group()
        } else {
            self.get_borrow_limit_against_collateral_in_elevation_group(id)
                - self.get_borrowed_amount_against_collateral_in_elevation_group(id)
        }
    }

    /// Utilization after a hypothetical action, amounts in base units.
    /// Composite actions take the second leg in `outflow_amount`.
    pub fn calc_simulated_utilization_ratio(
        &self,
        amount: &BigDecimal,
        action: ActionType,
        slot: u64,
        referral_fee_bps: u16,
        outflow_amount: Option<&BigDecimal>,
    ) -> LendingResult<BigDecimal> {
        let DebtAndSupply { debt, total_supply } =
            self.get_estimated_debt_and_supply(slot, referral_fee_bps)?;
        let (new_debt, new_supply) = match action {
            ActionType::Deposit | ActionType::Mint => (debt, total_supply + amount),
            ActionType::Withdraw | ActionType::Redeem => (debt, total_supply - amount),
            ActionType::Borrow => (debt + amount, total_supply),
            ActionType::Repay => (debt - amount, total_supply),
            ActionType::DepositAndBorrow => {
                let outflow = required_outflow(action, outflow_amount)?;
                (debt + outflow, total_supply + amount)
            }
            ActionType::RepayAndWithdraw => {
                let outflow = required_outflow(action, outflow_amount)?;
                (debt - amount, total_supply - outflow)
            }
        };
        if new_supply <= BigDecimal::zero() {
            return Ok(BigDecimal::zero());
        }
        Ok(floor_at_zero(new_debt) / new_supply)
    }

    /// Borrow APR after a hypothetical action
    pub fn calc_simulated_borrow_apr(
        &self,
        amount: &BigDecimal,
        action: ActionType,
        slot: u64,
        referral_fee_bps: u16,
        outflow_amount: Option<&BigDecimal>,
    ) -> LendingResult<BigDecimal> {
        let utilization = self.calc_simulated_utilization_ratio(
            amount,
            action,
            slot,
            referral_fee_bps,
            outflow_amount,
        )?;
        Ok(self.borrow_rate_at(&utilization)? + self.get_fixed_host_interest_rate())
    }

    /// Supply APR after a hypothetical action
    pub fn calc_simulated_supply_apr(
        &self,
        amount: &BigDecimal,
        action: ActionType,
        slot: u64,
        referral_fee_bps: u16,
        outflow_amount: Option<&BigDecimal>,
    ) -> LendingResult<BigDecimal> {
        let utilization = self.calc_simulated_utilization_ratio(
            amount,
            action,
            slot,
            referral_fee_bps,
            outflow_amount,
        )?;
        self.supply_apr_at(&utilization)
    }

    /// Borrow APY after a hypothetical action
    pub fn calc_simulated_borrow_apy(
        &self,
        amount: &BigDecimal,
        action: ActionType,
        slot: u64,
        referral_fee_bps: u16,
        outflow_amount: Option<&BigDecimal>,
    ) -> LendingResult<f64> {
        Ok(calculate_apy_from_apr(&self.calc_simulated_borrow_apr(
            amount,
            action,
            slot,
            referral_fee_bps,
            outflow_amount,
        )?))
    }

    /// Supply APY after a hypothetical action
    pub fn calc_simulated_supply_apy(
        &self,
        amount: &BigDecimal,
        action: ActionType,
        slot: u64,
        referral_fee_bps: u16,
        outflow_amount: Option<&BigDecimal>,
    ) -> LendingResult<f64> {
        Ok(calculate_apy_from_apr(&self.calc_simulated_supply_apr(
            amount,
            action,
            slot,
            referral_fee_bps,
            outflow_amount,
        )?))
    }

    /// Reserve side limits on a new borrow, starting from `requested` tokens or
    /// from the available liquidity when `None`.
    ///
    /// Clamps in order: available liquidity, borrow limit, debt withdrawal cap,
    /// origination fee, utilization ceiling. The result may be negative.
    pub fn limit_borrow_amount(&self, requested: Option<BigDecimal>, slot: u64) -> BigDecimal {
        let available = self.get_liquidity_available_amount();
        let borrow_cap_remaining = &self.stats.reserve_borrow_limit - self.get_borrowed_amount();
        let mut max_borrow = min(available, borrow_cap_remaining);
        if let Some(requested) = requested {
            max_borrow = min(max_borrow, requested);
        }

        let debt_cap_capacity = self.get_debt_withdrawal_cap_capacity();
        if debt_cap_capacity > BigDecimal::zero() {
            let debt_cap_remaining = debt_cap_capacity - self.get_debt_withdrawal_cap_current(slot);
            max_borrow = min(max_borrow, debt_cap_remaining);
        }

        let borrow_fee = self.get_borrow_fee();
        let inclusive_fee_rate = &borrow_fee / (BigDecimal::one() + &borrow_fee);
        max_borrow = &max_borrow - &max_borrow * inclusive_fee_rate;

        let utilization_limit_pct = self
            .state
            .config
            .utilization_limit_block_borrowing_above_pct;
        if utilization_limit_pct > 0 {
            let utilization_limit = from_percent(utilization_limit_pct);
            let utilization = self.calculate_utilization_ratio();
            if utilization > utilization_limit {
                return BigDecimal::zero();
            }
            let utilization_headroom = (utilization_limit - utilization) * self.get_total_supply();
            max_borrow = min(max_borrow, utilization_headroom);
        }

        max_borrow
    }

    /// Largest amount of this reserve borrowable against `coll_reserve` alone,
    /// inside the best common elevation group of the pair if there is one
    pub fn get_max_borrow_amount_with_coll_reserve<M: MarketContext>(
        &self,
        market: &M,
        coll_reserve: &KaminoReserve,
        slot: u64,
    ) -> LendingResult<BigDecimal> {
        let common_groups = market.get_common_elevation_groups_for_pair(coll_reserve, self);
        let elevation_group = market
            .get_elevation_group_with_max_ltv(&common_groups)
            .map(|group| group.id)
            .unwrap_or(ELEVATION_GROUP_NONE);

        let max_borrow = self.limit_borrow_amount(None, slot);
        let group_headroom = if self.is_in_elevation_group(elevation_group) {
            coll_reserve.get_elevation_group_borrow_headroom(elevation_group)
        } else {
            self.get_elevation_group_borrow_headroom(ELEVATION_GROUP_NONE)
        };
        Ok(floor_at_zero(min(max_borrow, group_headroom)))
    }

    /// True while the reserve accepts new deposits and borrows
    pub fn is_active(&self) -> bool {
        self.stats.status == ReserveStatus::Active
    }
}

fn exchange_rate(mint_total_supply: &BigDecimal, total_supply: &BigDecimal) -> BigDecimal {
    if mint_total_supply.is_zero() || total_supply.is_zero() {
        BigDecimal::one()
    } else {
        mint_total_supply / total_supply
    }
}

fn elevation_group_entry(entries: &[u64], id: u8) -> BigDecimal {
    (id as usize)
        .checked_sub(1)
        .and_then(|index| entries.get(index))
        .map(|entry| to_decimal(*entry))
        .unwrap_or_else(BigDecimal::zero)
}

fn required_outflow(action: ActionType, outflow_amount: Option<&BigDecimal>) -> LendingResult<&BigDecimal> {
    outflow_amount.ok_or_else(|| LendingError::MissingActionParameter {
        action: action.to_string(),
        parameter: "outflow_amount",
    })
}
