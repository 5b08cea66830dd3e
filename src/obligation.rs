//! Obligation model
//!
//! Positions and risk statistics are rebuilt from an obligation snapshot and the
//! reserves it references. Simulation produces new values and never touches the
//! obligation itself.

use crate::{
    action::ActionType,
    error::{LendingError, LendingResult},
    market::{group_allows_debt_reserve, MarketContext},
    math::{big_sf_to_decimal, div_or_zero, floor_at_zero, from_percent, sf_to_decimal, to_decimal},
    reserve::KaminoReserve,
    state::{is_not_null_pubkey, Obligation, ObligationLiquidity, ELEVATION_GROUP_NONE},
};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use solana_program::pubkey::Pubkey;
use std::{
    cmp::min,
    collections::{HashMap, HashSet},
};

/// Reserve address to rate
pub type RateMap = HashMap<Pubkey, BigDecimal>;

/// Share of the computed max withdraw value actually offered, keeps the
/// obligation clear of the borrow limit after rounding
pub fn max_withdraw_haircut() -> BigDecimal {
    BigDecimal::new(BigInt::from(995u16), 3)
}

/// Exposure of an obligation to one reserve
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Reserve address
    pub reserve_address: Pubkey,
    /// Liquidity mint
    pub mint_address: Pubkey,
    /// Liquidity amount in base units
    pub amount: BigDecimal,
    /// Value in the quote currency at the oracle price
    pub market_value_refreshed: BigDecimal,
}

/// Risk statistics of an obligation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObligationStats {
    /// Value of all deposits
    pub user_total_deposit: BigDecimal,
    /// Value of deposits in reserves with a non-zero LTV
    pub user_total_collateral_deposit: BigDecimal,
    /// Value of all debt
    pub user_total_borrow: BigDecimal,
    /// Value of all debt weighted by borrow factor
    pub user_total_borrow_borrow_factor_adjusted: BigDecimal,
    /// Debt value allowed by the deposits
    pub borrow_limit: BigDecimal,
    /// Debt value at which the obligation can be liquidated
    pub borrow_liquidation_limit: BigDecimal,
    /// Weighted debt / borrow limit
    pub borrow_utilization: BigDecimal,
    /// Deposits - debt
    pub net_account_value: BigDecimal,
    /// Weighted debt / collateral deposits
    pub loan_to_value: BigDecimal,
    /// Liquidation limit / deposits
    pub liquidation_ltv: BigDecimal,
    /// Deposits / net value
    pub leverage: BigDecimal,
    /// Elevation groups every referenced reserve belongs to
    pub potential_elevation_groups: Vec<u8>,
}

impl ObligationStats {
    fn recompute_ratios(&mut self) {
        self.borrow_utilization = div_or_zero(
            &self.user_total_borrow_borrow_factor_adjusted,
            &self.borrow_limit,
        );
        self.net_account_value = &self.user_total_deposit - &self.user_total_borrow;
        self.loan_to_value = div_or_zero(
            &self.user_total_borrow_borrow_factor_adjusted,
            &self.user_total_collateral_deposit,
        );
        self.liquidation_ltv = div_or_zero(&self.borrow_liquidation_limit, &self.user_total_deposit);
        self.leverage = div_or_zero(&self.user_total_deposit, &self.net_account_value);
    }
}

/// Hypothetical action on an obligation, amounts in liquidity base units
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationParams {
    /// Action
    pub action: ActionType,
    /// Collateral leg amount
    pub amount_collateral: Option<BigDecimal>,
    /// Collateral leg liquidity mint
    pub mint_collateral: Option<Pubkey>,
    /// Debt leg amount
    pub amount_debt: Option<BigDecimal>,
    /// Debt leg liquidity mint
    pub mint_debt: Option<Pubkey>,
    /// Elevation group to simulate with instead of the obligation's
    pub elevation_group_override: Option<u8>,
}

impl SimulationParams {
    /// Single leg deposit
    pub fn deposit(mint: Pubkey, amount: BigDecimal) -> Self {
        Self::collateral(ActionType::Deposit, mint, amount)
    }

    /// Single leg withdraw
    pub fn withdraw(mint: Pubkey, amount: BigDecimal) -> Self {
        Self::collateral(ActionType::Withdraw, mint, amount)
    }

    /// Single leg borrow
    pub fn borrow(mint: Pubkey, amount: BigDecimal) -> Self {
        Self::debt(ActionType::Borrow, mint, amount)
    }

    /// Single leg repay
    pub fn repay(mint: Pubkey, amount: BigDecimal) -> Self {
        Self::debt(ActionType::Repay, mint, amount)
    }

    fn collateral(action: ActionType, mint: Pubkey, amount: BigDecimal) -> Self {
        Self {
            action,
            amount_collateral: Some(amount),
            mint_collateral: Some(mint),
            amount_debt: None,
            mint_debt: None,
            elevation_group_override: None,
        }
    }

    fn debt(action: ActionType, mint: Pubkey, amount: BigDecimal) -> Self {
        Self {
            action,
            amount_collateral: None,
            mint_collateral: None,
            amount_debt: Some(amount),
            mint_debt: Some(mint),
            elevation_group_override: None,
        }
    }

    fn collateral_leg(&self) -> LendingResult<(Pubkey, &BigDecimal)> {
        match (&self.mint_collateral, &self.amount_collateral) {
            (Some(mint), Some(amount)) => Ok((*mint, amount)),
            (None, _) => Err(self.missing("mint_collateral")),
            (_, None) => Err(self.missing("amount_collateral")),
        }
    }

    fn debt_leg(&self) -> LendingResult<(Pubkey, &BigDecimal)> {
        match (&self.mint_debt, &self.amount_debt) {
            (Some(mint), Some(amount)) => Ok((*mint, amount)),
            (None, _) => Err(self.missing("mint_debt")),
            (_, None) => Err(self.missing("amount_debt")),
        }
    }

    fn missing(&self, parameter: &'static str) -> LendingError {
        LendingError::MissingActionParameter {
            action: self.action.to_string(),
            parameter,
        }
    }
}

/// Positions and statistics after a simulated action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationResult {
    /// Statistics
    pub stats: ObligationStats,
    /// Deposits by reserve
    pub deposits: HashMap<Pubkey, Position>,
    /// Borrows by reserve
    pub borrows: HashMap<Pubkey, Position>,
}

/// Obligation snapshot with positions and statistics
#[derive(Clone, Debug)]
pub struct KaminoObligation {
    /// Obligation address
    pub obligation_address: Pubkey,
    /// Obligation account state
    pub state: Obligation,
    /// Deposits by reserve
    pub deposits: HashMap<Pubkey, Position>,
    /// Borrows by reserve
    pub borrows: HashMap<Pubkey, Position>,
    /// Statistics at the rates used for construction
    pub refreshed_stats: ObligationStats,
}

impl KaminoObligation {
    /// Obligation from its account state and per reserve rates.
    ///
    /// `collateral_exchange_rates` and `cumulative_borrow_rates` must hold an entry
    /// for every reserve the obligation references.
    pub fn new<M: MarketContext>(
        market: &M,
        obligation_address: Pubkey,
        state: Obligation,
        collateral_exchange_rates: &RateMap,
        cumulative_borrow_rates: &RateMap,
    ) -> LendingResult<Self> {
        let elevation_group = state.elevation_group;
        let mut stats = ObligationStats::default();

        let mut deposits = HashMap::new();
        for deposit in state
            .deposits
            .iter()
            .filter(|deposit| is_not_null_pubkey(&deposit.deposit_reserve))
        {
            let reserve = market.get_existing_reserve_by_address(&deposit.deposit_reserve)?;
            let exchange_rate = collateral_exchange_rates
                .get(&deposit.deposit_reserve)
                .ok_or(LendingError::ReserveNotFound(deposit.deposit_reserve))?;
            let amount = div_or_zero(&to_decimal(deposit.deposited_amount), exchange_rate);
            let market_value = position_value(reserve, &amount);
            let (max_ltv, liquidation_ltv) = get_ltv_for_reserve(market, reserve, elevation_group);

            stats.user_total_deposit += &market_value;
            if !max_ltv.is_zero() {
                stats.user_total_collateral_deposit += &market_value;
            }
            stats.borrow_limit += &market_value * max_ltv;
            stats.borrow_liquidation_limit += &market_value * liquidation_ltv;

            log::trace!(
                "Deposit of {} in reserve {} worth {}",
                amount,
                deposit.deposit_reserve,
                market_value
            );
            add_to_position(
                &mut deposits,
                deposit.deposit_reserve,
                reserve.get_liquidity_mint(),
                amount,
                market_value,
            );
        }

        let mut borrows = HashMap::new();
        for borrow in state
            .borrows
            .iter()
            .filter(|borrow| is_not_null_pubkey(&borrow.borrow_reserve))
        {
            let reserve = market.get_existing_reserve_by_address(&borrow.borrow_reserve)?;
            let cumulative_borrow_rate = cumulative_borrow_rates
                .get(&borrow.borrow_reserve)
                .ok_or(LendingError::ReserveNotFound(borrow.borrow_reserve))?;
            let amount = rebase_borrowed_amount(borrow, cumulative_borrow_rate);
            let market_value = position_value(reserve, &amount);
            let borrow_factor = if elevation_group != ELEVATION_GROUP_NONE {
                BigDecimal::one()
            } else {
                reserve.get_borrow_factor()
            };

            stats.user_total_borrow += &market_value;
            stats.user_total_borrow_borrow_factor_adjusted += &market_value * borrow_factor;

            log::trace!(
                "Borrow of {} from reserve {} worth {}",
                amount,
                borrow.borrow_reserve,
                market_value
            );
            add_to_position(
                &mut borrows,
                borrow.borrow_reserve,
                reserve.get_liquidity_mint(),
                amount,
                market_value,
            );
        }

        stats.recompute_ratios();
        stats.potential_elevation_groups =
            eligible_elevation_groups(market, deposits.keys().chain(borrows.keys()))?;

        log::debug!(
            "Loaded obligation {} with {} deposits and {} borrows",
            obligation_address,
            deposits.len(),
            borrows.len()
        );

        Ok(Self {
            obligation_address,
            state,
            deposits,
            borrows,
            refreshed_stats: stats,
        })
    }

    /// Obligation with rates estimated at `slot` for its own reserves
    pub fn load<M: MarketContext>(
        market: &M,
        obligation_address: Pubkey,
        state: Obligation,
        slot: u64,
    ) -> LendingResult<Self> {
        let (collateral_exchange_rates, cumulative_borrow_rates) =
            get_rates_for_obligations(market, std::iter::once(&state), slot)?;
        Self::new(
            market,
            obligation_address,
            state,
            &collateral_exchange_rates,
            &cumulative_borrow_rates,
        )
    }

    /// Obligations sharing one pair of rate maps, computed once per reserve.
    /// Accounts that do not exist map to `None`.
    pub fn load_all<M: MarketContext>(
        market: &M,
        accounts: Vec<(Pubkey, Option<Obligation>)>,
        slot: u64,
    ) -> LendingResult<Vec<Option<Self>>> {
        let (collateral_exchange_rates, cumulative_borrow_rates) = get_rates_for_obligations(
            market,
            accounts.iter().filter_map(|(_, state)| state.as_ref()),
            slot,
        )?;
        log::debug!(
            "Loading {} obligations with rates for {} reserves",
            accounts.len(),
            collateral_exchange_rates.len()
        );

        accounts
            .into_iter()
            .map(|(address, state)| {
                state
                    .map(|state| {
                        Self::new(
                            market,
                            address,
                            state,
                            &collateral_exchange_rates,
                            &cumulative_borrow_rates,
                        )
                    })
                    .transpose()
            })
            .collect()
    }

    /// Owner
    pub fn owner(&self) -> Pubkey {
        self.state.owner
    }

    /// Elevation group, 0 for none
    pub fn elevation_group(&self) -> u8 {
        self.state.elevation_group
    }

    /// Deposits as a list
    pub fn get_deposits(&self) -> Vec<&Position> {
        self.deposits.values().collect()
    }

    /// Borrows as a list
    pub fn get_borrows(&self) -> Vec<&Position> {
        self.borrows.values().collect()
    }

    /// Number of deposits plus borrows
    pub fn get_number_of_positions(&self) -> usize {
        self.deposits.len() + self.borrows.len()
    }

    /// Deposit in `reserve`
    pub fn get_deposit_by_reserve(&self, reserve: &Pubkey) -> Option<&Position> {
        self.deposits.get(reserve)
    }

    /// Borrow from `reserve`
    pub fn get_borrow_by_reserve(&self, reserve: &Pubkey) -> Option<&Position> {
        self.borrows.get(reserve)
    }

    /// Deposit of liquidity `mint`
    pub fn get_deposit_by_mint(&self, mint: &Pubkey) -> Option<&Position> {
        self.deposits.values().find(|position| position.mint_address == *mint)
    }

    /// Borrow of liquidity `mint`
    pub fn get_borrow_by_mint(&self, mint: &Pubkey) -> Option<&Position> {
        self.borrows.values().find(|position| position.mint_address == *mint)
    }

    /// Deposited amount in `reserve`, 0 when absent
    pub fn get_deposit_amount_by_reserve(&self, reserve: &Pubkey) -> BigDecimal {
        self.get_deposit_by_reserve(reserve)
            .map(|position| position.amount.clone())
            .unwrap_or_else(BigDecimal::zero)
    }

    /// Borrowed amount from `reserve`, 0 when absent
    pub fn get_borrow_amount_by_reserve(&self, reserve: &Pubkey) -> BigDecimal {
        self.get_borrow_by_reserve(reserve)
            .map(|position| position.amount.clone())
            .unwrap_or_else(BigDecimal::zero)
    }

    /// Deposit value cached on-chain
    pub fn get_deposited_value(&self) -> BigDecimal {
        sf_to_decimal(self.state.deposited_value_sf)
    }

    /// Debt value cached on-chain
    pub fn get_borrowed_market_value(&self) -> BigDecimal {
        sf_to_decimal(self.state.borrowed_assets_market_value_sf)
    }

    /// Weighted debt value cached on-chain
    pub fn get_borrowed_market_value_bf_adjusted(&self) -> BigDecimal {
        sf_to_decimal(self.state.borrow_factor_adjusted_debt_value_sf)
    }

    /// Allowed debt value cached on-chain
    pub fn get_allowed_borrow_value(&self) -> BigDecimal {
        sf_to_decimal(self.state.allowed_borrow_value_sf)
    }

    /// Liquidation debt value cached on-chain
    pub fn get_unhealthy_borrow_value(&self) -> BigDecimal {
        sf_to_decimal(self.state.unhealthy_borrow_value_sf)
    }

    /// Weighted debt within the liquidation limit
    pub fn is_healthy(&self) -> bool {
        self.refreshed_stats.user_total_borrow_borrow_factor_adjusted
            <= self.refreshed_stats.borrow_liquidation_limit
    }

    /// Elevation groups every reserve of the obligation belongs to
    pub fn get_elevation_groups<M: MarketContext>(&self, market: &M) -> LendingResult<Vec<u8>> {
        eligible_elevation_groups(market, self.deposits.keys().chain(self.borrows.keys()))
    }

    /// Elevation groups every one of `reserves` belongs to
    pub fn get_elevation_groups_for_reserves(reserves: &[&KaminoReserve]) -> Vec<u8> {
        let mut distinct = HashSet::new();
        let reserves = reserves
            .iter()
            .filter(|reserve| distinct.insert(reserve.address))
            .copied()
            .collect::<Vec<_>>();
        elevation_groups_shared_by(&reserves)
    }

    /// Growth of a borrow between its snapshot and `slot`, 1 when it did not grow
    pub fn estimate_obligation_interest_rate<M: MarketContext>(
        market: &M,
        reserve: &KaminoReserve,
        borrow: &ObligationLiquidity,
        slot: u64,
    ) -> LendingResult<BigDecimal> {
        let estimated_cumulative_borrow_rate =
            reserve.get_estimated_cumulative_borrow_rate(slot, market.referral_fee_bps())?;
        let current_cumulative_borrow_rate = big_sf_to_decimal(&borrow.cumulative_borrow_rate_bsf);
        if estimated_cumulative_borrow_rate > current_cumulative_borrow_rate
            && !current_cumulative_borrow_rate.is_zero()
        {
            Ok(estimated_cumulative_borrow_rate / current_cumulative_borrow_rate)
        } else {
            Ok(BigDecimal::one())
        }
    }

    /// Positions and statistics as loaded
    pub fn current_simulation(&self) -> SimulationResult {
        SimulationResult {
            stats: self.refreshed_stats.clone(),
            deposits: self.deposits.clone(),
            borrows: self.borrows.clone(),
        }
    }

    /// Statistics after a hypothetical action
    pub fn get_simulated_obligation_stats<M: MarketContext>(
        &self,
        market: &M,
        params: &SimulationParams,
    ) -> LendingResult<SimulationResult> {
        self.simulate_from(market, self.current_simulation(), params)
    }

    /// Applies a hypothetical action on top of an earlier simulation
    pub fn simulate_from<M: MarketContext>(
        &self,
        market: &M,
        base: SimulationResult,
        params: &SimulationParams,
    ) -> LendingResult<SimulationResult> {
        let elevation_group = params
            .elevation_group_override
            .unwrap_or(self.state.elevation_group);

        let mut result = match params.action {
            ActionType::Deposit => {
                let (mint, amount) = params.collateral_leg()?;
                self.calculate_simulated_deposit(market, base, mint, amount, elevation_group)?
            }
            ActionType::Withdraw => {
                let (mint, amount) = params.collateral_leg()?;
                self.calculate_simulated_deposit(market, base, mint, &-amount.clone(), elevation_group)?
            }
            ActionType::Borrow => {
                let (mint, amount) = params.debt_leg()?;
                self.calculate_simulated_borrow(market, base, mint, amount, elevation_group)?
            }
            ActionType::Repay => {
                let (mint, amount) = params.debt_leg()?;
                self.calculate_simulated_borrow(market, base, mint, &-amount.clone(), elevation_group)?
            }
            ActionType::DepositAndBorrow => {
                let (coll_mint, coll_amount) = params.collateral_leg()?;
                let (debt_mint, debt_amount) = params.debt_leg()?;
                let after_deposit = self.calculate_simulated_deposit(
                    market,
                    base,
                    coll_mint,
                    coll_amount,
                    elevation_group,
                )?;
                self.calculate_simulated_borrow(
                    market,
                    after_deposit,
                    debt_mint,
                    debt_amount,
                    elevation_group,
                )?
            }
            ActionType::RepayAndWithdraw => {
                let (coll_mint, coll_amount) = params.collateral_leg()?;
                let (debt_mint, debt_amount) = params.debt_leg()?;
                let after_repay = self.calculate_simulated_borrow(
                    market,
                    base,
                    debt_mint,
                    &-debt_amount.clone(),
                    elevation_group,
                )?;
                self.calculate_simulated_deposit(
                    market,
                    after_repay,
                    coll_mint,
                    &-coll_amount.clone(),
                    elevation_group,
                )?
            }
            ActionType::Mint | ActionType::Redeem => {
                log::warn!(
                    "Rejected {} simulation on obligation {}",
                    params.action,
                    self.obligation_address
                );
                return Err(LendingError::InvalidActionType(params.action.to_string()));
            }
        };

        result.stats.recompute_ratios();
        result.stats.potential_elevation_groups = eligible_elevation_groups(
            market,
            result.deposits.keys().chain(result.borrows.keys()),
        )?;
        Ok(result)
    }

    /// Adds a signed deposit of `amount` liquidity of `mint` to `base`
    pub fn calculate_simulated_deposit<M: MarketContext>(
        &self,
        market: &M,
        base: SimulationResult,
        mint: Pubkey,
        amount: &BigDecimal,
        elevation_group: u8,
    ) -> LendingResult<SimulationResult> {
        let reserve = market.get_existing_reserve_by_mint(&mint)?;
        check_elevation_group(reserve, elevation_group)?;
        let SimulationResult {
            mut stats,
            mut deposits,
            borrows,
        } = base;

        let value = position_value(reserve, amount);
        let (max_ltv, liquidation_ltv) = get_ltv_for_reserve(market, reserve, elevation_group);

        stats.user_total_deposit = floor_at_zero(&stats.user_total_deposit + &value);
        if !max_ltv.is_zero() {
            stats.user_total_collateral_deposit =
                floor_at_zero(&stats.user_total_collateral_deposit + &value);
        }
        stats.borrow_limit = floor_at_zero(&stats.borrow_limit + &value * max_ltv);
        stats.borrow_liquidation_limit =
            floor_at_zero(&stats.borrow_liquidation_limit + &value * liquidation_ltv);

        apply_to_position(&mut deposits, reserve, amount);

        Ok(SimulationResult {
            stats,
            deposits,
            borrows,
        })
    }

    /// Adds a signed borrow of `amount` liquidity of `mint` to `base`
    pub fn calculate_simulated_borrow<M: MarketContext>(
        &self,
        market: &M,
        base: SimulationResult,
        mint: Pubkey,
        amount: &BigDecimal,
        elevation_group: u8,
    ) -> LendingResult<SimulationResult> {
        let reserve = market.get_existing_reserve_by_mint(&mint)?;
        check_elevation_group(reserve, elevation_group)?;
        let SimulationResult {
            mut stats,
            deposits,
            mut borrows,
        } = base;

        let value = position_value(reserve, amount);
        let borrow_factor = get_borrow_factor_for_reserve(reserve, elevation_group);

        stats.user_total_borrow = floor_at_zero(&stats.user_total_borrow + &value);
        stats.user_total_borrow_borrow_factor_adjusted = floor_at_zero(
            &stats.user_total_borrow_borrow_factor_adjusted + &value * borrow_factor,
        );

        apply_to_position(&mut borrows, reserve, amount);

        Ok(SimulationResult {
            stats,
            deposits,
            borrows,
        })
    }

    /// Largest amount of liquidity `mint` the obligation can borrow at `slot`.
    ///
    /// With `request_elevation_group` the best elevation group shared by the debt
    /// reserve and every deposit is used instead of the obligation's own group.
    pub fn get_max_borrow_amount<M: MarketContext>(
        &self,
        market: &M,
        mint: &Pubkey,
        slot: u64,
        request_elevation_group: bool,
    ) -> LendingResult<BigDecimal> {
        let reserve = market.get_existing_reserve_by_mint(mint)?;

        let mut deposit_reserves = Vec::with_capacity(self.deposits.len());
        for reserve_address in self.deposits.keys() {
            deposit_reserves.push(market.get_existing_reserve_by_address(reserve_address)?);
        }

        let common_groups = reserve
            .elevation_groups()
            .into_iter()
            .filter_map(|id| market.get_elevation_group(id))
            .filter(|group| group_allows_debt_reserve(group, &reserve.address))
            .filter(|group| {
                deposit_reserves
                    .iter()
                    .all(|deposit_reserve| deposit_reserve.is_in_elevation_group(group.id))
            })
            .copied()
            .collect::<Vec<_>>();

        let mut elevation_group = self.state.elevation_group;
        if request_elevation_group {
            if let Some(group) = market.get_elevation_group_with_max_ltv(&common_groups) {
                elevation_group = group.id;
            }
        }
        let elevation_group_activated = reserve.is_in_elevation_group(elevation_group);

        let stats = &self.refreshed_stats;
        let borrow_factor = get_borrow_factor_for_reserve(reserve, elevation_group);
        let borrow_power_value = &stats.borrow_limit - &stats.user_total_borrow_borrow_factor_adjusted;
        let borrow_power = div_or_zero(
            &div_or_zero(&borrow_power_value, &borrow_factor),
            &reserve.get_oracle_market_price(),
        ) * reserve.get_mint_factor();

        let collateral_outside_group_blocked = deposit_reserves
            .iter()
            .any(|deposit_reserve| deposit_reserve.state.config.disable_usage_as_coll_outside_emode != 0);
        if collateral_outside_group_blocked && !elevation_group_activated {
            return Ok(BigDecimal::zero());
        }

        let max_borrow = reserve.limit_borrow_amount(Some(borrow_power), slot);

        let group_headroom = if elevation_group_activated {
            deposit_reserves
                .iter()
                .map(|deposit_reserve| deposit_reserve.get_elevation_group_borrow_headroom(elevation_group))
                .min()
        } else {
            Some(reserve.get_elevation_group_borrow_headroom(ELEVATION_GROUP_NONE))
        };

        let max_borrow = match group_headroom {
            Some(headroom) => min(max_borrow, headroom),
            None => max_borrow,
        };
        Ok(floor_at_zero(max_borrow))
    }

    /// Largest amount of liquidity `mint` the obligation can withdraw at `slot`
    pub fn get_max_withdraw_amount<M: MarketContext>(
        &self,
        market: &M,
        mint: &Pubkey,
        slot: u64,
    ) -> LendingResult<BigDecimal> {
        let reserve = market.get_existing_reserve_by_mint(mint)?;
        let deposit_amount = self
            .get_deposit_by_reserve(&reserve.address)
            .map(|position| position.amount.clone())
            .ok_or(LendingError::DepositNotFound(reserve.address))?;

        let stats = &self.refreshed_stats;
        if stats.user_total_borrow_borrow_factor_adjusted.is_zero() {
            return Ok(deposit_amount);
        }
        if stats.user_total_borrow_borrow_factor_adjusted >= stats.borrow_limit {
            return Ok(BigDecimal::zero());
        }

        let (max_ltv, _) = get_ltv_for_reserve(market, reserve, self.state.elevation_group);
        let max_withdraw_amount = if max_ltv.is_zero() {
            deposit_amount.clone()
        } else {
            let max_withdraw_value = (&stats.borrow_limit
                - &stats.user_total_borrow_borrow_factor_adjusted)
                / max_ltv
                * max_withdraw_haircut();
            div_or_zero(&max_withdraw_value, &reserve.get_oracle_market_price())
                * reserve.get_mint_factor()
        };

        let mut max_withdraw = min(deposit_amount, max_withdraw_amount);
        max_withdraw = min(max_withdraw, reserve.get_liquidity_available_amount());
        let deposit_cap_capacity = reserve.get_deposit_withdrawal_cap_capacity();
        if deposit_cap_capacity > BigDecimal::zero() {
            let deposit_cap_remaining =
                deposit_cap_capacity - reserve.get_deposit_withdrawal_cap_current(slot);
            max_withdraw = min(max_withdraw, deposit_cap_remaining);
        }
        Ok(floor_at_zero(max_withdraw))
    }
}

/// LTV and liquidation threshold of `reserve`, from the elevation group when the
/// reserve belongs to it
pub fn get_ltv_for_reserve<M: MarketContext>(
    market: &M,
    reserve: &KaminoReserve,
    elevation_group: u8,
) -> (BigDecimal, BigDecimal) {
    if reserve.is_in_elevation_group(elevation_group) {
        match market.get_elevation_group(elevation_group) {
            Some(group) => {
                return (
                    from_percent(group.ltv_pct),
                    from_percent(group.liquidation_threshold_pct),
                )
            }
            None => log::warn!(
                "Elevation group {} of reserve {} is not configured in the market",
                elevation_group,
                reserve.address
            ),
        }
    }
    (
        reserve.stats.loan_to_value.clone(),
        reserve.stats.liquidation_threshold.clone(),
    )
}

/// Debt weight of `reserve`, 1 inside an elevation group the reserve belongs to
pub fn get_borrow_factor_for_reserve(reserve: &KaminoReserve, elevation_group: u8) -> BigDecimal {
    if reserve.is_in_elevation_group(elevation_group) {
        BigDecimal::one()
    } else {
        reserve.get_borrow_factor()
    }
}

/// Collateral exchange rates and cumulative borrow rates at `slot` for every
/// reserve referenced by `obligations`, each reserve computed once
pub fn get_rates_for_obligations<'a, M, I>(
    market: &M,
    obligations: I,
    slot: u64,
) -> LendingResult<(RateMap, RateMap)>
where
    M: MarketContext,
    I: IntoIterator<Item = &'a Obligation>,
{
    let mut collateral_exchange_rates = RateMap::new();
    let mut cumulative_borrow_rates = RateMap::new();
    for obligation in obligations {
        add_rates_for_obligation(
            market,
            obligation,
            slot,
            &mut collateral_exchange_rates,
            &mut cumulative_borrow_rates,
        )?;
    }
    Ok((collateral_exchange_rates, cumulative_borrow_rates))
}

/// Adds the rates of reserves referenced by `obligation` that are not in the maps yet
pub fn add_rates_for_obligation<M: MarketContext>(
    market: &M,
    obligation: &Obligation,
    slot: u64,
    collateral_exchange_rates: &mut RateMap,
    cumulative_borrow_rates: &mut RateMap,
) -> LendingResult<()> {
    let referral_fee_bps = market.referral_fee_bps();
    for deposit in obligation
        .deposits
        .iter()
        .filter(|deposit| is_not_null_pubkey(&deposit.deposit_reserve))
    {
        if collateral_exchange_rates.contains_key(&deposit.deposit_reserve) {
            continue;
        }
        let reserve = market.get_existing_reserve_by_address(&deposit.deposit_reserve)?;
        collateral_exchange_rates.insert(
            deposit.deposit_reserve,
            reserve.get_estimated_collateral_exchange_rate(slot, referral_fee_bps)?,
        );
    }
    for borrow in obligation
        .borrows
        .iter()
        .filter(|borrow| is_not_null_pubkey(&borrow.borrow_reserve))
    {
        if cumulative_borrow_rates.contains_key(&borrow.borrow_reserve) {
            continue;
        }
        let reserve = market.get_existing_reserve_by_address(&borrow.borrow_reserve)?;
        cumulative_borrow_rates.insert(
            borrow.borrow_reserve,
            reserve.get_estimated_cumulative_borrow_rate(slot, referral_fee_bps)?,
        );
    }
    Ok(())
}

fn position_value(reserve: &KaminoReserve, amount: &BigDecimal) -> BigDecimal {
    amount * reserve.get_oracle_market_price() / reserve.get_mint_factor()
}

fn rebase_borrowed_amount(borrow: &ObligationLiquidity, cumulative_borrow_rate: &BigDecimal) -> BigDecimal {
    let borrowed_amount = sf_to_decimal(borrow.borrowed_amount_sf);
    let snapshot_rate = big_sf_to_decimal(&borrow.cumulative_borrow_rate_bsf);
    if snapshot_rate.is_zero() {
        return borrowed_amount;
    }
    borrowed_amount * cumulative_borrow_rate / snapshot_rate
}

fn add_to_position(
    positions: &mut HashMap<Pubkey, Position>,
    reserve_address: Pubkey,
    mint_address: Pubkey,
    amount: BigDecimal,
    market_value: BigDecimal,
) {
    let position = positions.entry(reserve_address).or_insert_with(|| Position {
        reserve_address,
        mint_address,
        amount: BigDecimal::zero(),
        market_value_refreshed: BigDecimal::zero(),
    });
    position.amount += amount;
    position.market_value_refreshed += market_value;
}

fn apply_to_position(positions: &mut HashMap<Pubkey, Position>, reserve: &KaminoReserve, amount: &BigDecimal) {
    let current = positions
        .get(&reserve.address)
        .map(|position| position.amount.clone())
        .unwrap_or_else(BigDecimal::zero);
    let new_amount = floor_at_zero(current + amount);
    if new_amount.is_zero() {
        positions.remove(&reserve.address);
        return;
    }
    let market_value_refreshed = position_value(reserve, &new_amount);
    positions.insert(
        reserve.address,
        Position {
            reserve_address: reserve.address,
            mint_address: reserve.get_liquidity_mint(),
            amount: new_amount,
            market_value_refreshed,
        },
    );
}

fn check_elevation_group(reserve: &KaminoReserve, elevation_group: u8) -> LendingResult<()> {
    if elevation_group != ELEVATION_GROUP_NONE && !reserve.is_in_elevation_group(elevation_group) {
        log::warn!(
            "Reserve {} does not support elevation group {}",
            reserve.address,
            elevation_group
        );
        return Err(LendingError::InconsistentElevationGroup {
            elevation_group,
            reserve: reserve.address,
        });
    }
    Ok(())
}

fn eligible_elevation_groups<'a, M, I>(market: &M, reserve_addresses: I) -> LendingResult<Vec<u8>>
where
    M: MarketContext,
    I: Iterator<Item = &'a Pubkey>,
{
    let mut distinct = HashSet::new();
    let mut reserves = Vec::new();
    for address in reserve_addresses {
        if distinct.insert(*address) {
            reserves.push(market.get_existing_reserve_by_address(address)?);
        }
    }
    Ok(elevation_groups_shared_by(&reserves))
}

fn elevation_groups_shared_by(reserves: &[&KaminoReserve]) -> Vec<u8> {
    if reserves.is_empty() {
        return Vec::new();
    }
    let mut counts: HashMap<u8, usize> = HashMap::new();
    for reserve in reserves {
        for id in reserve.elevation_groups() {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    let mut groups = counts
        .into_iter()
        .filter(|(_, count)| *count == reserves.len())
        .map(|(id, _)| id)
        .collect::<Vec<_>>();
    groups.sort_unstable();
    groups
}
