mod utils;

use klend_sdk::{
    error::LendingError,
    math::{approximate_compounded_interest, from_bps, SLOTS_PER_DAY},
    state::ReserveStatus,
    ActionType, LendingConfig,
};
use num_traits::Zero;
use utils::*;

fn golden_reserve() -> ReserveInfo {
    ReserveInfo::new("USDH")
        .available(1_000_000)
        .collateral_supply(1_000_000_000)
        .borrowed_sf(100_000_000)
        .curve(&[(0, 1000), (10000, 1000)])
        .protocol_take_rate(15)
}

fn half_utilized() -> ReserveInfo {
    ReserveInfo::new("SOL")
        .available(500)
        .borrowed(500)
        .collateral_supply(2000)
}

#[test]
fn test_total_supply_golden() {
    let reserve = golden_reserve().build();
    assert_eq!(
        reserve.get_total_supply(),
        dec("1000000.0000000000867361737988403547205962240695953369140625")
    );
}

#[test]
fn test_estimated_total_supply_without_elapsed_slots() {
    let reserve = golden_reserve().last_update_slot(42).build();
    assert_eq!(
        reserve.get_estimated_total_supply(42, 0).unwrap(),
        reserve.get_total_supply()
    );
    // a slot behind the snapshot does not accrue either
    assert_eq!(
        reserve.get_estimated_total_supply(10, 0).unwrap(),
        reserve.get_total_supply()
    );
}

#[test]
fn test_estimated_total_supply_after_five_slots() {
    let reserve = golden_reserve().build();
    let previous_debt = reserve.get_borrowed_amount();
    let borrow_rate = reserve.calculate_borrow_apr().unwrap();
    assert_eq!(borrow_rate, dec("0.1"));

    let new_debt = &previous_debt * approximate_compounded_interest(&borrow_rate, 5);
    let protocol_fees = (&new_debt - &previous_debt) * dec("0.15");
    let expected = reserve.get_liquidity_available_amount() + &new_debt - &protocol_fees;

    assert_close(&reserve.get_estimated_total_supply(5, 0).unwrap(), &expected, "1e-80");
    assert_close(
        &reserve.get_estimated_accumulated_protocol_fees(5, 0).unwrap(),
        &protocol_fees,
        "1e-80",
    );
    assert!(reserve.get_estimated_total_supply(5, 0).unwrap() > reserve.get_total_supply());
}

#[test]
fn test_estimated_total_supply_matches_reference_values() {
    let reserve = golden_reserve()
        .curve(&[(0, 1), (10000, 1)])
        .slot_duration_ms(450)
        .build();
    let total_supply = reserve.get_total_supply();
    let estimated = reserve.get_estimated_total_supply(5, 0).unwrap();

    // reference figures carry 40 significant digits
    assert_close(
        &total_supply,
        &dec("1000000.000000000086736173798840352915036"),
        "1e-26",
    );
    assert_close(
        &estimated,
        &dec("1000000.000000000086736173799489749616243"),
        "1e-26",
    );
    assert_close(
        &(&estimated - &total_supply),
        &dec("0.000000000000000000000649396701207"),
        "1e-32",
    );
}

#[test]
fn test_compounded_values_keep_bounded_precision() {
    let reserve = golden_reserve().slot_duration_ms(450).build();
    for slots in [5u64, 1_000, SLOTS_PER_DAY] {
        let interest = reserve.compound_interest(slots, 2_000).unwrap();
        assert!(interest.new_debt.digits() <= 200);
        assert!(interest.new_total_supply.digits() <= 200);
    }
    let rate = reserve.get_estimated_cumulative_borrow_rate(SLOTS_PER_DAY, 0).unwrap();
    assert!(rate.digits() <= 100);
}

#[test]
fn test_referral_fees_split_from_protocol_fees() {
    let reserve = golden_reserve().borrowed(1_000_000).build();
    let interest = reserve.compound_interest(1_000, 2_000).unwrap();

    let net_new_debt = &interest.new_debt - reserve.get_borrowed_amount();
    let referral_fees = &net_new_debt * dec("0.15") * from_bps(2_000u16);
    assert_eq!(interest.pending_referral_fees, referral_fees);
    assert_eq!(
        interest.new_acc_protocol_fees,
        &net_new_debt * dec("0.15") - &referral_fees
    );
    assert_eq!(
        interest.new_total_supply,
        reserve.get_liquidity_available_amount() + &interest.new_debt
            - &interest.new_acc_protocol_fees
            - &interest.pending_referral_fees
    );
}

#[test]
fn test_host_fixed_interest_goes_to_protocol() {
    let reserve = ReserveInfo::new("USDC")
        .available(1_000_000)
        .borrowed(1_000_000)
        .host_fixed_interest_rate(100)
        .build();
    let host_rate = reserve.get_fixed_host_interest_rate();
    assert_eq!(host_rate, dec("0.01"));
    let interest = reserve.compound_interest(10, 0).unwrap();
    let host_fee = reserve.get_borrowed_amount() * approximate_compounded_interest(&host_rate, 10)
        - reserve.get_borrowed_amount();
    assert_close(&interest.new_acc_protocol_fees, &host_fee, "1e-80");
}

#[test]
fn test_utilization_and_exchange_rate() {
    let reserve = half_utilized().build();
    assert_eq!(reserve.get_total_supply(), dec("1000"));
    assert_eq!(reserve.calculate_utilization_ratio(), dec("0.5"));
    assert_eq!(reserve.get_collateral_exchange_rate(), dec("2"));
    assert_eq!(reserve.get_estimated_collateral_exchange_rate(0, 0).unwrap(), dec("2"));
}

#[test]
fn test_empty_reserve() {
    let reserve = ReserveInfo::new("EMPTY").build();
    assert!(reserve.calculate_utilization_ratio().is_zero());
    assert_eq!(reserve.get_collateral_exchange_rate(), dec("1"));
    assert!(reserve.get_estimated_utilization_ratio(100, 0).unwrap().is_zero());
}

#[test]
fn test_supply_apr() {
    let reserve = half_utilized()
        .curve(&[(0, 1000), (10000, 1000)])
        .protocol_take_rate(20)
        .build();
    // 0.5 * 0.1 * 0.8
    assert_eq!(reserve.calculate_supply_apr().unwrap(), dec("0.04"));
    assert!(reserve.stats.supply_apy > 0.04);
    assert!(reserve.stats.borrow_apy > reserve.stats.supply_apy);
}

#[test]
fn test_slot_duration_scales_borrow_rate() {
    let reserve = half_utilized()
        .curve(&[(0, 1000), (10000, 1000)])
        .slot_duration_ms(250)
        .build();
    assert_eq!(reserve.current_borrow_rate().unwrap(), dec("0.2"));
}

#[test]
fn test_estimated_cumulative_borrow_rate() {
    let reserve = half_utilized()
        .curve(&[(0, 1000), (10000, 1000)])
        .cumulative_borrow_rate_sf(3 << 59)
        .build();
    assert_eq!(
        reserve.get_estimated_cumulative_borrow_rate(0, 0).unwrap(),
        dec("1.5")
    );
    assert!(reserve.get_estimated_cumulative_borrow_rate(1_000, 0).unwrap() > dec("1.5"));
}

#[test]
fn test_limits_crossed() {
    let reserve = half_utilized().deposit_limit(900).borrow_limit(600).build();
    assert!(reserve.deposit_limit_crossed());
    assert!(!reserve.borrow_limit_crossed());
}

#[test]
fn test_tvl() {
    let reserve = ReserveInfo::new("SOL")
        .available(1_000_000)
        .borrowed(1_000_000)
        .price("20")
        .build();
    assert_eq!(reserve.get_deposit_tvl(), dec("40"));
    assert_eq!(reserve.get_borrow_tvl(), dec("20"));
}

#[test]
fn test_withdrawal_caps_reset_after_a_day() {
    let reserve = half_utilized()
        .debt_cap(1000, 300)
        .deposit_cap(2000, 700)
        .last_update_slot(100)
        .build();
    assert_eq!(reserve.get_debt_withdrawal_cap_capacity(), dec("1000"));
    assert_eq!(
        reserve.get_debt_withdrawal_cap_current(100 + SLOTS_PER_DAY - 1),
        dec("300")
    );
    assert!(reserve
        .get_debt_withdrawal_cap_current(100 + SLOTS_PER_DAY)
        .is_zero());
    assert_eq!(reserve.get_deposit_withdrawal_cap_current(150), dec("700"));
    assert!(reserve
        .get_deposit_withdrawal_cap_current(100 + 2 * SLOTS_PER_DAY)
        .is_zero());
}

#[test]
fn test_reserve_status() {
    assert_eq!(
        half_utilized().status(1).build().stats.status,
        ReserveStatus::Obsolete
    );
    assert_eq!(
        half_utilized().status(2).build().stats.status,
        ReserveStatus::Hidden
    );
    assert_eq!(
        half_utilized().status(3).try_build().unwrap_err(),
        LendingError::InvalidReserveStatus(3)
    );
}

#[test]
fn test_from_config() {
    let info = half_utilized().curve(&[(0, 1000), (10000, 1000)]);
    let config = LendingConfig::from_toml_str("recent_slot_duration_ms = 250").unwrap();
    let reserve = klend_sdk::KaminoReserve::from_config(
        info.address,
        info.state.clone(),
        info.oracle_price(),
        &config,
    )
    .unwrap();
    assert_eq!(reserve.current_borrow_rate().unwrap(), dec("0.2"));
}

#[test]
fn test_snapshot_replacement() {
    let reserve = half_utilized().build();
    let mut state = reserve.state.clone();
    state.liquidity.available_amount = 1500;
    let updated = reserve.with_state(state).unwrap();
    assert_eq!(updated.calculate_utilization_ratio(), dec("0.25"));
    assert_eq!(reserve.calculate_utilization_ratio(), dec("0.5"));

    let mut price = reserve.oracle_price.clone();
    price.price = dec("3");
    let repriced = reserve.with_oracle_price(price).unwrap();
    assert_eq!(repriced.get_oracle_market_price(), dec("3"));
}

#[test]
fn test_simulated_utilization() {
    let reserve = half_utilized().build();
    let simulate = |amount: &str, action| {
        reserve
            .calc_simulated_utilization_ratio(&dec(amount), action, 0, 0, None)
            .unwrap()
    };
    assert_eq!(simulate("1000", ActionType::Deposit), dec("0.25"));
    assert_eq!(simulate("1000", ActionType::Mint), dec("0.25"));
    assert_eq!(simulate("250", ActionType::Borrow), dec("0.75"));
    assert_eq!(simulate("250", ActionType::Repay), dec("0.25"));
    assert_eq!(simulate("500", ActionType::Withdraw), dec("1"));
    assert!(simulate("1000", ActionType::Redeem).is_zero());

    let both = reserve
        .calc_simulated_utilization_ratio(
            &dec("1000"),
            ActionType::DepositAndBorrow,
            0,
            0,
            Some(&dec("500")),
        )
        .unwrap();
    assert_eq!(both, dec("0.5"));

    assert!(matches!(
        reserve.calc_simulated_utilization_ratio(&dec("1"), ActionType::RepayAndWithdraw, 0, 0, None),
        Err(LendingError::MissingActionParameter { .. })
    ));
}

#[test]
fn test_simulated_rates() {
    let reserve = half_utilized()
        .curve(&[(0, 0), (10000, 1000)])
        .build();
    let borrow_apr = reserve
        .calc_simulated_borrow_apr(&dec("250"), ActionType::Borrow, 0, 0, None)
        .unwrap();
    assert_eq!(borrow_apr, dec("0.075"));
    let supply_apr = reserve
        .calc_simulated_supply_apr(&dec("250"), ActionType::Borrow, 0, 0, None)
        .unwrap();
    assert_eq!(supply_apr, dec("0.05625"));
    assert!(
        reserve
            .calc_simulated_borrow_apy(&dec("250"), ActionType::Borrow, 0, 0, None)
            .unwrap()
            > reserve
                .calc_simulated_borrow_apy(&dec("250"), ActionType::Repay, 0, 0, None)
                .unwrap()
    );
}

#[test]
fn test_max_borrow_with_origination_fee() {
    let collateral = ReserveInfo::new("SOL").ltv(75, 85).build();
    let debt = ReserveInfo::new("USDC")
        .available(400)
        .borrow_fee_sf(1 << 58)
        .build();
    let market = MarketInfo::new().build(vec![collateral.clone(), debt.clone()]);
    assert_eq!(debt.get_borrow_fee(), dec("0.25"));
    assert_eq!(
        debt.get_max_borrow_amount_with_coll_reserve(&market, &collateral, 0)
            .unwrap(),
        dec("320")
    );
}

#[test]
fn test_max_borrow_limited_by_caps() {
    let collateral = ReserveInfo::new("SOL").build();
    let debt = ReserveInfo::new("USDC")
        .available(10_000)
        .borrowed(1_000)
        .borrow_limit(3_000)
        .debt_cap(1_500, 1_000)
        .build();
    let market = MarketInfo::new().build(vec![collateral.clone(), debt.clone()]);
    assert_eq!(
        debt.get_max_borrow_amount_with_coll_reserve(&market, &collateral, 0)
            .unwrap(),
        dec("500")
    );
}

#[test]
fn test_max_borrow_above_utilization_ceiling() {
    let collateral = ReserveInfo::new("SOL").build();
    let debt = ReserveInfo::new("USDC")
        .available(100)
        .borrowed(900)
        .utilization_ceiling(80)
        .build();
    let market = MarketInfo::new().build(vec![collateral.clone(), debt.clone()]);
    assert!(debt
        .get_max_borrow_amount_with_coll_reserve(&market, &collateral, 0)
        .unwrap()
        .is_zero());

    let below = ReserveInfo::new("USDC")
        .available(400)
        .borrowed(600)
        .utilization_ceiling(80)
        .build();
    assert_eq!(
        below
            .get_max_borrow_amount_with_coll_reserve(&market, &collateral, 0)
            .unwrap(),
        dec("200")
    );
}

#[test]
fn test_max_borrow_inside_elevation_group() {
    let mut collateral = ReserveInfo::new("JITOSOL").elevation_groups(&[3]);
    collateral
        .state
        .config
        .borrow_limit_against_this_collateral_in_elevation_group[2] = 700;
    collateral
        .state
        .borrowed_amounts_against_this_reserve_in_elevation_groups[2] = 400;
    let collateral = collateral.build();

    let mut debt = ReserveInfo::new("SOL")
        .available(10_000)
        .elevation_groups(&[3]);
    debt.state.config.borrow_limit_outside_elevation_group = 50;
    let debt = debt.build();

    let market = MarketInfo::new()
        .elevation_group(3, 90, 95)
        .build(vec![collateral.clone(), debt.clone()]);
    assert_eq!(
        debt.get_max_borrow_amount_with_coll_reserve(&market, &collateral, 0)
            .unwrap(),
        dec("300")
    );

    let mut outside = ReserveInfo::new("SOL").available(10_000);
    outside.state.config.borrow_limit_outside_elevation_group = 50;
    let outside = outside.build();
    assert_eq!(
        outside
            .get_max_borrow_amount_with_coll_reserve(&market, &collateral, 0)
            .unwrap(),
        dec("50")
    );
}

#[test]
fn test_max_borrow_monotonic_in_borrow_limit() {
    let collateral = ReserveInfo::new("SOL").build();
    let market = MarketInfo::new().build(vec![collateral.clone()]);
    let mut previous = dec("0");
    for limit in [0u64, 100, 1_000, 5_000, 20_000, u64::MAX] {
        let debt = ReserveInfo::new("USDC")
            .available(10_000)
            .borrowed(500)
            .borrow_limit(limit)
            .build();
        let max_borrow = debt
            .get_max_borrow_amount_with_coll_reserve(&market, &collateral, 0)
            .unwrap();
        assert!(max_borrow >= previous);
        previous = max_borrow;
    }
    assert_eq!(previous, dec("10000"));
}
