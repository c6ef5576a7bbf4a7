//! Loan-to-value and liquidation sizing.
//!
//! Mirrors the lending contract's arithmetic so a proposed liquidation set
//! passes the contract's own ltv check.

use crate::core::error::{Error, Result};
use crate::core::types::{BiddedCollateralItem, RateConfig};
use crate::utils::math::accrue_interest;

pub fn calc_bid_min_multiplier(bid_min_rate: f64) -> f64 {
    1.0 + bid_min_rate
}

pub fn calc_bid_max_multiplier(bid_min_rate: f64, discount_max_rate: f64, discount_min_rate: f64) -> f64 {
    calc_bid_min_multiplier(bid_min_rate) * (1.0 - discount_min_rate) / (1.0 - discount_max_rate)
}

/// Protocol-wide ltv ceiling derived from the rate configuration.
pub fn calc_ltv_max(bid_min_rate: f64, discount_max_rate: f64, discount_min_rate: f64) -> f64 {
    1.0 / calc_bid_max_multiplier(bid_min_rate, discount_max_rate, discount_min_rate)
}

impl RateConfig {
    pub fn ltv_max(&self) -> f64 {
        calc_ltv_max(self.bid_min_rate, self.discount_max_rate, self.discount_min_rate)
    }
}

/// Inputs of a hypothetical loan/collateral mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LtvChange {
    pub amount_to_borrow: f64,
    pub amount_to_repay: f64,
    pub amount_to_deposit: f64,
    pub amount_to_withdraw: f64,
}

/// Position state read from the lending platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanState {
    pub accumulated_loan: f64,
    pub loan: f64,
    pub collateral: f64,
    pub loan_creation_date: u64,
}

/// Ltv after projecting interest to `block_time` and applying `change`.
///
/// No debt means no risk: `0`. Debt against zero collateral is the worst
/// case: `ltv_max`.
pub fn calc_conditional_ltv(
    ltv_max: f64,
    borrow_apr: f64,
    change: LtvChange,
    state: LoanState,
    block_time: u64,
) -> f64 {
    let collateral = state.collateral + change.amount_to_deposit - change.amount_to_withdraw;
    let accumulated_loan =
        state.accumulated_loan + accrue_interest(state.loan, borrow_apr, block_time, state.loan_creation_date);
    let loan = accumulated_loan + change.amount_to_borrow - change.amount_to_repay;

    if loan == 0.0 {
        return 0.0;
    }

    if collateral == 0.0 {
        return ltv_max;
    }

    loan / collateral
}

/// Collateral value to sell, at `discount_rate`, for the ltv to land on
/// `ltv_max_fraction * ltv_max`. Capped at the whole collateral.
///
/// Derivation, with `t` the target ltv and `v` the liquidation value:
/// `t = (loan - (1 - discount) * v) / (collateral - v)`
/// `v = collateral * (ltv - t) / (1 - discount - t)`
pub fn calc_liquidation_value(
    collateral: f64,
    discount_rate: f64,
    ltv: f64,
    ltv_max: f64,
    ltv_max_fraction: f64,
) -> Result<f64> {
    if !(0.5..=1.0).contains(&ltv_max_fraction) {
        return Err(Error::LtvFractionOutOfRange(ltv_max_fraction));
    }

    let target_ltv = ltv_max_fraction * ltv_max;
    let value = collateral * (ltv - target_ltv) / (1.0 - discount_rate - target_ltv);

    Ok(value.min(collateral))
}

/// Ltv once `bidded_collateral` is sold: collateral shrinks by the market
/// price of the tokens, debt by what the bids actually pay.
pub fn calc_liquidation_ltv(
    bidded_collateral: &[BiddedCollateralItem],
    borrow_apr: f64,
    state: LoanState,
    block_time: u64,
) -> f64 {
    let loan_diff: f64 = bidded_collateral.iter().map(|x| x.liquidation_price as f64).sum();
    let collateral_diff: f64 = bidded_collateral.iter().map(|x| x.collateral_price as f64).sum();

    let collateral = state.collateral - collateral_diff;
    if collateral == 0.0 {
        return 0.0;
    }

    let loan = state.accumulated_loan
        + accrue_interest(state.loan, borrow_apr, block_time, state.loan_creation_date)
        - loan_diff;

    loan / collateral
}
