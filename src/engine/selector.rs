//! Liquidation-set selection: the subset of matched collateral whose sale
//! brings the borrower back under the ltv ceiling without overshooting.

use std::cmp::Ordering;

use crate::core::types::BiddedCollateralItem;
use crate::engine::ltv::{calc_liquidation_ltv, LoanState};
use crate::utils::math::cmp_f64;

const UPPER_VALUE_MULTIPLIER: f64 = 1.5;

fn total_price(set: &[BiddedCollateralItem]) -> u128 {
    set.iter().map(|x| x.liquidation_price).sum()
}

fn total_discount(set: &[BiddedCollateralItem]) -> f64 {
    set.iter().map(|x| x.bid_discount).sum()
}

/// Most valuable first, then lower discount, then older bid.
fn cmp_candidates(a: &BiddedCollateralItem, b: &BiddedCollateralItem) -> Ordering {
    b.liquidation_price
        .cmp(&a.liquidation_price)
        .then_with(|| cmp_f64(a.bid_discount, b.bid_discount))
        .then_with(|| a.bid_creation_date.cmp(&b.bid_creation_date))
}

/// Cheapest set first, then lower summed discount, then fewer tokens.
fn cmp_sets(a: &[BiddedCollateralItem], b: &[BiddedCollateralItem]) -> Ordering {
    total_price(a)
        .cmp(&total_price(b))
        .then_with(|| cmp_f64(total_discount(a), total_discount(b)))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Every subset the greedy scan finds with `ltv <= ltv_max`.
///
/// Each item of the affordable range seeds a scan; following items join the
/// running subset while its price sum stays below `upper_value`.
fn collect_candidate_sets(
    subvector: &[BiddedCollateralItem],
    upper_value: f64,
    ltv_max: f64,
    borrow_apr: f64,
    state: LoanState,
    block_time: u64,
) -> Vec<Vec<BiddedCollateralItem>> {
    let mut result: Vec<Vec<BiddedCollateralItem>> = Vec::new();

    for (i, seed) in subvector.iter().enumerate() {
        let mut temp = vec![seed.clone()];
        let mut collateral_sum = seed.liquidation_price as f64;

        if calc_liquidation_ltv(&temp, borrow_apr, state, block_time) <= ltv_max {
            result.push(temp);
            continue;
        }

        for next in &subvector[i + 1..] {
            let collateral_sum_next = collateral_sum + next.liquidation_price as f64;
            if collateral_sum_next >= upper_value {
                continue;
            }

            temp.push(next.clone());

            if calc_liquidation_ltv(&temp, borrow_apr, state, block_time) <= ltv_max {
                result.push(temp.clone());
                temp.pop();
                continue;
            }

            collateral_sum = collateral_sum_next;
        }
    }

    result
}

/// Picks the liquidation set for one borrower.
///
/// Candidates are ranked by [`cmp_sets`] and the runner-up is returned. With
/// fewer than two candidates the whole matched list is returned as is; an
/// empty result means nothing can be liquidated this cycle.
pub fn calc_liquidation_set(
    bidded_collateral_list: &[BiddedCollateralItem],
    max_liquidation_value: f64,
    ltv_max: f64,
    borrow_apr: f64,
    state: LoanState,
    block_time: u64,
) -> Vec<BiddedCollateralItem> {
    let mut sorted = bidded_collateral_list.to_vec();
    sorted.sort_by(cmp_candidates);

    let subvector: Vec<BiddedCollateralItem> = sorted
        .iter()
        .filter(|x| x.liquidation_price as f64 <= max_liquidation_value)
        .cloned()
        .collect();

    let upper_value = sorted
        .iter()
        .rev()
        .find(|x| x.liquidation_price as f64 > max_liquidation_value)
        .map(|x| x.liquidation_price as f64)
        .filter(|x| *x != 0.0)
        .unwrap_or(max_liquidation_value * UPPER_VALUE_MULTIPLIER);

    let mut result = collect_candidate_sets(&subvector, upper_value, ltv_max, borrow_apr, state, block_time);
    result.sort_by(|a, b| cmp_sets(a, b));

    log::debug!(
        "{} candidate sets out of {} matched tokens (max value {}, upper value {})",
        result.len(),
        bidded_collateral_list.len(),
        max_liquidation_value,
        upper_value
    );

    if result.len() > 1 {
        result.swap_remove(1)
    } else {
        bidded_collateral_list.to_vec()
    }
}
