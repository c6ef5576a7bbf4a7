//! Targeting cycle over in-memory snapshots: finds borrowers above the ltv
//! ceiling and proposes a liquidation set for each, most at risk first.

use crate::core::error::Result;
use crate::core::types::{
    find_price, Addr, BidsByCollection, BorrowerEntry, Collateral, CollateralByCollection, CollectionOffers,
    LiquidationItem, PoolBid, PriceItem, PriceSnapshot, RateConfig, TargetBorrower,
};
use crate::engine::bid_pool::{distribute_offers, get_collection_and_bid_list, merge_bids_and_offers, reduce_bids};
use crate::engine::ltv::{calc_conditional_ltv, calc_liquidation_value, LoanState, LtvChange};
use crate::engine::matcher::match_collaterals_and_bids;
use crate::engine::selector::calc_liquidation_set;
use crate::utils::math::cmp_f64;

/// Everything one targeting cycle reads.
#[derive(Debug, Clone)]
pub struct TargetingInput {
    pub rate_config: RateConfig,
    pub collateral_list: Vec<CollateralByCollection>,
    pub borrower_list: Vec<BorrowerEntry>,
    pub prices: PriceSnapshot,
    pub liquidation_bids: Vec<BidsByCollection>,
    pub collection_offers: Vec<CollectionOffers>,
    pub block_time: u64,
}

pub fn collaterals_by_borrower(collateral_list: &[CollateralByCollection], borrower: &str) -> Vec<(Addr, Collateral)> {
    collateral_list
        .iter()
        .filter_map(|x| {
            x.collateral
                .iter()
                .find(|c| c.owner == borrower)
                .map(|c| (x.address.clone(), c.clone()))
        })
        .collect()
}

/// `price * token count` summed over collections. An unpriced collection
/// contributes nothing.
pub fn collateral_value(collateral_by_borrower: &[(Addr, Collateral)], price_list: &[PriceItem]) -> u128 {
    collateral_by_borrower
        .iter()
        .filter_map(|(collection, collateral)| {
            find_price(price_list, collection).map(|price| price * collateral.token_item_list.len() as u128)
        })
        .sum()
}

/// Borrowers with `ltv > ltv_max`, highest ltv first. Borrowers without
/// collateral never qualify.
pub fn target_borrowers(
    borrower_list: &[BorrowerEntry],
    collateral_list: &[CollateralByCollection],
    price_list: &[PriceItem],
    rate_config: &RateConfig,
    ltv_max: f64,
    block_time: u64,
) -> Vec<TargetBorrower> {
    let mut targets: Vec<TargetBorrower> = borrower_list
        .iter()
        .filter_map(|entry| {
            let collection_and_collateral_list = collaterals_by_borrower(collateral_list, &entry.address);
            let collateral_value = collateral_value(&collection_and_collateral_list, price_list);
            let loan = &entry.borrower.loan;

            let state = LoanState {
                accumulated_loan: entry.borrower.accumulated_loan as f64,
                loan: loan.amount as f64,
                collateral: collateral_value as f64,
                loan_creation_date: loan.creation_date,
            };
            let ltv = calc_conditional_ltv(ltv_max, rate_config.borrow_apr, LtvChange::default(), state, block_time);

            (ltv > ltv_max).then(|| TargetBorrower {
                borrower_address: entry.address.clone(),
                ltv,
                loan_amount: loan.amount,
                loan_creation_date: loan.creation_date,
                accumulated_loan: entry.borrower.accumulated_loan,
                collateral_value,
                collection_and_collateral_list,
            })
        })
        .collect();

    targets.sort_by(|a, b| cmp_f64(b.ltv, a.ltv));
    targets
}

/// Collections held by any target, in first-seen order without repeats.
pub fn collections_of_targets(targets: &[TargetBorrower]) -> Vec<Addr> {
    let mut collection_list: Vec<Addr> = Vec::new();

    for (collection, _) in targets.iter().flat_map(|x| &x.collection_and_collateral_list) {
        if !collection_list.contains(collection) {
            collection_list.push(collection.clone());
        }
    }

    collection_list
}

/// Sizes and selects a liquidation set per target, in the given order,
/// depleting `total_bids` as sets are committed.
pub fn build_liquidation_targets(
    targets: &[TargetBorrower],
    total_bids: Vec<PoolBid>,
    price_list: &[PriceItem],
    rate_config: &RateConfig,
    ltv_max: f64,
    ltv_max_fraction: f64,
    block_time: u64,
) -> Result<Vec<LiquidationItem>> {
    let mut total_bids = total_bids;
    let mut liquidation_targets: Vec<LiquidationItem> = Vec::new();

    for target in targets {
        let collection_and_bid_list = get_collection_and_bid_list(&total_bids, &target.collection_and_collateral_list);
        let bidded_collateral_list =
            match_collaterals_and_bids(&target.collection_and_collateral_list, &collection_and_bid_list, price_list);

        // sized for the worst case discount
        let max_liquidation_value = calc_liquidation_value(
            target.collateral_value as f64,
            rate_config.discount_max_rate,
            target.ltv,
            ltv_max,
            ltv_max_fraction,
        )?;

        let state = LoanState {
            accumulated_loan: target.accumulated_loan as f64,
            loan: target.loan_amount as f64,
            collateral: target.collateral_value as f64,
            loan_creation_date: target.loan_creation_date,
        };
        let liquidation_set = calc_liquidation_set(
            &bidded_collateral_list,
            max_liquidation_value,
            ltv_max,
            rate_config.borrow_apr,
            state,
            block_time,
        );

        if liquidation_set.is_empty() {
            log::warn!("⚠️ No (proper) bids/offers to liquidate {}", target.borrower_address);
            continue;
        }

        log::debug!(
            "{}: ltv {:.4}, {} of {} matched tokens selected",
            target.borrower_address,
            target.ltv,
            liquidation_set.len(),
            bidded_collateral_list.len()
        );

        total_bids = reduce_bids(total_bids, &liquidation_set);
        liquidation_targets.push(LiquidationItem {
            borrower: target.borrower_address.clone(),
            liquidation_set,
        });
    }

    Ok(liquidation_targets)
}

/// Borrowers picked for liquidation and the collections they hold.
#[derive(Debug, Clone, Default)]
pub struct TargetSelection {
    pub ltv_max: f64,
    pub targets: Vec<TargetBorrower>,
    pub collection_list: Vec<Addr>,
}

/// First half of a targeting pass; reads neither bids nor offers.
/// Outdated prices select nobody.
pub fn select_targets(input: &TargetingInput) -> TargetSelection {
    let ltv_max = input.rate_config.ltv_max();

    if input.prices.is_outdated {
        log::warn!("⚠️ Prices are outdated, skipping targeting");
        return TargetSelection {
            ltv_max,
            ..TargetSelection::default()
        };
    }

    let targets = target_borrowers(
        &input.borrower_list,
        &input.collateral_list,
        &input.prices.data,
        &input.rate_config,
        ltv_max,
        input.block_time,
    );

    log::info!(
        "🎯 {} of {} borrowers above ltv max {:.4}",
        targets.len(),
        input.borrower_list.len(),
        ltv_max
    );

    TargetSelection {
        ltv_max,
        collection_list: collections_of_targets(&targets),
        targets,
    }
}

/// Second half: offers for the selected collections join the bid pool and
/// each target gets its liquidation set.
pub fn liquidate_targets(
    input: &TargetingInput,
    selection: &TargetSelection,
    ltv_max_fraction: f64,
) -> Result<Vec<LiquidationItem>> {
    if selection.targets.is_empty() {
        return Ok(Vec::new());
    }

    let offers = distribute_offers(
        &selection.collection_list,
        &input.collateral_list,
        &input.collection_offers,
        input.block_time,
    );
    let total_bids = merge_bids_and_offers(&input.liquidation_bids, offers);

    build_liquidation_targets(
        &selection.targets,
        total_bids,
        &input.prices.data,
        &input.rate_config,
        selection.ltv_max,
        ltv_max_fraction,
        input.block_time,
    )
}

/// Full targeting pass over a complete input.
pub fn query_targets(input: &TargetingInput, ltv_max_fraction: f64) -> Result<Vec<LiquidationItem>> {
    let selection = select_targets(input);
    liquidate_targets(input, &selection, ltv_max_fraction)
}
