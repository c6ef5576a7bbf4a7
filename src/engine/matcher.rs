//! Collateral-bid matching: every token of a borrower gets the first bid,
//! in priority order, that can pay for it.

use crate::core::types::{find_price, Addr, BidType, BiddedCollateralItem, Collateral, PoolBid, PriceItem};
use crate::utils::math::{calc_discounted_amount, cmp_f64};

/// What a bid can pay, what the token costs, and the price recorded for
/// the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quote {
    bid_amount: u128,
    discounted_price: u128,
    liquidation_price: u128,
}

fn quote(bid: &PoolBid, price: u128) -> Quote {
    match bid.bid_type {
        BidType::LiquidationBid => {
            let discounted_price = calc_discounted_amount(price, bid.discount);
            Quote {
                bid_amount: bid.amount,
                discounted_price,
                liquidation_price: discounted_price,
            }
        }
        BidType::CollectionOffer => {
            let bid_amount = calc_discounted_amount(bid.amount, bid.discount);
            Quote {
                bid_amount,
                discounted_price: price,
                liquidation_price: bid_amount,
            }
        }
    }
}

/// Priority: bid type, then discount, then age, then amount, all ascending.
fn sort_by_priority(bids: &mut [PoolBid]) {
    bids.sort_by(|a, b| {
        a.bid_type
            .cmp(&b.bid_type)
            .then_with(|| cmp_f64(a.discount, b.discount))
            .then_with(|| a.creation_date.cmp(&b.creation_date))
            .then_with(|| a.amount.cmp(&b.amount))
    });
}

/// First-fit matching over a private copy of `bid_list`; capacity used by one
/// token is not available to the next. Collections without a price are
/// skipped, tokens without a qualifying bid are left out.
pub fn match_collaterals_and_bids(
    collateral_by_borrower: &[(Addr, Collateral)],
    bid_list: &[PoolBid],
    price_list: &[PriceItem],
) -> Vec<BiddedCollateralItem> {
    let mut bids = bid_list.to_vec();
    sort_by_priority(&mut bids);

    let mut bidded_collateral_list: Vec<BiddedCollateralItem> = Vec::new();

    for (collection, collateral) in collateral_by_borrower {
        let price = match find_price(price_list, collection) {
            Some(price) => price,
            None => {
                log::debug!("No price for {}, skipping its collateral", collection);
                continue;
            }
        };

        for token_item in &collateral.token_item_list {
            let matched = bids.iter_mut().find_map(|bid| {
                if !bid.covers(collection, &token_item.id) {
                    return None;
                }
                let quote = quote(bid, price);
                (quote.bid_amount >= quote.discounted_price).then_some((bid, quote))
            });

            let Some((bid, quote)) = matched else {
                continue;
            };

            bidded_collateral_list.push(BiddedCollateralItem {
                collection: collection.clone(),
                token_item: token_item.clone(),
                owner: collateral.owner.clone(),
                liquidator: bid.liquidator.clone(),
                bid_creation_date: bid.creation_date,
                liquidation_price: quote.liquidation_price,
                collateral_price: price,
                bid_amount: bid.amount,
                bid_discount: bid.discount,
                bid_type: bid.bid_type,
                collection_offer_id: bid.collection_offer_id,
            });

            bid.amount = match bid.bid_type {
                BidType::LiquidationBid => quote.bid_amount - quote.discounted_price,
                // one offer buys one token
                BidType::CollectionOffer => 0,
            };
        }
    }

    bidded_collateral_list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TokenItem;

    fn collateral(ids: &[&str]) -> Collateral {
        Collateral {
            owner: "alice".to_string(),
            token_item_list: ids.iter().map(|id| TokenItem::new(*id)).collect(),
        }
    }

    fn bid(liquidator: &str, amount: u128, discount: f64, creation_date: u64, ids: &[&str]) -> PoolBid {
        PoolBid {
            collection_address: "c1".to_string(),
            liquidator: liquidator.to_string(),
            creation_date,
            token_id_list: ids.iter().map(|x| x.to_string()).collect(),
            amount,
            discount,
            bid_type: BidType::LiquidationBid,
            collection_offer_id: None,
        }
    }

    fn offer(amount: u128, id: u32, ids: &[&str]) -> PoolBid {
        PoolBid {
            liquidator: "MM".to_string(),
            discount: 0.0,
            bid_type: BidType::CollectionOffer,
            collection_offer_id: Some(id),
            ..bid("MM", amount, 0.0, 0, ids)
        }
    }

    fn prices() -> Vec<PriceItem> {
        vec![PriceItem {
            collection: "c1".to_string(),
            price: 1_000,
        }]
    }

    #[test]
    fn test_lower_discount_wins() {
        let bids = vec![bid("b", 10_000, 0.1, 1, &["1"]), bid("a", 10_000, 0.05, 5, &["1"])];
        let list = match_collaterals_and_bids(&[("c1".to_string(), collateral(&["1"]))], &bids, &prices());

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].liquidator, "a");
        assert_eq!(list[0].liquidation_price, 950);
        assert_eq!(list[0].collateral_price, 1_000);
        assert_eq!(list[0].bid_amount, 10_000);
    }

    #[test]
    fn test_ties_broken_by_age_then_amount() {
        let bids = vec![
            bid("young", 5_000, 0.1, 9, &["1"]),
            bid("old-big", 5_000, 0.1, 2, &["1"]),
            bid("old-small", 4_000, 0.1, 2, &["1"]),
        ];
        let list = match_collaterals_and_bids(&[("c1".to_string(), collateral(&["1"]))], &bids, &prices());
        assert_eq!(list[0].liquidator, "old-small");
    }

    #[test]
    fn test_liquidation_bids_preferred_over_offers() {
        let bids = vec![offer(2_000, 0, &["1"]), bid("a", 900, 0.1, 1, &["1"])];
        let list = match_collaterals_and_bids(&[("c1".to_string(), collateral(&["1"]))], &bids, &prices());

        assert_eq!(list[0].bid_type, BidType::LiquidationBid);
        assert_eq!(list[0].liquidation_price, 900);
    }

    #[test]
    fn test_capacity_is_consumed() {
        // enough for one token at 950, not for two
        let bids = vec![bid("a", 1_500, 0.05, 1, &["1", "2"])];
        let list = match_collaterals_and_bids(&[("c1".to_string(), collateral(&["1", "2"]))], &bids, &prices());

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].token_item.id, "1");
        // the caller's list is untouched
        assert_eq!(bids[0].amount, 1_500);
    }

    #[test]
    fn test_offer_pricing_and_single_use() {
        let bids = vec![offer(1_200, 0, &["1", "2"]), offer(800, 1, &["1", "2"])];
        let list = match_collaterals_and_bids(&[("c1".to_string(), collateral(&["1", "2"]))], &bids, &prices());

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].collection_offer_id, Some(0));
        assert_eq!(list[0].liquidation_price, 1_200);
    }

    #[test]
    fn test_unpriced_collection_and_foreign_bids_skipped() {
        let bids = vec![
            bid("a", 10_000, 0.05, 1, &["1"]),
            PoolBid {
                collection_address: "c2".to_string(),
                ..bid("b", 10_000, 0.05, 1, &["9"])
            },
        ];
        let collateral_list = vec![
            ("c2".to_string(), collateral(&["9"])),
            ("c3".to_string(), collateral(&["1"])),
        ];

        let price_list = vec![PriceItem {
            collection: "c3".to_string(),
            price: 1_000,
        }];

        // c2 has no price; c3 is priced but the bid on token "1" belongs to c1
        assert!(match_collaterals_and_bids(&collateral_list, &bids, &price_list).is_empty());
    }
}
