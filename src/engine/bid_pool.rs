//! Working bid pool of a targeting cycle.
//!
//! On-chain liquidation bids and marketplace collection offers are merged
//! into one list of [`PoolBid`]s. The pool is passed by value from borrower
//! to borrower and shrinks as liquidation sets commit its capacity.

use crate::core::types::{
    Addr, BidType, BiddedCollateralItem, BidsByCollection, Collateral, CollateralByCollection,
    CollectionOffers, PoolBid,
};

/// Liquidator recorded on synthesized marketplace offers.
pub const MARKET_MAKER_LIQUIDATOR: &str = "MM";

/// One collection-wide offer entry per marketplace offer price, covering every
/// token of that collection currently held as collateral.
pub fn distribute_offers(
    collection_list: &[Addr],
    collateral_list: &[CollateralByCollection],
    collection_offer_list: &[CollectionOffers],
    block_time: u64,
) -> Vec<PoolBid> {
    let mut offers: Vec<PoolBid> = Vec::new();
    let mut collection_offer_id: u32 = 0;

    for collection in collection_list {
        let price_list = match collection_offer_list
            .iter()
            .find(|x| &x.collection_address == collection)
        {
            Some(x) if !x.price_list.is_empty() => &x.price_list,
            _ => continue,
        };

        let token_id_list: Vec<String> = collateral_list
            .iter()
            .find(|x| &x.address == collection)
            .map(|x| {
                x.collateral
                    .iter()
                    .flat_map(|c| c.token_item_list.iter().map(|t| t.id.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if token_id_list.is_empty() {
            continue;
        }

        for price in price_list {
            offers.push(PoolBid {
                collection_address: collection.clone(),
                liquidator: MARKET_MAKER_LIQUIDATOR.to_string(),
                creation_date: block_time,
                token_id_list: token_id_list.clone(),
                amount: *price,
                discount: 0.0,
                bid_type: BidType::CollectionOffer,
                collection_offer_id: Some(collection_offer_id),
            });

            collection_offer_id += 1;
        }
    }

    offers
}

/// Flattens on-chain bids and appends the synthesized offers. The two sources
/// never overlap: on-chain bids carry no offer id.
pub fn merge_bids_and_offers(liquidation_bids: &[BidsByCollection], offers: Vec<PoolBid>) -> Vec<PoolBid> {
    let mut merged: Vec<PoolBid> = liquidation_bids
        .iter()
        .flat_map(|group| {
            group.liquidation_bids.iter().map(move |bid| PoolBid {
                collection_address: group.collection_address.clone(),
                liquidator: bid.liquidator.clone(),
                creation_date: bid.creation_date,
                token_id_list: bid.token_id_list.clone(),
                amount: bid.amount,
                discount: bid.discount,
                bid_type: bid.bid_type,
                collection_offer_id: None,
            })
        })
        .collect();

    merged.extend(offers);
    merged
}

/// Bids referencing at least one token the borrower holds in the same
/// collection. Pool order is kept.
pub fn get_collection_and_bid_list(all_bids: &[PoolBid], collateral_by_borrower: &[(Addr, Collateral)]) -> Vec<PoolBid> {
    all_bids
        .iter()
        .filter(|bid| {
            collateral_by_borrower.iter().any(|(collection, collateral)| {
                collection == &bid.collection_address && bid.token_id_list.iter().any(|id| collateral.holds(id))
            })
        })
        .cloned()
        .collect()
}

fn is_covering_bid(bid: &PoolBid, item: &BiddedCollateralItem) -> bool {
    bid.bid_type == item.bid_type
        && bid.collection_offer_id == item.collection_offer_id
        && bid.liquidator == item.liquidator
        && bid.creation_date == item.bid_creation_date
        && bid.discount == item.bid_discount
        && bid.covers(&item.collection, &item.token_item.id)
}

/// Removes the capacity committed by `liquidation_set` from the pool.
///
/// A touched collection offer is evicted whole. A liquidation bid pays the
/// liquidation price out of its amount; the sold token leaves every bid of
/// the collection, and bids left with neither tokens nor amount are dropped.
pub fn reduce_bids(total_bids: Vec<PoolBid>, liquidation_set: &[BiddedCollateralItem]) -> Vec<PoolBid> {
    let mut bids = total_bids;

    for item in liquidation_set {
        let covering = bids.iter().position(|bid| is_covering_bid(bid, item));

        match item.bid_type {
            BidType::CollectionOffer => match item.collection_offer_id {
                Some(offer_id) => bids.retain(|bid| bid.collection_offer_id != Some(offer_id)),
                None => {
                    if let Some(index) = covering {
                        bids.remove(index);
                    }
                }
            },
            BidType::LiquidationBid => {
                if let Some(index) = covering {
                    let bid = &mut bids[index];
                    bid.amount -= item.liquidation_price.min(bid.amount);
                }

                for bid in bids
                    .iter_mut()
                    .filter(|bid| bid.bid_type == BidType::LiquidationBid && bid.collection_address == item.collection)
                {
                    bid.token_id_list.retain(|id| id != &item.token_item.id);
                }

                bids.retain(|bid| {
                    bid.bid_type != BidType::LiquidationBid || !bid.token_id_list.is_empty() || bid.amount > 0
                });
            }
        }
    }

    bids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LiquidationBid, TokenItem};

    fn collateral(owner: &str, ids: &[&str]) -> Collateral {
        Collateral {
            owner: owner.to_string(),
            token_item_list: ids.iter().map(|id| TokenItem::new(*id)).collect(),
        }
    }

    fn collateral_list() -> Vec<CollateralByCollection> {
        vec![
            CollateralByCollection {
                address: "c1".to_string(),
                collateral: vec![collateral("alice", &["1", "2"]), collateral("bob", &["3"])],
            },
            CollateralByCollection {
                address: "c2".to_string(),
                collateral: vec![collateral("alice", &["7"])],
            },
        ]
    }

    fn bid(collection: &str, liquidator: &str, amount: u128, ids: &[&str]) -> PoolBid {
        PoolBid {
            collection_address: collection.to_string(),
            liquidator: liquidator.to_string(),
            creation_date: 10,
            token_id_list: ids.iter().map(|x| x.to_string()).collect(),
            amount,
            discount: 0.05,
            bid_type: BidType::LiquidationBid,
            collection_offer_id: None,
        }
    }

    fn sold(pool_bid: &PoolBid, token: &str, liquidation_price: u128) -> BiddedCollateralItem {
        BiddedCollateralItem {
            collection: pool_bid.collection_address.clone(),
            token_item: TokenItem::new(token),
            owner: "alice".to_string(),
            liquidator: pool_bid.liquidator.clone(),
            bid_creation_date: pool_bid.creation_date,
            liquidation_price,
            collateral_price: 1_000,
            bid_amount: pool_bid.amount,
            bid_discount: pool_bid.discount,
            bid_type: pool_bid.bid_type,
            collection_offer_id: pool_bid.collection_offer_id,
        }
    }

    #[test]
    fn test_distribute_offers() {
        let offers = distribute_offers(
            &["c1".to_string(), "c2".to_string(), "c3".to_string()],
            &collateral_list(),
            &[
                CollectionOffers {
                    collection_address: "c1".to_string(),
                    price_list: vec![1_200, 1_100],
                },
                CollectionOffers {
                    collection_address: "c2".to_string(),
                    price_list: vec![],
                },
                CollectionOffers {
                    collection_address: "c3".to_string(),
                    price_list: vec![500],
                },
            ],
            777,
        );

        // c2 has no offers, c3 has no collateral
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].collection_offer_id, Some(0));
        assert_eq!(offers[1].collection_offer_id, Some(1));
        assert_eq!(offers[0].token_id_list, vec!["1", "2", "3"]);
        assert_eq!(offers[1].amount, 1_100);
        assert!(offers.iter().all(|x| x.bid_type == BidType::CollectionOffer
            && x.liquidator == MARKET_MAKER_LIQUIDATOR
            && x.creation_date == 777
            && x.discount == 0.0));
    }

    #[test]
    fn test_merge_keeps_bids_first() {
        let bids = vec![BidsByCollection {
            collection_address: "c1".to_string(),
            liquidation_bids: vec![LiquidationBid {
                liquidator: "liq".to_string(),
                amount: 5_000,
                discount: 0.1,
                creation_date: 3,
                token_id_list: vec!["1".to_string()],
                bid_type: BidType::LiquidationBid,
            }],
        }];
        let offers = distribute_offers(
            &["c1".to_string()],
            &collateral_list(),
            &[CollectionOffers {
                collection_address: "c1".to_string(),
                price_list: vec![1_200],
            }],
            777,
        );

        let merged = merge_bids_and_offers(&bids, offers);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].collection_offer_id, None);
        assert_eq!(merged[0].collection_address, "c1");
        assert_eq!(merged[1].collection_offer_id, Some(0));
    }

    #[test]
    fn test_bid_list_filtered_by_borrower_collateral() {
        let pool = vec![
            bid("c1", "a", 1_000, &["1"]),
            bid("c1", "b", 1_000, &["3"]),
            bid("c2", "c", 1_000, &["1"]),
            bid("c2", "d", 1_000, &["7", "8"]),
        ];
        let alice = vec![
            ("c1".to_string(), collateral("alice", &["1", "2"])),
            ("c2".to_string(), collateral("alice", &["7"])),
        ];

        let filtered = get_collection_and_bid_list(&pool, &alice);
        let liquidators: Vec<&str> = filtered.iter().map(|x| x.liquidator.as_str()).collect();
        assert_eq!(liquidators, vec!["a", "d"]);
    }

    #[test]
    fn test_reduce_liquidation_bid() {
        let pool = vec![bid("c1", "a", 1_000, &["1", "2"]), bid("c1", "b", 2_000, &["1"])];
        let set = vec![sold(&pool[0], "1", 950)];

        let reduced = reduce_bids(pool, &set);
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced[0].amount, 50);
        assert_eq!(reduced[0].token_id_list, vec!["2"]);
        // untouched capacity, but the sold token is gone
        assert_eq!(reduced[1].amount, 2_000);
        assert!(reduced[1].token_id_list.is_empty());
    }

    #[test]
    fn test_reduce_charges_the_bid_that_paid() {
        let mut cheap = bid("c1", "a", 5_000, &["1"]);
        cheap.discount = 0.1;
        let winner = bid("c1", "a", 5_000, &["1"]);
        let pool = vec![cheap, winner];
        let set = vec![sold(&pool[1], "1", 950)];

        let reduced = reduce_bids(pool, &set);
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced[0].amount, 5_000);
        assert_eq!(reduced[1].discount, 0.05);
        assert_eq!(reduced[1].amount, 4_050);
    }

    #[test]
    fn test_reduce_drops_exhausted_bid() {
        let pool = vec![bid("c1", "a", 950, &["1"])];
        let set = vec![sold(&pool[0], "1", 950)];

        assert!(reduce_bids(pool, &set).is_empty());
    }

    #[test]
    fn test_reduce_evicts_whole_offer() {
        let offers = distribute_offers(
            &["c1".to_string()],
            &collateral_list(),
            &[CollectionOffers {
                collection_address: "c1".to_string(),
                price_list: vec![5_000, 1_100],
            }],
            777,
        );
        let mut pool = vec![bid("c1", "a", 1_000, &["2"])];
        pool.extend(offers);

        let set = vec![sold(&pool[1], "1", 5_000)];
        let reduced = reduce_bids(pool, &set);

        assert_eq!(reduced.len(), 2);
        assert!(reduced.iter().all(|x| x.collection_offer_id != Some(0)));
        assert_eq!(reduced[1].collection_offer_id, Some(1));
        assert_eq!(reduced[0].amount, 1_000);
    }
}
