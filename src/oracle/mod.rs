// Collection price oracle: smoothing primitives and the per-collection
// price index fed to the lending platform.

pub mod collection_price;
pub mod indicators;

use std::collections::HashMap;

use crate::core::config_groups::PriceIndexParams;
use crate::core::types::Addr;
use crate::oracle::collection_price::{calc_collection_price, CollectionPriceState};
use crate::oracle::indicators::PriceSample;
use crate::utils::math::floor;

/// Market inputs of one collection for a single oracle round.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionMarketData {
    pub collection: Addr,
    /// Marketplace floor price, if the marketplace lists the collection.
    pub floor_price: Option<f64>,
    /// Market maker offer prices.
    pub offer_price_list: Vec<f64>,
}

impl CollectionMarketData {
    /// Floor price, falling back to the highest offer, then to zero.
    pub fn effective_floor_price(&self) -> f64 {
        match self.floor_price {
            Some(price) if price > 0.0 => price,
            _ => self.offer_price_list.iter().copied().fold(0.0, f64::max),
        }
    }
}

/// Result of one oracle round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceUpdate {
    /// `(collection, price)` pairs ready for submission, truncated to 2 decimals.
    pub price_list: Vec<(Addr, f64)>,
    /// Smoothing state to carry into the next round.
    pub states: HashMap<Addr, CollectionPriceState>,
}

/// Advances every collection's price index by one sample taken at `block_time`.
/// Collections without carried state start from scratch.
pub fn update_collection_prices(
    params: &PriceIndexParams,
    market_data: &[CollectionMarketData],
    prev_states: &HashMap<Addr, CollectionPriceState>,
    block_time: u64,
) -> PriceUpdate {
    let mut update = PriceUpdate::default();
    let empty = CollectionPriceState::default();

    for data in market_data {
        let prev = prev_states.get(&data.collection).unwrap_or(&empty);
        let sample = PriceSample::new(data.effective_floor_price(), block_time);
        let state = calc_collection_price(params, prev, sample, &data.offer_price_list);

        update.price_list.push((data.collection.clone(), floor(state.collection_price, 2)));
        update.states.insert(data.collection.clone(), state);
    }

    update
}
