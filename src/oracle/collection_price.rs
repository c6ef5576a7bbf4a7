// Collection price: hybrid TWAP/EMA of the floor price, then hybrid TWAP/EMA
// of the mean of the offers that sit inside the floor-price band.

use serde::{Deserialize, Serialize};

use crate::core::config_groups::PriceIndexParams;
use crate::oracle::indicators::{calc_ema, calc_hybrid_average, calc_twap, PriceSample};
use crate::utils::math::calc_mean;

/// Smoothing state of one collection, carried by the caller between cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionPriceState {
    pub twap_sample_list: Vec<PriceSample>,
    pub floor_price_ema: Option<f64>,
    /// Smoothed floor price, also consumed by the market maker.
    pub floor_price: f64,
    pub twap_offer_list: Vec<PriceSample>,
    pub offer_ema: Option<f64>,
    pub collection_price: f64,
}

/// Offers inside `[lower * floor_price, upper * floor_price]`.
pub fn filter_valid_offers(offer_price_list: &[f64], floor_price: f64, lower: f64, upper: f64) -> Vec<f64> {
    offer_price_list
        .iter()
        .copied()
        .filter(|offer| *offer >= lower * floor_price && *offer <= upper * floor_price)
        .collect()
}

/// Number of samples per smoothing window, estimated from the average
/// distance between floor price samples. `0` until there is history.
fn window_samples(window: u64, floor_price_sample_list: &[PriceSample], new_sample: &PriceSample) -> f64 {
    let full_period = floor_price_sample_list
        .first()
        .map(|first| new_sample.timestamp as f64 - first.timestamp as f64)
        .unwrap_or(0.0);
    let average_sample_period = full_period / (floor_price_sample_list.len() + 1) as f64;

    if average_sample_period != 0.0 {
        window as f64 / average_sample_period
    } else {
        0.0
    }
}

pub fn calc_collection_price(
    params: &PriceIndexParams,
    prev: &CollectionPriceState,
    new_floor_price_sample: PriceSample,
    offer_price_list: &[f64],
) -> CollectionPriceState {
    // floor price is noisier than the offers, so its TWAP window is wider
    let (floor_price_twap, twap_sample_list) = calc_twap(
        params.fp_twap_window_multiplier * params.window,
        &prev.twap_sample_list,
        Some(new_floor_price_sample),
    );

    let window_samples = window_samples(params.window, &prev.twap_sample_list, &new_floor_price_sample);

    let floor_price_ema = calc_ema(window_samples, new_floor_price_sample.value, prev.floor_price_ema);
    let floor_price = calc_hybrid_average(floor_price_twap, floor_price_ema, params.twap_weight);

    let valid_offers = filter_valid_offers(
        offer_price_list,
        floor_price,
        params.floor_price_boundary_lower,
        params.floor_price_boundary_upper,
    );

    let mean_offer = if valid_offers.is_empty() {
        floor_price * (params.floor_price_boundary_upper + params.floor_price_boundary_lower) / 2.0
    } else {
        calc_mean(&valid_offers)
    };
    let new_mean_offer_sample = PriceSample::new(mean_offer, new_floor_price_sample.timestamp);

    let (offer_twap, twap_offer_list) =
        calc_twap(params.window, &prev.twap_offer_list, Some(new_mean_offer_sample));
    let offer_ema = calc_ema(window_samples, new_mean_offer_sample.value, prev.offer_ema);
    let collection_price = calc_hybrid_average(offer_twap, offer_ema, params.twap_weight);

    log::debug!(
        "collection price: fp_twap={:.6}, fp_ema={:.6}, fp={:.6}, valid_offers={}, offer_twap={:.6}, offer_ema={:.6}, price={:.6}",
        floor_price_twap,
        floor_price_ema,
        floor_price,
        valid_offers.len(),
        offer_twap,
        offer_ema,
        collection_price
    );

    CollectionPriceState {
        twap_sample_list,
        floor_price_ema: Some(floor_price_ema),
        floor_price,
        twap_offer_list,
        offer_ema: Some(offer_ema),
        collection_price,
    }
}
