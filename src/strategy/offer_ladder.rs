// Market maker offer ladder: partitions the current offers against the
// floor-price band and re-prices out-of-band offers onto an even ladder.

use crate::utils::math::{cmp_f64, floor};

/// `(price_before, price_after)`; a `price_before` of `0` places a new offer.
pub type FromToPrice = (f64, f64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitOffers {
    /// Inside the band, descending.
    pub regular_offers: Vec<f64>,
    /// Below the band, ascending so the cheapest are moved first.
    pub too_small_offers: Vec<f64>,
    /// Above the band, descending.
    pub too_big_offers: Vec<f64>,
}

impl SplitOffers {
    pub fn len(&self) -> usize {
        self.regular_offers.len() + self.too_small_offers.len() + self.too_big_offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn split_offers(lower_floor_price: f64, upper_floor_price: f64, price_list: &[f64]) -> SplitOffers {
    let mut sorted = price_list.to_vec();
    sorted.sort_by(|a, b| cmp_f64(*b, *a));

    let mut split = SplitOffers::default();
    for price in sorted {
        if price < lower_floor_price {
            split.too_small_offers.push(price);
        } else if price > upper_floor_price {
            split.too_big_offers.push(price);
        } else {
            split.regular_offers.push(price);
        }
    }
    split.too_small_offers.reverse();

    split
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedUp {
    pub from_to_price_list: Vec<FromToPrice>,
    pub is_no_liquidity: bool,
    pub is_required_more_liquidity: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedDown {
    pub from_to_price_list: Vec<FromToPrice>,
    pub is_no_liquidity: bool,
}

/// Moves too-small offers above the best in-band offer, stepping evenly up to
/// `floor_price * upper_allowed_offers_boundary`. Without in-band offers a
/// fresh ladder of `max_offers` is placed starting at the band's lower edge.
///
/// Pairs are accepted in order while the undistributed liquidity covers the
/// new price; each accepted pair consumes `price_after - price_before`.
pub fn get_offers_extended_up(
    upper_allowed_offers_boundary: f64,
    amount_undistributed: f64,
    floor_price: f64,
    lower_floor_price: f64,
    regular_offers: &[f64],
    too_small_offers: &[f64],
    max_offers: usize,
) -> ExtendedUp {
    let highest_offer = floor(regular_offers.first().copied().unwrap_or(lower_floor_price), 0);
    let allowed_price_range = floor_price * upper_allowed_offers_boundary - highest_offer;

    let from_to_price_list_raw: Vec<FromToPrice> = if !regular_offers.is_empty() {
        if too_small_offers.is_empty() {
            Vec::new()
        } else {
            let price_step = floor(allowed_price_range / too_small_offers.len() as f64, 0);
            too_small_offers
                .iter()
                .enumerate()
                .map(|(i, price_before)| (*price_before, highest_offer + price_step * (i + 1) as f64))
                .collect()
        }
    } else {
        let price_step = floor(allowed_price_range / max_offers.saturating_sub(1).max(1) as f64, 0);
        (0..max_offers)
            .map(|i| (0.0, highest_offer + price_step * i as f64))
            .collect()
    };

    let mut available_liquidity = amount_undistributed;
    let mut from_to_price_list = Vec::with_capacity(from_to_price_list_raw.len());
    for (price_before, price_after) in &from_to_price_list_raw {
        if available_liquidity >= *price_after {
            from_to_price_list.push((*price_before, *price_after));
            available_liquidity -= price_after - price_before;
        }
    }

    ExtendedUp {
        is_no_liquidity: from_to_price_list.is_empty(),
        is_required_more_liquidity: from_to_price_list.len() < from_to_price_list_raw.len(),
        from_to_price_list,
    }
}

/// Moves too-big offers below the lowest in-band offer, stepping evenly down
/// to `floor_price * lower_allowed_offers_boundary`.
///
/// Liquidity is judged on the first re-priced offer only.
pub fn get_offers_extended_down(
    lower_allowed_offers_boundary: f64,
    amount_undistributed: f64,
    floor_price: f64,
    upper_floor_price: f64,
    regular_offers: &[f64],
    too_big_offers: &[f64],
) -> ExtendedDown {
    let lowest_offer = regular_offers.last().copied().unwrap_or(upper_floor_price);
    let allowed_price_range = lowest_offer - floor_price * lower_allowed_offers_boundary;

    let from_to_price_list: Vec<FromToPrice> = if too_big_offers.is_empty() {
        Vec::new()
    } else {
        let price_step = floor(allowed_price_range / too_big_offers.len() as f64, 0);
        too_big_offers
            .iter()
            .enumerate()
            .map(|(i, price_before)| (*price_before, lowest_offer - price_step * (i + 1) as f64))
            .collect()
    };

    let is_no_liquidity = from_to_price_list
        .first()
        .map(|(_, first_price_after)| amount_undistributed < *first_price_after)
        .unwrap_or(false);

    ExtendedDown {
        from_to_price_list,
        is_no_liquidity,
    }
}
