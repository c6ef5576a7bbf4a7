use crate::core::config_groups::MarketMakerParams;
use crate::core::types::MarketMakerLiquidity;
use crate::strategy::offer_ladder::{
    get_offers_extended_down, get_offers_extended_up, split_offers, FromToPrice,
};

/// What the market maker should do with one collection's offers this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum OfferUpdate {
    /// Place or lift offers; submitted even when only part of the ladder fits.
    ExtendUp {
        from_to_price_list: Vec<FromToPrice>,
        is_required_more_liquidity: bool,
    },
    ExtendDown {
        from_to_price_list: Vec<FromToPrice>,
    },
    NoLiquidity,
    Unchanged,
}

/// Extends up when no offer is in band or too many fell below it, otherwise
/// extends down when too many are above it.
pub fn plan_offer_update(
    params: &MarketMakerParams,
    floor_price: f64,
    liquidity: &MarketMakerLiquidity,
) -> OfferUpdate {
    let amount_undistributed = liquidity.amount_undistributed as f64;
    let lower_floor_price = floor_price * params.floor_price_boundary_lower;
    let upper_floor_price = floor_price * params.floor_price_boundary_upper;

    let price_list: Vec<f64> = liquidity.price_list.iter().map(|x| *x as f64).collect();
    let split = split_offers(lower_floor_price, upper_floor_price, &price_list);

    if split.regular_offers.is_empty() || split.too_small_offers.len() >= params.max_inactive_offers {
        let extended = get_offers_extended_up(
            params.allowed_offers_boundary_upper,
            amount_undistributed,
            floor_price,
            lower_floor_price,
            &split.regular_offers,
            &split.too_small_offers,
            params.max_offers,
        );

        if extended.is_no_liquidity {
            return OfferUpdate::NoLiquidity;
        }

        return OfferUpdate::ExtendUp {
            from_to_price_list: extended.from_to_price_list,
            is_required_more_liquidity: extended.is_required_more_liquidity,
        };
    }

    if split.too_big_offers.len() >= params.max_inactive_offers {
        let extended = get_offers_extended_down(
            params.allowed_offers_boundary_lower,
            amount_undistributed,
            floor_price,
            upper_floor_price,
            &split.regular_offers,
            &split.too_big_offers,
        );

        if extended.is_no_liquidity {
            return OfferUpdate::NoLiquidity;
        }

        return OfferUpdate::ExtendDown {
            from_to_price_list: extended.from_to_price_list,
        };
    }

    OfferUpdate::Unchanged
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: u128 = 1_000_000;

    fn params() -> MarketMakerParams {
        MarketMakerParams {
            floor_price_boundary_upper: 0.93,
            floor_price_boundary_lower: 0.8,
            allowed_offers_boundary_upper: 0.93,
            allowed_offers_boundary_lower: 0.8,
            max_offers: 15,
            max_inactive_offers: 5,
        }
    }

    fn ladder() -> Vec<u128> {
        (0..21).map(|i| 800 * M + 6_500_000 * i).collect()
    }

    #[test]
    fn test_unchanged_when_offers_in_band() {
        let liquidity = MarketMakerLiquidity {
            amount_undistributed: 10_000 * M,
            price_list: ladder(),
        };
        assert_eq!(plan_offer_update(&params(), 1_000.0 * M as f64, &liquidity), OfferUpdate::Unchanged);
    }

    #[test]
    fn test_extend_up_after_floor_price_rise() {
        let liquidity = MarketMakerLiquidity {
            amount_undistributed: 10_000 * M,
            price_list: ladder(),
        };
        match plan_offer_update(&params(), 1_040.0 * M as f64, &liquidity) {
            OfferUpdate::ExtendUp {
                from_to_price_list,
                is_required_more_liquidity,
            } => {
                assert_eq!(from_to_price_list.len(), 5);
                assert!(!is_required_more_liquidity);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_extend_down_after_floor_price_drop() {
        let liquidity = MarketMakerLiquidity {
            amount_undistributed: 10_000 * M,
            price_list: ladder(),
        };
        match plan_offer_update(&params(), 970.0 * M as f64, &liquidity) {
            OfferUpdate::ExtendDown { from_to_price_list } => {
                assert_eq!(from_to_price_list.len(), 5);
                assert_eq!(from_to_price_list[4], (904.0 * M as f64, 776.0 * M as f64));
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn test_no_liquidity() {
        let liquidity = MarketMakerLiquidity {
            amount_undistributed: 600 * M,
            price_list: ladder(),
        };
        assert_eq!(plan_offer_update(&params(), 1_040.0 * M as f64, &liquidity), OfferUpdate::NoLiquidity);

        let empty = MarketMakerLiquidity::default();
        assert_eq!(plan_offer_update(&params(), 1_000.0 * M as f64, &empty), OfferUpdate::NoLiquidity);
    }

    #[test]
    fn test_initial_ladder_when_no_offers() {
        let liquidity = MarketMakerLiquidity {
            amount_undistributed: 100_000 * M,
            price_list: vec![],
        };
        match plan_offer_update(&params(), 1_000.0 * M as f64, &liquidity) {
            OfferUpdate::ExtendUp { from_to_price_list, .. } => {
                assert_eq!(from_to_price_list.len(), 15);
                assert!(from_to_price_list.iter().all(|(before, _)| *before == 0.0));
                assert_eq!(from_to_price_list[0].1, 800.0 * M as f64);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }
}
