//! Configuration groups handed to the pure engines.
//!
//! The engines never see the whole `Config`; each one takes the slice of
//! settings it needs, built with `From<&Config>`.

use crate::core::config::Config;

/// Targeting cycle parameters
#[derive(Debug, Clone)]
pub struct TargetingParams {
    pub ltv_max_fraction: f64,
    pub block_time_margin_seconds: u64,
    pub collateral_page_size: u32,
    pub borrowers_page_size: u32,
    pub prices_page_size: u32,
    pub bids_page_size: u32,
    pub offers_batch_size: usize,
    pub dry_run: bool,
}

impl From<&Config> for TargetingParams {
    fn from(config: &Config) -> Self {
        TargetingParams {
            ltv_max_fraction: config.ltv_max_fraction,
            block_time_margin_seconds: config.block_time_margin_seconds,
            collateral_page_size: config.collateral_page_size,
            borrowers_page_size: config.borrowers_page_size,
            prices_page_size: config.prices_page_size,
            bids_page_size: config.bids_page_size,
            offers_batch_size: config.offers_batch_size,
            dry_run: config.dry_run,
        }
    }
}

/// Collection price index smoothing
#[derive(Debug, Clone)]
pub struct PriceIndexParams {
    pub floor_price_boundary_upper: f64,
    pub floor_price_boundary_lower: f64,
    pub twap_weight: f64,
    /// Sampling window in seconds
    pub window: u64,
    pub fp_twap_window_multiplier: u64,
}

impl From<&Config> for PriceIndexParams {
    fn from(config: &Config) -> Self {
        PriceIndexParams {
            floor_price_boundary_upper: config.floor_price_boundary_upper,
            floor_price_boundary_lower: config.floor_price_boundary_lower,
            twap_weight: config.twap_weight,
            window: config.sampling_window_seconds,
            fp_twap_window_multiplier: config.fp_twap_window_multiplier,
        }
    }
}

/// Market maker offer ladder
#[derive(Debug, Clone)]
pub struct MarketMakerParams {
    pub floor_price_boundary_upper: f64,
    pub floor_price_boundary_lower: f64,
    pub allowed_offers_boundary_upper: f64,
    pub allowed_offers_boundary_lower: f64,
    pub max_offers: usize,
    pub max_inactive_offers: usize,
}

impl From<&Config> for MarketMakerParams {
    fn from(config: &Config) -> Self {
        MarketMakerParams {
            floor_price_boundary_upper: config.floor_price_boundary_upper,
            floor_price_boundary_lower: config.floor_price_boundary_lower,
            allowed_offers_boundary_upper: config.allowed_offers_boundary_upper,
            allowed_offers_boundary_lower: config.allowed_offers_boundary_lower,
            max_offers: config.max_offers,
            max_inactive_offers: config.max_inactive_offers,
        }
    }
}
