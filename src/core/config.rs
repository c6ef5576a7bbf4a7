use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub ltv_max_fraction: f64, // Target ltv after liquidation as a fraction of ltv max (default: 0.9)
    pub block_time_margin_seconds: u64,
    pub collateral_page_size: u32,
    pub borrowers_page_size: u32,
    pub prices_page_size: u32,
    pub bids_page_size: u32,
    pub collections_page_size: u32,
    pub offers_batch_size: usize,
    pub poll_interval_ms: u64,
    pub dry_run: bool,
    pub twap_weight: f64,
    pub sampling_window_seconds: u64,
    pub fp_twap_window_multiplier: u64,
    pub floor_price_boundary_upper: f64,
    pub floor_price_boundary_lower: f64,
    pub allowed_offers_boundary_upper: f64,
    pub allowed_offers_boundary_lower: f64,
    pub max_offers: usize,
    pub max_inactive_offers: usize,
    pub snapshot_path: Option<String>,
}

fn var_or<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .with_context(|| format!("Invalid {} value", key))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Config {
            ltv_max_fraction: var_or("LTV_MAX_FRACTION", "0.9")?,
            block_time_margin_seconds: var_or("BLOCK_TIME_MARGIN_SECONDS", "10")?, // paginated queries lag behind the chain
            collateral_page_size: var_or("COLLATERAL_PAGE_SIZE", "100")?,
            borrowers_page_size: var_or("BORROWERS_PAGE_SIZE", "100")?,
            prices_page_size: var_or("PRICES_PAGE_SIZE", "100")?,
            bids_page_size: var_or("BIDS_PAGE_SIZE", "100")?,
            collections_page_size: var_or("COLLECTIONS_PAGE_SIZE", "50")?,
            offers_batch_size: var_or("OFFERS_BATCH_SIZE", "5")?,
            poll_interval_ms: var_or("POLL_INTERVAL_MS", "6000")?,
            dry_run: env::var("DRY_RUN")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid DRY_RUN value (must be 'true' or 'false')")?,
            twap_weight: var_or("TWAP_WEIGHT", "0.7")?,
            sampling_window_seconds: var_or("SAMPLING_WINDOW_SECONDS", "60")?, // 10 blocks of 6s
            fp_twap_window_multiplier: var_or("FP_TWAP_WINDOW_MULTIPLIER", "2")?,
            floor_price_boundary_upper: var_or("FLOOR_PRICE_BOUNDARY_UPPER", "0.93")?,
            floor_price_boundary_lower: var_or("FLOOR_PRICE_BOUNDARY_LOWER", "0.8")?,
            allowed_offers_boundary_upper: var_or("ALLOWED_OFFERS_BOUNDARY_UPPER", "0.93")?,
            allowed_offers_boundary_lower: var_or("ALLOWED_OFFERS_BOUNDARY_LOWER", "0.8")?,
            max_offers: var_or("MAX_OFFERS", "15")?,
            max_inactive_offers: var_or("MAX_INACTIVE_OFFERS", "5")?,
            snapshot_path: env::var("SNAPSHOT_PATH").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.5..=1.0).contains(&self.ltv_max_fraction) {
            return Err(anyhow::anyhow!(
                "LTV_MAX_FRACTION must be within [0.5, 1], got: {}",
                self.ltv_max_fraction
            ));
        }

        if !(0.0..=1.0).contains(&self.twap_weight) {
            return Err(anyhow::anyhow!(
                "TWAP_WEIGHT must be within [0, 1], got: {}",
                self.twap_weight
            ));
        }

        if self.floor_price_boundary_lower > self.floor_price_boundary_upper {
            return Err(anyhow::anyhow!(
                "FLOOR_PRICE_BOUNDARY_LOWER ({}) must not exceed FLOOR_PRICE_BOUNDARY_UPPER ({})",
                self.floor_price_boundary_lower,
                self.floor_price_boundary_upper
            ));
        }

        if self.allowed_offers_boundary_lower > self.allowed_offers_boundary_upper {
            return Err(anyhow::anyhow!(
                "ALLOWED_OFFERS_BOUNDARY_LOWER ({}) must not exceed ALLOWED_OFFERS_BOUNDARY_UPPER ({})",
                self.allowed_offers_boundary_lower,
                self.allowed_offers_boundary_upper
            ));
        }

        if self.offers_batch_size == 0 {
            return Err(anyhow::anyhow!("OFFERS_BATCH_SIZE must be > 0"));
        }

        if self.max_offers < 2 {
            return Err(anyhow::anyhow!(
                "MAX_OFFERS must be >= 2 to build a price ladder, got: {}",
                self.max_offers
            ));
        }

        if self.sampling_window_seconds == 0 {
            return Err(anyhow::anyhow!("SAMPLING_WINDOW_SECONDS must be > 0"));
        }

        if self.poll_interval_ms < 1000 {
            log::warn!(
                "⚠️  POLL_INTERVAL_MS={}ms is shorter than a block, cycles will overlap on chain state",
                self.poll_interval_ms
            );
        }

        if !self.dry_run {
            log::warn!("⚠️  DRY_RUN=false: liquidations and price updates will be sent to the chain!");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ltv_max_fraction: 0.9,
            block_time_margin_seconds: 10,
            collateral_page_size: 100,
            borrowers_page_size: 100,
            prices_page_size: 100,
            bids_page_size: 100,
            collections_page_size: 50,
            offers_batch_size: 5,
            poll_interval_ms: 6000,
            dry_run: true,
            twap_weight: 0.7,
            sampling_window_seconds: 60,
            fp_twap_window_multiplier: 2,
            floor_price_boundary_upper: 0.93,
            floor_price_boundary_lower: 0.8,
            allowed_offers_boundary_upper: 0.93,
            allowed_offers_boundary_lower: 0.8,
            max_offers: 15,
            max_inactive_offers: 5,
            snapshot_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_ltv_max_fraction_range() {
        let mut config = Config::default();
        config.ltv_max_fraction = 0.3;
        assert!(config.validate().is_err());
        config.ltv_max_fraction = 1.2;
        assert!(config.validate().is_err());
        config.ltv_max_fraction = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_boundaries_rejected() {
        let mut config = Config::default();
        config.floor_price_boundary_lower = 0.95;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.allowed_offers_boundary_upper = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ladder_needs_two_offers() {
        let mut config = Config::default();
        config.max_offers = 1;
        assert!(config.validate().is_err());
    }
}
