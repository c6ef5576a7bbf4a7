// Collaborator seams of the bot: chain queries, marketplace data, and the
// transactions the cycles produce. Paginated queries take the page size and
// return the complete list.

use anyhow::Result;
use async_trait::async_trait;

use crate::core::types::{
    Addr, BidsByCollection, BorrowerEntry, CollateralByCollection, LiquidationItem, MarketMakerLiquidity,
    PriceSnapshot, RateConfig,
};

#[async_trait]
pub trait LendingPlatform: Send + Sync {
    async fn rate_config(&self) -> Result<RateConfig>;
    async fn collateral_list(&self, page_size: u32) -> Result<Vec<CollateralByCollection>>;
    async fn borrower_list(&self, page_size: u32) -> Result<Vec<BorrowerEntry>>;
    async fn liquidation_bids(&self, page_size: u32) -> Result<Vec<BidsByCollection>>;
    /// Addresses of the collections accepted as collateral.
    async fn collection_list(&self, page_size: u32) -> Result<Vec<Addr>>;
    async fn market_maker_liquidity(&self, collection: &str) -> Result<MarketMakerLiquidity>;
}

#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn prices(&self, page_size: u32) -> Result<PriceSnapshot>;
    /// Chain time in seconds.
    async fn block_time(&self) -> Result<u64>;
}

#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Collection offer prices in the lending denomination.
    async fn collection_offers(&self, collection: &str) -> Result<Vec<u128>>;
    async fn floor_price(&self, collection: &str) -> Result<Option<f64>>;
}

#[async_trait]
pub trait LiquidationExecutor: Send + Sync {
    /// Submits all items as one transaction and returns its hash.
    async fn liquidate(&self, targets: &[LiquidationItem]) -> Result<String>;
}

#[async_trait]
pub trait OracleSubmitter: Send + Sync {
    async fn update_prices(&self, price_list: &[(Addr, f64)]) -> Result<String>;
}

#[async_trait]
pub trait OfferManager: Send + Sync {
    /// Moves offers from the first price of each pair to the second.
    async fn update_offers(&self, collection: &str, from_to_price_list: &[(f64, f64)]) -> Result<String>;
}
