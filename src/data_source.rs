use crate::core::error::Error;
use crate::core::types::{
    Addr, BidsByCollection, BorrowerEntry, CollateralByCollection, CollectionOffers, LiquidationItem,
    MarketMakerLiquidity, PriceSnapshot, RateConfig,
};
use crate::protocol::{LendingPlatform, LiquidationExecutor, Marketplace, OfferManager, OracleSubmitter, PriceOracle};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DRY_RUN_TX_HASH: &str = "DRY_RUN_TX_HASH";

/// Point-in-time capture of everything the cycles query, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub rate_config: RateConfig,
    pub block_time: u64,
    #[serde(default)]
    pub collateral_list: Vec<CollateralByCollection>,
    #[serde(default)]
    pub borrower_list: Vec<BorrowerEntry>,
    #[serde(default)]
    pub prices: PriceSnapshot,
    #[serde(default)]
    pub liquidation_bids: Vec<BidsByCollection>,
    /// Listed collections; the collateral collections when omitted.
    #[serde(default)]
    pub collection_list: Vec<Addr>,
    #[serde(default)]
    pub collection_offers: Vec<CollectionOffers>,
    #[serde(default)]
    pub floor_prices: HashMap<Addr, f64>,
    #[serde(default)]
    pub market_maker_liquidity: HashMap<Addr, MarketMakerLiquidity>,
}

/// Serves all queries from a [`Snapshot`], ignoring page sizes.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotSource { snapshot }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json).context("Invalid snapshot JSON")?;
        Ok(Self::new(snapshot))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let source = Self::from_json(&json)?;

        log::info!(
            "📂 Loaded snapshot {}: {} collections, {} borrowers, block time {}",
            path.display(),
            source.snapshot.collateral_list.len(),
            source.snapshot.borrower_list.len(),
            source.snapshot.block_time
        );

        Ok(source)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[async_trait]
impl LendingPlatform for SnapshotSource {
    async fn rate_config(&self) -> Result<RateConfig> {
        Ok(self.snapshot.rate_config.clone())
    }

    async fn collateral_list(&self, _page_size: u32) -> Result<Vec<CollateralByCollection>> {
        Ok(self.snapshot.collateral_list.clone())
    }

    async fn borrower_list(&self, _page_size: u32) -> Result<Vec<BorrowerEntry>> {
        Ok(self.snapshot.borrower_list.clone())
    }

    async fn liquidation_bids(&self, _page_size: u32) -> Result<Vec<BidsByCollection>> {
        Ok(self.snapshot.liquidation_bids.clone())
    }

    async fn collection_list(&self, _page_size: u32) -> Result<Vec<Addr>> {
        if !self.snapshot.collection_list.is_empty() {
            return Ok(self.snapshot.collection_list.clone());
        }

        Ok(self.snapshot.collateral_list.iter().map(|x| x.address.clone()).collect())
    }

    async fn market_maker_liquidity(&self, collection: &str) -> Result<MarketMakerLiquidity> {
        self.snapshot
            .market_maker_liquidity
            .get(collection)
            .cloned()
            .ok_or_else(|| Error::DataSource(format!("No market maker liquidity for {}", collection)).into())
    }
}

#[async_trait]
impl PriceOracle for SnapshotSource {
    async fn prices(&self, _page_size: u32) -> Result<PriceSnapshot> {
        Ok(self.snapshot.prices.clone())
    }

    async fn block_time(&self) -> Result<u64> {
        Ok(self.snapshot.block_time)
    }
}

#[async_trait]
impl Marketplace for SnapshotSource {
    async fn collection_offers(&self, collection: &str) -> Result<Vec<u128>> {
        Ok(self
            .snapshot
            .collection_offers
            .iter()
            .find(|x| x.collection_address == collection)
            .map(|x| x.price_list.clone())
            .unwrap_or_default())
    }

    async fn floor_price(&self, collection: &str) -> Result<Option<f64>> {
        Ok(self.snapshot.floor_prices.get(collection).copied())
    }
}

/// Sink that logs what would be submitted and sends nothing.
#[derive(Debug, Clone, Default)]
pub struct LoggingExecutor;

#[async_trait]
impl LiquidationExecutor for LoggingExecutor {
    async fn liquidate(&self, targets: &[LiquidationItem]) -> Result<String> {
        for item in targets {
            let tokens: Vec<String> = item
                .liquidation_set
                .iter()
                .map(|x| format!("{}:{}@{}", x.collection, x.token_item.id, x.liquidation_price))
                .collect();
            log::info!("DRY RUN: Would liquidate {} [{}]", item.borrower, tokens.join(", "));
        }

        Ok(DRY_RUN_TX_HASH.to_string())
    }
}

#[async_trait]
impl OracleSubmitter for LoggingExecutor {
    async fn update_prices(&self, price_list: &[(Addr, f64)]) -> Result<String> {
        for (collection, price) in price_list {
            log::info!("DRY RUN: Would set price of {} to {}", collection, price);
        }

        Ok(DRY_RUN_TX_HASH.to_string())
    }
}

#[async_trait]
impl OfferManager for LoggingExecutor {
    async fn update_offers(&self, collection: &str, from_to_price_list: &[(f64, f64)]) -> Result<String> {
        log::info!(
            "DRY RUN: Would move {} offers of {}: {:?}",
            from_to_price_list.len(),
            collection,
            from_to_price_list
        );

        Ok(DRY_RUN_TX_HASH.to_string())
    }
}
