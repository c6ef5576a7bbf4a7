//! Cycle drivers: gather inputs through the collaborator traits, run the
//! pure engines, and hand the results to the sinks.

use anyhow::{Context, Result};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use crate::core::config::Config;
use crate::core::config_groups::{MarketMakerParams, PriceIndexParams, TargetingParams};
use crate::core::types::{Addr, CollectionOffers, LiquidationItem};
use crate::engine::targets::{liquidate_targets, select_targets, TargetingInput};
use crate::oracle::collection_price::CollectionPriceState;
use crate::oracle::{update_collection_prices, CollectionMarketData};
use crate::protocol::{LendingPlatform, LiquidationExecutor, Marketplace, OfferManager, OracleSubmitter, PriceOracle};
use crate::strategy::market_maker::{plan_offer_update, OfferUpdate};
use crate::utils::helpers::{block_time, block_time_offset, local_block_time};

/// Collaborators shared by all cycles.
#[derive(Clone)]
pub struct Services {
    pub lending: Arc<dyn LendingPlatform>,
    pub oracle: Arc<dyn PriceOracle>,
    pub marketplace: Arc<dyn Marketplace>,
    pub executor: Arc<dyn LiquidationExecutor>,
    pub oracle_submitter: Arc<dyn OracleSubmitter>,
    pub offer_manager: Arc<dyn OfferManager>,
}

/// Offset between local and chain time, measured once at startup.
pub async fn init_block_time_offset(oracle: &dyn PriceOracle, margin: u64) -> Result<i64> {
    let chain_block_time = oracle.block_time().await.context("Failed to query block time")?;
    let offset = block_time_offset(chain_block_time, local_block_time(), margin);

    log::info!("⏱️ Block time offset: {}s (margin {}s)", offset, margin);
    Ok(offset)
}

/// Marketplace offers per collection, at most `batch_size` requests in flight.
/// Results keep the order of `collection_list`.
pub async fn fetch_collection_offers(
    marketplace: &dyn Marketplace,
    collection_list: &[Addr],
    batch_size: usize,
) -> Result<Vec<CollectionOffers>> {
    let results: Vec<Result<CollectionOffers>> = stream::iter(collection_list.iter().cloned())
        .map(|collection_address| async move {
            let price_list = marketplace
                .collection_offers(&collection_address)
                .await
                .with_context(|| format!("Failed to query offers of {}", collection_address))?;

            Ok::<_, anyhow::Error>(CollectionOffers {
                collection_address,
                price_list,
            })
        })
        .buffered(batch_size.max(1))
        .collect()
        .await;

    results.into_iter().collect()
}

/// One targeting pass. Returns the proposed liquidations; they are only
/// submitted when dry run is off.
pub async fn run_targeting_cycle(
    services: &Services,
    params: &TargetingParams,
    block_time_offset: i64,
) -> Result<Vec<LiquidationItem>> {
    let rate_config = services.lending.rate_config().await.context("Failed to query rate config")?;
    let collateral_list = services
        .lending
        .collateral_list(params.collateral_page_size)
        .await
        .context("Failed to query collateral list")?;
    let borrower_list = services
        .lending
        .borrower_list(params.borrowers_page_size)
        .await
        .context("Failed to query borrower list")?;
    let prices = services
        .oracle
        .prices(params.prices_page_size)
        .await
        .context("Failed to query prices")?;

    let mut input = TargetingInput {
        rate_config,
        collateral_list,
        borrower_list,
        prices,
        liquidation_bids: Vec::new(),
        collection_offers: Vec::new(),
        block_time: block_time(block_time_offset),
    };

    let selection = select_targets(&input);
    if selection.targets.is_empty() {
        return Ok(Vec::new());
    }

    input.liquidation_bids = services
        .lending
        .liquidation_bids(params.bids_page_size)
        .await
        .context("Failed to query liquidation bids")?;
    input.collection_offers = fetch_collection_offers(
        services.marketplace.as_ref(),
        &selection.collection_list,
        params.offers_batch_size,
    )
    .await?;

    let liquidation_targets = liquidate_targets(&input, &selection, params.ltv_max_fraction)?;

    if liquidation_targets.is_empty() {
        return Ok(liquidation_targets);
    }

    if params.dry_run {
        log::info!("DRY RUN: {} liquidation targets not submitted", liquidation_targets.len());
    } else {
        let tx_hash = services
            .executor
            .liquidate(&liquidation_targets)
            .await
            .context("Failed to submit liquidation")?;
        log::info!("✅ Liquidated {} borrowers, tx: {}", liquidation_targets.len(), tx_hash);
    }

    Ok(liquidation_targets)
}

/// One oracle round over all listed collections. Returns the smoothing
/// state to pass into the next round.
pub async fn run_oracle_cycle(
    services: &Services,
    params: &PriceIndexParams,
    collections_page_size: u32,
    prev_states: &HashMap<Addr, CollectionPriceState>,
    block_time_offset: i64,
) -> Result<HashMap<Addr, CollectionPriceState>> {
    let block_time = block_time(block_time_offset);
    let collection_list = services
        .lending
        .collection_list(collections_page_size)
        .await
        .context("Failed to query collection list")?;

    let mut market_data: Vec<CollectionMarketData> = Vec::with_capacity(collection_list.len());
    for collection in collection_list {
        let floor_price = services
            .marketplace
            .floor_price(&collection)
            .await
            .with_context(|| format!("Failed to query floor price of {}", collection))?;
        let offer_price_list = match services.lending.market_maker_liquidity(&collection).await {
            Ok(liquidity) => liquidity.price_list.iter().map(|x| *x as f64).collect(),
            Err(e) => {
                log::debug!("No market maker offers for {}: {}", collection, e);
                Vec::new()
            }
        };

        market_data.push(CollectionMarketData {
            collection,
            floor_price,
            offer_price_list,
        });
    }

    let update = update_collection_prices(params, &market_data, prev_states, block_time);
    let tx_hash = services
        .oracle_submitter
        .update_prices(&update.price_list)
        .await
        .context("Failed to submit prices")?;

    log::info!("📈 Updated {} collection prices, tx: {}", update.price_list.len(), tx_hash);
    Ok(update.states)
}

/// One market maker round against the marketplace floor price.
pub async fn run_market_maker_cycle(
    services: &Services,
    params: &MarketMakerParams,
    collections_page_size: u32,
) -> Result<()> {
    let collection_list = services
        .lending
        .collection_list(collections_page_size)
        .await
        .context("Failed to query collection list")?;

    for collection in collection_list {
        let floor_price = services
            .marketplace
            .floor_price(&collection)
            .await
            .with_context(|| format!("Failed to query floor price of {}", collection))?
            .unwrap_or(0.0);

        if floor_price <= 0.0 {
            log::warn!("⚠️ No floor price for collection {}", collection);
            continue;
        }

        let liquidity = services
            .lending
            .market_maker_liquidity(&collection)
            .await
            .with_context(|| format!("Failed to query liquidity of {}", collection))?;

        let from_to_price_list = match plan_offer_update(params, floor_price, &liquidity) {
            OfferUpdate::NoLiquidity => {
                log::warn!("⚠️ No liquidity for collection {}", collection);
                continue;
            }
            OfferUpdate::Unchanged => {
                log::debug!("Offers of {} are in band", collection);
                continue;
            }
            OfferUpdate::ExtendUp {
                from_to_price_list,
                is_required_more_liquidity,
            } => {
                if is_required_more_liquidity {
                    log::warn!("⚠️ More liquidity is required for collection {}", collection);
                }
                from_to_price_list
            }
            OfferUpdate::ExtendDown { from_to_price_list } => from_to_price_list,
        };

        if from_to_price_list.is_empty() {
            continue;
        }

        let tx_hash = services
            .offer_manager
            .update_offers(&collection, &from_to_price_list)
            .await
            .with_context(|| format!("Failed to update offers of {}", collection))?;
        log::info!("✅ Moved {} offers of {}, tx: {}", from_to_price_list.len(), collection, tx_hash);
    }

    Ok(())
}

/// Sleeps for `poll_interval`; `false` when Ctrl-C arrived first.
async fn wait_next_cycle(poll_interval: Duration) -> bool {
    tokio::select! {
        _ = sleep(poll_interval) => true,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutdown requested, stopping loop");
            false
        }
    }
}

/// Runs targeting every poll interval until Ctrl-C. Cycle errors are logged
/// and the loop goes on.
pub async fn run_loop(services: Services, config: Config) -> Result<()> {
    let params = TargetingParams::from(&config);
    let offset = init_block_time_offset(services.oracle.as_ref(), params.block_time_margin_seconds).await?;
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    log::info!("🚀 Starting targeting loop (poll interval {}ms)", config.poll_interval_ms);

    loop {
        let started = Instant::now();
        match run_targeting_cycle(&services, &params, offset).await {
            Ok(targets) => log::info!(
                "Cycle finished in {}ms: {} targets",
                started.elapsed().as_millis(),
                targets.len()
            ),
            Err(e) => log::error!("Error in targeting cycle: {:#}", e),
        }

        if !wait_next_cycle(poll_interval).await {
            return Ok(());
        }
    }
}

/// Oracle rounds every poll interval, carrying the smoothing state. A failed
/// round keeps the previous state.
pub async fn run_oracle_loop(services: Services, config: Config) -> Result<()> {
    let params = PriceIndexParams::from(&config);
    let offset = init_block_time_offset(services.oracle.as_ref(), config.block_time_margin_seconds).await?;
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let mut states: HashMap<Addr, CollectionPriceState> = HashMap::new();

    log::info!("🚀 Starting oracle loop (poll interval {}ms)", config.poll_interval_ms);

    loop {
        let started = Instant::now();
        match run_oracle_cycle(&services, &params, config.collections_page_size, &states, offset).await {
            Ok(new_states) => states = new_states,
            Err(e) => log::error!("Error in oracle cycle: {:#}", e),
        }
        log::info!("Cycle finished in {}ms", started.elapsed().as_millis());

        if !wait_next_cycle(poll_interval).await {
            return Ok(());
        }
    }
}

pub async fn run_market_maker_loop(services: Services, config: Config) -> Result<()> {
    let params = MarketMakerParams::from(&config);
    let poll_interval = Duration::from_millis(config.poll_interval_ms);

    log::info!("🚀 Starting market maker loop (poll interval {}ms)", config.poll_interval_ms);

    loop {
        if let Err(e) = run_market_maker_cycle(&services, &params, config.collections_page_size).await {
            log::error!("Error in market maker cycle: {:#}", e);
        }

        if !wait_next_cycle(poll_interval).await {
            return Ok(());
        }
    }
}
