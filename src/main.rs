use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::collections::HashMap;
use std::sync::Arc;

use nft_liquidator::config::Config;
use nft_liquidator::config_groups::{MarketMakerParams, PriceIndexParams, TargetingParams};
use nft_liquidator::pipeline::{
    init_block_time_offset, run_loop, run_market_maker_cycle, run_market_maker_loop, run_oracle_cycle,
    run_oracle_loop, run_targeting_cycle,
};
use nft_liquidator::{LoggingExecutor, Services, SnapshotSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Targets,
    Oracle,
    MarketMaker,
}

#[derive(Parser, Debug)]
#[command(name = "nft-liquidator", about = "Liquidation targeting, price oracle and market maker bot")]
struct Args {
    /// Snapshot JSON served as chain and marketplace state (overrides SNAPSHOT_PATH)
    #[arg(long)]
    snapshot: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::Targets)]
    mode: Mode,

    /// Repeat the cycle every POLL_INTERVAL_MS until Ctrl-C
    #[arg(long = "loop")]
    infinite_loop: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!("✅ Configuration loaded (dry run: {})", config.dry_run);

    let snapshot_path = args
        .snapshot
        .clone()
        .or_else(|| config.snapshot_path.clone())
        .context("No snapshot given: pass --snapshot or set SNAPSHOT_PATH")?;
    let source = Arc::new(SnapshotSource::from_path(&snapshot_path)?);
    let sink = Arc::new(LoggingExecutor);

    let services = Services {
        lending: source.clone(),
        oracle: source.clone(),
        marketplace: source,
        executor: sink.clone(),
        oracle_submitter: sink.clone(),
        offer_manager: sink,
    };

    match (args.mode, args.infinite_loop) {
        (Mode::Targets, true) => run_loop(services, config).await,
        (Mode::Oracle, true) => run_oracle_loop(services, config).await,
        (Mode::MarketMaker, true) => run_market_maker_loop(services, config).await,
        (Mode::Targets, false) => {
            let params = TargetingParams::from(&config);
            let offset = init_block_time_offset(services.oracle.as_ref(), params.block_time_margin_seconds).await?;
            let targets = run_targeting_cycle(&services, &params, offset).await?;

            println!("{}", serde_json::to_string_pretty(&targets)?);
            Ok(())
        }
        (Mode::Oracle, false) => {
            let params = PriceIndexParams::from(&config);
            let offset = init_block_time_offset(services.oracle.as_ref(), config.block_time_margin_seconds).await?;
            run_oracle_cycle(&services, &params, config.collections_page_size, &HashMap::new(), offset).await?;
            Ok(())
        }
        (Mode::MarketMaker, false) => {
            let params = MarketMakerParams::from(&config);
            run_market_maker_cycle(&services, &params, config.collections_page_size).await
        }
    }
}
