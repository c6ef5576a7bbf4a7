pub mod core {
    pub mod config;
    pub mod config_groups;
    pub mod error;
    pub mod types;
}

pub mod engine {
    pub mod bid_pool;
    pub mod ltv;
    pub mod matcher;
    pub mod selector;
    pub mod targets;
}

pub mod oracle;

pub mod strategy {
    pub mod market_maker;
    pub mod offer_ladder;
}

pub mod utils {
    pub mod helpers;
    pub mod math;
}

pub mod data_source;
pub mod pipeline;
pub mod protocol;

pub use crate::core::{config, config_groups, error, types};
pub use data_source::{LoggingExecutor, Snapshot, SnapshotSource};
pub use engine::targets::{liquidate_targets, query_targets, select_targets, TargetSelection, TargetingInput};
pub use pipeline::Services;
pub use protocol::{LendingPlatform, LiquidationExecutor, Marketplace, OfferManager, OracleSubmitter, PriceOracle};
