//! Pricing, billing, aggregation and snapshot services

pub mod aggregator;
pub mod billing;
pub mod collector;
pub mod config_loader;
pub mod family;
pub mod live_sessions;
pub mod pricing;
pub mod snapshot;

pub use aggregator::{DateFilter, UsageAggregator};
pub use billing::BillingClassifier;
pub use collector::{ConfigSource, SnapshotService};
pub use config_loader::load_config;
pub use family::{ModelFamily, ModelTier};
pub use live_sessions::{LiveSessionSource, OpenClawCli};
pub use pricing::PricingCatalog;
pub use snapshot::SnapshotAssembler;
