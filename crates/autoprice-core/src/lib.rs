pub mod aggregate;
pub mod app_config;
pub mod bracket;
pub mod catalog;
pub mod config;
pub mod listing;
pub mod query;
pub mod reconcile;
pub mod slug;
pub mod vocabulary;

use thiserror::Error;

pub use aggregate::{aggregate_listings, pool_listings};
pub use app_config::{AppConfig, Environment};
pub use bracket::{resolve_power_bracket, PowerBracket, POWER_BRACKETS};
pub use catalog::{load_catalog, BrandEntry, Catalog, ModelEntry};
pub use config::{load_app_config, load_app_config_from_env};
pub use listing::{ExternalListing, SourceId, SourcePriceAggregate};
pub use query::{parse_power, ListingCondition, QueryError, SearchQuery, Trim};
pub use reconcile::{
    classify, reconcile_prices, Accuracy, BatchSummary, PriceComparison, ReconciliationResult,
};
pub use slug::{classifieds_make_model, tabular_slug};
pub use vocabulary::{FilterToken, Vocabulary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
