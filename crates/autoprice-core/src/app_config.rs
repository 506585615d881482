use std::net::SocketAddr;
use std::path::PathBuf;

use crate::query::ListingCondition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub catalog_path: PathBuf,
    /// Origin of the embedded-JSON classifieds site (Source A).
    pub classifieds_base_url: String,
    /// Market scope sent as the `markets[]` filter on Source A.
    pub classifieds_market: String,
    /// Origin of the table-based listings site (Source B).
    pub tabular_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    /// Pause between consecutive trims of a batch.
    pub inter_trim_delay_ms: u64,
    pub condition: ListingCondition,
}
