pub mod client;
pub mod engine;
pub mod error;
pub mod rate_limit;
pub mod sources;

pub use client::MarketClient;
pub use engine::{Engine, EngineSettings, MarketSnapshot};
pub use error::ScraperError;
pub use sources::{ParseOutcome, Source};
