//! Reconciliation engine: per-trim source pipelines and paced batch runs.
//!
//! For one trim the two sources are searched concurrently; each pipeline is
//! build URL → fetch → parse → aggregate. Transport and parse failures are
//! contained inside the pipeline and surface only as a missing or empty
//! aggregate. Batches process trims strictly one after another with a fixed
//! pause in between.

use std::time::Duration;

use autoprice_core::{
    AppConfig, BatchSummary, ListingCondition, QueryError, ReconciliationResult, SearchQuery,
    SourcePriceAggregate, Trim,
};

use crate::client::MarketClient;
use crate::error::ScraperError;
use crate::rate_limit::Pacer;
use crate::sources::{ClassifiedsSource, ParseOutcome, Source, TabularSource};

/// Everything needed to build an [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub classifieds_base_url: String,
    pub classifieds_market: String,
    pub tabular_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub inter_trim_delay: Duration,
    pub condition: ListingCondition,
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            classifieds_base_url: config.classifieds_base_url.clone(),
            classifieds_market: config.classifieds_market.clone(),
            tabular_base_url: config.tabular_base_url.clone(),
            request_timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            inter_trim_delay: Duration::from_millis(config.inter_trim_delay_ms),
            condition: config.condition,
        }
    }
}

/// Aggregates from both sources for one query. `None` means the source could
/// not be reached or its URL could not be built.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub classifieds: Option<SourcePriceAggregate>,
    pub tabular: Option<SourcePriceAggregate>,
}

pub struct Engine {
    client: MarketClient,
    classifieds: Source,
    tabular: Source,
    pacer: Pacer,
    condition: ListingCondition,
}

impl Engine {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &EngineSettings) -> Result<Self, ScraperError> {
        let client = MarketClient::new(
            settings.request_timeout_secs,
            &settings.user_agent,
            &settings.accept_language,
        )?;
        Ok(Self {
            client,
            classifieds: Source::Classifieds(ClassifiedsSource::new(
                &settings.classifieds_base_url,
                &settings.classifieds_market,
            )),
            tabular: Source::Tabular(TabularSource::new(&settings.tabular_base_url)),
            pacer: Pacer::new(settings.inter_trim_delay),
            condition: settings.condition,
        })
    }

    #[must_use]
    pub fn condition(&self) -> ListingCondition {
        self.condition
    }

    /// The URLs the engine would fetch for `query`: Source A's search, Source
    /// B's first attempt, and Source B's fallback when one applies.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] for an unparseable base URL.
    pub fn planned_urls(&self, query: &SearchQuery) -> Result<Vec<String>, ScraperError> {
        let mut urls = vec![
            self.classifieds.search_url(query, self.condition)?,
            self.tabular.search_url(query, self.condition)?,
        ];
        if let Some(fallback) = self.tabular.fallback_url(query, self.condition)? {
            urls.push(fallback);
        }
        Ok(urls)
    }

    /// Searches both sources concurrently for `query`.
    pub async fn search(&self, query: &SearchQuery) -> MarketSnapshot {
        let (classifieds, tabular) = tokio::join!(
            self.run_source(&self.classifieds, query),
            self.run_source(&self.tabular, query),
        );
        MarketSnapshot {
            classifieds,
            tabular,
        }
    }

    /// Reconciles one trim. Never fails: incomplete trims and unreachable
    /// sources produce a `no_data` result.
    pub async fn reconcile_trim(&self, brand: &str, model: &str, trim: &Trim) -> ReconciliationResult {
        match self.try_reconcile_trim(brand, model, trim).await {
            Ok(result) => result,
            Err(e) => {
                tracing::info!(
                    brand,
                    model,
                    trim = %trim.name,
                    reason = %e,
                    "trim not searchable; recording no_data"
                );
                ReconciliationResult::no_data(trim.name.clone(), trim.price)
            }
        }
    }

    async fn try_reconcile_trim(
        &self,
        brand: &str,
        model: &str,
        trim: &Trim,
    ) -> Result<ReconciliationResult, QueryError> {
        let query = SearchQuery::for_trim(brand, model, trim)?;
        let snapshot = self.search(&query).await;
        let result = ReconciliationResult::from_aggregates(
            trim.name.clone(),
            trim.price,
            snapshot.classifieds,
            snapshot.tabular,
        );
        tracing::info!(
            brand,
            model,
            trim = %result.trim,
            accuracy = %result.accuracy,
            market_price = ?result.market_price,
            "trim reconciled"
        );
        Ok(result)
    }

    /// Reconciles every trim in order, pausing between consecutive trims.
    ///
    /// Trims lacking fuel, power or transmission are recorded as `no_data`
    /// without touching the network.
    pub async fn reconcile_batch(
        &self,
        brand: &str,
        model: &str,
        trims: &[Trim],
    ) -> (Vec<ReconciliationResult>, BatchSummary) {
        let mut results = Vec::with_capacity(trims.len());

        for (idx, trim) in trims.iter().enumerate() {
            if idx > 0 {
                self.pacer.pause().await;
            }

            let result = if trim.is_searchable() {
                self.reconcile_trim(brand, model, trim).await
            } else {
                tracing::info!(
                    brand,
                    model,
                    trim = %trim.name,
                    "skipping trim without fuel, power or transmission"
                );
                ReconciliationResult::no_data(trim.name.clone(), trim.price)
            };
            results.push(result);
        }

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            brand,
            model,
            total_trims = summary.total_trims,
            with_market_data = summary.with_market_data,
            accurate = summary.accurate,
            "batch reconciled"
        );
        (results, summary)
    }

    /// Runs one source's pipeline, including the year-range fallback.
    async fn run_source(&self, source: &Source, query: &SearchQuery) -> Option<SourcePriceAggregate> {
        let source_id = source.id();
        let outcome = match self.fetch_and_parse(source, query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    source = %source_id,
                    brand = query.brand(),
                    model = query.model(),
                    error = %e,
                    "source search failed"
                );
                return None;
            }
        };

        let listings = outcome.into_listings();
        tracing::debug!(
            source = %source_id,
            count = listings.len(),
            "parsed listings"
        );
        Some(source.aggregate(listings))
    }

    async fn fetch_and_parse(
        &self,
        source: &Source,
        query: &SearchQuery,
    ) -> Result<ParseOutcome, ScraperError> {
        let url = source.search_url(query, self.condition)?;
        let first = self.fetch_page(source, &url).await?;
        if !first.is_empty() {
            return Ok(first);
        }

        match source.fallback_url(query, self.condition)? {
            Some(fallback) => {
                tracing::debug!(
                    source = %source.id(),
                    url = %fallback,
                    "no listings with year range; retrying without it"
                );
                self.fetch_page(source, &fallback).await
            }
            None => Ok(first),
        }
    }

    async fn fetch_page(&self, source: &Source, url: &str) -> Result<ParseOutcome, ScraperError> {
        tracing::debug!(source = %source.id(), url, "fetching listing page");
        let html = self.client.fetch_html(url).await?;
        Ok(source.parse(&html, self.condition))
    }
}
