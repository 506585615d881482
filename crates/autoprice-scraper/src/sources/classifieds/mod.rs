//! Source A: classifieds site whose results are embedded as a JSON document
//! in the page.
//!
//! Filters use repeated array-style keys (`fuel[]=...`). Power is matched on
//! a one-unit window `[power, power + 1]` rather than a marketing bracket,
//! and the site has no year filter.

mod parse;

use autoprice_core::{classifieds_make_model, FilterToken, SearchQuery, Vocabulary};

use crate::error::ScraperError;

pub use parse::parse_listings;

/// Result ordering requested from the site; cheapest first.
const ORDER: &str = "price-asc";

#[derive(Debug, Clone)]
pub struct ClassifiedsSource {
    base_url: String,
    market: String,
}

impl ClassifiedsSource {
    #[must_use]
    pub fn new(base_url: &str, market: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            market: market.to_owned(),
        }
    }

    /// Builds the search URL for `query`.
    ///
    /// Parameters, in order: market, ordering, `brand:model`, fuel (omitted
    /// for the no-filter sentinel), the two power bounds, and the gearbox
    /// only when it resolved to a concrete token.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the base URL cannot be parsed.
    pub fn search_url(&self, query: &SearchQuery) -> Result<String, ScraperError> {
        let vocab = Vocabulary::CLASSIFIEDS;
        let mut url = super::join_base(&self.base_url, &["search", ""])?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("markets[]", &self.market)
                .append_pair("order[]", ORDER)
                .append_pair(
                    "makeModel[]",
                    &classifieds_make_model(query.brand(), query.model()),
                );
            if let FilterToken::Value(fuel) = vocab.fuel(query.fuel()) {
                pairs.append_pair("fuel[]", &fuel);
            }
            pairs
                .append_pair("power[]", &query.power().to_string())
                .append_pair("power[]", &query.power().saturating_add(1).to_string());
            if let FilterToken::Value(gearbox) = vocab.transmission(query.transmission()) {
                pairs.append_pair("gearbox[]", &gearbox);
            }
        }

        Ok(url.to_string())
    }
}
