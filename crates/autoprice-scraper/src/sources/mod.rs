//! The two external listing sites.
//!
//! Each site owns its vocabulary, URL grammar, page layout and aggregation
//! rule. [`Source`] dispatches to the per-site modules.

pub mod classifieds;
pub mod tabular;

mod text;

use autoprice_core::{
    ExternalListing, ListingCondition, SearchQuery, SourceId, SourcePriceAggregate,
};

use crate::error::ScraperError;

pub use classifieds::ClassifiedsSource;
pub use tabular::TabularSource;

/// Result of parsing one listing page.
///
/// A page without the expected structure, or with no usable rows, is
/// `Empty`; it is never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// At least one listing.
    Listings(Vec<ExternalListing>),
    Empty,
}

impl ParseOutcome {
    #[must_use]
    pub fn from_listings(listings: Vec<ExternalListing>) -> Self {
        if listings.is_empty() {
            ParseOutcome::Empty
        } else {
            ParseOutcome::Listings(listings)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, ParseOutcome::Empty)
    }

    #[must_use]
    pub fn into_listings(self) -> Vec<ExternalListing> {
        match self {
            ParseOutcome::Listings(listings) => listings,
            ParseOutcome::Empty => Vec::new(),
        }
    }
}

/// One listing site.
#[derive(Debug, Clone)]
pub enum Source {
    Classifieds(ClassifiedsSource),
    Tabular(TabularSource),
}

impl Source {
    #[must_use]
    pub fn id(&self) -> SourceId {
        match self {
            Source::Classifieds(_) => SourceId::Classifieds,
            Source::Tabular(_) => SourceId::Tabular,
        }
    }

    /// The first URL to fetch for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the configured base URL
    /// cannot be parsed.
    pub fn search_url(
        &self,
        query: &SearchQuery,
        condition: ListingCondition,
    ) -> Result<String, ScraperError> {
        match self {
            Source::Classifieds(src) => src.search_url(query),
            Source::Tabular(src) => src.search_url(query, condition, true),
        }
    }

    /// The URL to retry with when the first attempt parsed to nothing.
    ///
    /// Only the table source supports a fallback, and only when the query
    /// carries a year range: the retry drops the year filter.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the configured base URL
    /// cannot be parsed.
    pub fn fallback_url(
        &self,
        query: &SearchQuery,
        condition: ListingCondition,
    ) -> Result<Option<String>, ScraperError> {
        match self {
            Source::Classifieds(_) => Ok(None),
            Source::Tabular(_) if query.year_range().is_none() => Ok(None),
            Source::Tabular(src) => src.search_url(query, condition, false).map(Some),
        }
    }

    #[must_use]
    pub fn parse(&self, html: &str, condition: ListingCondition) -> ParseOutcome {
        match self {
            Source::Classifieds(_) => {
                classifieds::parse_listings(html, condition.excludes_near_new())
            }
            Source::Tabular(_) => tabular::parse_listings(html),
        }
    }

    /// Applies the site's aggregation rule.
    #[must_use]
    pub fn aggregate(&self, listings: Vec<ExternalListing>) -> SourcePriceAggregate {
        match self {
            Source::Classifieds(_) => {
                autoprice_core::aggregate_listings(SourceId::Classifieds, listings)
            }
            Source::Tabular(_) => autoprice_core::pool_listings(SourceId::Tabular, &listings),
        }
    }
}

/// Parses `base_url` and appends `path` segments to it.
pub(crate) fn join_base(base_url: &str, segments: &[&str]) -> Result<reqwest::Url, ScraperError> {
    let mut url = reqwest::Url::parse(base_url).map_err(|e| ScraperError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ScraperError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be a base".to_string(),
            })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_base_appends_segments() {
        let url = join_base("https://www.tabular.example/", &["ocasion", "seat-ibiza"]).unwrap();
        assert_eq!(url.as_str(), "https://www.tabular.example/ocasion/seat-ibiza");
    }

    #[test]
    fn join_base_keeps_existing_path_prefix() {
        let url = join_base("http://127.0.0.1:8080/es", &["search", ""]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/es/search/");
    }

    #[test]
    fn join_base_rejects_garbage() {
        assert!(matches!(
            join_base("not a url", &["x"]),
            Err(ScraperError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn parse_outcome_from_empty_vec_is_empty() {
        assert!(ParseOutcome::from_listings(Vec::new()).is_empty());
    }

    #[test]
    fn fallback_only_for_tabular_with_years() {
        let tabular = Source::Tabular(TabularSource::new("https://www.tabular.example"));
        let classifieds = Source::Classifieds(ClassifiedsSource::new(
            "https://www.classifieds.example",
            "es",
        ));
        let with_years =
            SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", [2021, 2022]).unwrap();
        let without_years =
            SearchQuery::new("Seat", "Ibiza", "gasolina", 110, "manual", []).unwrap();

        assert!(tabular
            .fallback_url(&with_years, ListingCondition::Used)
            .unwrap()
            .is_some());
        assert!(tabular
            .fallback_url(&without_years, ListingCondition::Used)
            .unwrap()
            .is_none());
        assert!(classifieds
            .fallback_url(&with_years, ListingCondition::Used)
            .unwrap()
            .is_none());
    }
}
