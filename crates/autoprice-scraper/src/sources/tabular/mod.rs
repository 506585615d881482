//! Source B: listings site that renders results as a fixed-column table.
//!
//! The path carries `{brand}-{model}-{fuel}`; power is filtered by marketing
//! bracket and the year range is optional. Rows are not pre-filtered by exact
//! motorization, so a page typically returns many near-identical variants.

mod parse;

use autoprice_core::{
    resolve_power_bracket, tabular_slug, FilterToken, ListingCondition, SearchQuery, Vocabulary,
};

use crate::error::ScraperError;

pub use parse::parse_listings;

#[derive(Debug, Clone)]
pub struct TabularSource {
    base_url: String,
}

impl TabularSource {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
        }
    }

    /// Builds the search URL for `query`.
    ///
    /// `with_years` appends `year_from`/`year_to` from the query's year range
    /// when it has one; the engine's fallback calls this again with `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the base URL cannot be parsed.
    pub fn search_url(
        &self,
        query: &SearchQuery,
        condition: ListingCondition,
        with_years: bool,
    ) -> Result<String, ScraperError> {
        let vocab = Vocabulary::TABULAR;
        let segment = match condition {
            ListingCondition::Used => "ocasion",
            ListingCondition::NearNew => "km0",
        };

        let slug = tabular_slug(query.brand(), query.model());
        let listing_path = match vocab.fuel(query.fuel()) {
            FilterToken::Value(fuel) => format!("{slug}-{fuel}"),
            FilterToken::Any => slug,
        };

        let bracket = resolve_power_bracket(query.power());
        let mut url = super::join_base(&self.base_url, &[segment, listing_path.as_str()])?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("power_from", &bracket.lower.to_string())
                .append_pair("power_to", &bracket.upper.to_string());
            if let FilterToken::Value(gearbox) = vocab.transmission(query.transmission()) {
                pairs.append_pair("gearbox", &gearbox);
            }
            if let Some((from, to)) = query.year_range().filter(|_| with_years) {
                pairs
                    .append_pair("year_from", &from.to_string())
                    .append_pair("year_to", &to.to_string());
            }
        }

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TabularSource {
        TabularSource::new("https://www.tabular.example")
    }

    fn query(years: &[u16]) -> SearchQuery {
        SearchQuery::new(
            "Seat",
            "Ibiza",
            "Gasolina",
            110,
            "Manual",
            years.iter().copied(),
        )
        .unwrap()
    }

    #[test]
    fn used_url_with_years() {
        let url = source()
            .search_url(&query(&[2022, 2019, 2021]), ListingCondition::Used, true)
            .unwrap();
        assert_eq!(
            url,
            "https://www.tabular.example/ocasion/seat-ibiza-gasolina?power_from=100&power_to=110&gearbox=manual&year_from=2019&year_to=2022"
        );
    }

    #[test]
    fn fallback_url_drops_years_only() {
        let url = source()
            .search_url(&query(&[2021]), ListingCondition::Used, false)
            .unwrap();
        assert_eq!(
            url,
            "https://www.tabular.example/ocasion/seat-ibiza-gasolina?power_from=100&power_to=110&gearbox=manual"
        );
    }

    #[test]
    fn near_new_uses_km0_path() {
        let url = source()
            .search_url(&query(&[]), ListingCondition::NearNew, true)
            .unwrap();
        assert!(url.starts_with("https://www.tabular.example/km0/seat-ibiza-gasolina?"));
    }

    #[test]
    fn slug_folds_diacritics_and_mixed_gearbox_is_unfiltered() {
        let q = SearchQuery::new(
            "Citroën",
            "C3 Aircross",
            "Diésel",
            120,
            "Manual/Automático",
            [],
        )
        .unwrap();
        let url = source().search_url(&q, ListingCondition::Used, true).unwrap();
        assert_eq!(
            url,
            "https://www.tabular.example/ocasion/citroen-c3-aircross-diesel?power_from=110&power_to=120"
        );
    }

    #[test]
    fn no_filter_fuel_leaves_bare_slug() {
        let q = SearchQuery::new("Seat", "Ibiza", "Gasolina/Diesel", 95, "Manual", []).unwrap();
        let url = source().search_url(&q, ListingCondition::Used, true).unwrap();
        assert!(url.starts_with("https://www.tabular.example/ocasion/seat-ibiza?power_from=90&power_to=100"));
    }
}
