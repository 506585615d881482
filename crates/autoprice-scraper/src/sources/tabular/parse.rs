use scraper::{ElementRef, Html, Selector};

use autoprice_core::{ExternalListing, SourceId};

use crate::sources::text::{collapse_whitespace, digits_only, listing_price, parse_amount};
use crate::sources::ParseOutcome;

/// Fixed column order of the results table.
const COL_DESCRIPTION: usize = 0;
const COL_PRICE: usize = 1;
const COL_POWER: usize = 2;
const COL_CONSUMPTION: usize = 3;
const COL_LENGTH: usize = 4;
const COL_TRUNK: usize = 5;

/// Extracts one listing per row of the primary results table.
///
/// The table is `table.results`, or the first `<table>` when no table carries
/// that class. The first row is the header. Rows without a description, or
/// whose price is unreadable, zero or implausibly large, are dropped.
#[must_use]
pub fn parse_listings(html: &str) -> ParseOutcome {
    let document = Html::parse_document(html);

    let Some(table) = find_results_table(&document) else {
        tracing::debug!("no results table found");
        return ParseOutcome::Empty;
    };

    let Ok(row_sel) = Selector::parse("tr") else {
        return ParseOutcome::Empty;
    };
    let Ok(cell_sel) = Selector::parse("td, th") else {
        return ParseOutcome::Empty;
    };

    let listings = table
        .select(&row_sel)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            row_to_listing(&cells)
        })
        .collect();

    ParseOutcome::from_listings(listings)
}

fn find_results_table(document: &Html) -> Option<ElementRef<'_>> {
    let results = Selector::parse("table.results").ok()?;
    if let Some(table) = document.select(&results).next() {
        return Some(table);
    }
    let any_table = Selector::parse("table").ok()?;
    document.select(&any_table).next()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<Vec<_>>().join(" "))
}

fn row_to_listing(cells: &[String]) -> Option<ExternalListing> {
    let column = |idx: usize| cells.get(idx).map(String::as_str).filter(|s| !s.is_empty());

    let description = column(COL_DESCRIPTION)?;
    let price = parse_amount(column(COL_PRICE)?).and_then(listing_price)?;

    let mut listing = ExternalListing::new(SourceId::Tabular, price, description);
    listing.motorization = motorization(description);
    listing.power = column(COL_POWER).and_then(digits_u32);
    listing.consumption = column(COL_CONSUMPTION).map(str::to_owned);
    listing.length_mm = column(COL_LENGTH).and_then(digits_u32);
    listing.trunk_litres = column(COL_TRUNK).and_then(digits_u32);
    Some(listing)
}

fn digits_u32(text: &str) -> Option<u32> {
    digits_only(text).and_then(|v| u32::try_from(v).ok())
}

/// The engine label: description text before the first parenthesis.
///
/// `"1.0 TSI 110 CV (2021) Style"` → `"1.0 TSI 110 CV"`.
fn motorization(description: &str) -> Option<String> {
    let head = description
        .split_once('(')
        .map_or(description, |(before, _)| before)
        .trim();
    (!head.is_empty()).then(|| head.to_string())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const PAGE: &str = r#"
<html><body>
  <table class="filters"><tr><td>ignored</td></tr></table>
  <table class="results">
    <thead>
      <tr><th>Versión</th><th>Precio</th><th>Potencia</th><th>Consumo</th><th>Longitud</th><th>Maletero</th></tr>
    </thead>
    <tbody>
      <tr>
        <td><a href="/v/1">1.0 TSI 110 CV (2021) Style</a></td>
        <td>18.500 €</td><td>110 CV</td><td>5,3 l/100 km</td><td>4.059 mm</td><td>355 l</td>
      </tr>
      <tr>
        <td>1.0 TSI 110 CV FR</td>
        <td>19.990 €</td><td>110 CV</td><td></td><td></td><td></td>
      </tr>
      <tr><td>1.0 TSI 110 CV Xcellence</td><td>Consultar</td><td>110 CV</td></tr>
      <tr><td></td><td>17.000 €</td></tr>
      <tr><td>Only description</td></tr>
    </tbody>
  </table>
</body></html>"#;

    #[test]
    fn parses_rows_after_header() {
        let listings = parse_listings(PAGE).into_listings();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.source, SourceId::Tabular);
        assert_eq!(first.description, "1.0 TSI 110 CV (2021) Style");
        assert_eq!(first.price, Decimal::from(18_500));
        assert_eq!(first.power, Some(110));
        assert_eq!(first.consumption.as_deref(), Some("5,3 l/100 km"));
        assert_eq!(first.length_mm, Some(4_059));
        assert_eq!(first.trunk_litres, Some(355));
        assert_eq!(first.motorization.as_deref(), Some("1.0 TSI 110 CV"));
        assert_eq!(first.near_new, None);

        let second = &listings[1];
        assert_eq!(second.price, Decimal::from(19_990));
        assert_eq!(second.consumption, None);
        assert_eq!(second.length_mm, None);
        assert_eq!(second.motorization.as_deref(), Some("1.0 TSI 110 CV FR"));
    }

    #[test]
    fn falls_back_to_first_table_without_results_class() {
        let html = r"<table>
            <tr><th>Versión</th><th>Precio</th></tr>
            <tr><td>1.6 TDI (2019)</td><td>14.200 €</td></tr>
        </table>";
        let listings = parse_listings(html).into_listings();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Decimal::from(14_200));
        assert_eq!(listings[0].motorization.as_deref(), Some("1.6 TDI"));
    }

    #[test]
    fn zero_and_oversized_prices_are_dropped() {
        let html = r#"<table class="results">
            <tr><th>Versión</th><th>Precio</th></tr>
            <tr><td>free</td><td>0 €</td></tr>
            <tr><td>absurd</td><td>999.999.999.999 €</td></tr>
            <tr><td>1.0 TSI</td><td>16.000 €</td></tr>
        </table>"#;
        let listings = parse_listings(html).into_listings();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Decimal::from(16_000));
    }

    #[test]
    fn header_only_table_is_empty() {
        let html = r#"<table class="results"><tr><th>Versión</th><th>Precio</th></tr></table>"#;
        assert_eq!(parse_listings(html), ParseOutcome::Empty);
    }

    #[test]
    fn page_without_table_is_empty() {
        assert_eq!(
            parse_listings("<html><body><p>Sin resultados</p></body></html>"),
            ParseOutcome::Empty
        );
    }

    #[test]
    fn motorization_without_parenthesis_is_whole_description() {
        assert_eq!(motorization("1.5 TSI 150 CV").as_deref(), Some("1.5 TSI 150 CV"));
        assert_eq!(motorization("(2020) only year"), None);
    }
}
