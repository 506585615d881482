use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use autoprice_core::{ExternalListing, SourceId};

use crate::sources::text::{collapse_whitespace, digits_only, listing_price, parse_amount};
use crate::sources::ParseOutcome;

static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*\bid\s*=\s*["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

const CLASSIFIED_LIST_POINTER: &str = "/props/pageProps/classifieds/classifiedList";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassified {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<RawPrice>,
    #[serde(default)]
    hp: Option<Value>,
    #[serde(default)]
    is_zero_km: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    #[serde(default)]
    amount: Option<Value>,
}

/// Extracts listings from the page's embedded `__NEXT_DATA__` document.
///
/// A missing or malformed block yields [`ParseOutcome::Empty`]. With
/// `exclude_near_new`, entries flagged as zero-km are skipped. Entries
/// without a positive numeric price are skipped.
#[must_use]
pub fn parse_listings(html: &str, exclude_near_new: bool) -> ParseOutcome {
    let Some(document) = extract_next_data(html) else {
        tracing::debug!("no embedded __NEXT_DATA__ block found");
        return ParseOutcome::Empty;
    };

    let Some(entries) = document
        .pointer(CLASSIFIED_LIST_POINTER)
        .and_then(Value::as_array)
    else {
        tracing::debug!("__NEXT_DATA__ has no classifiedList array");
        return ParseOutcome::Empty;
    };

    let listings = entries
        .iter()
        .filter_map(|entry| {
            let raw = RawClassified::deserialize(entry).ok()?;
            to_listing(raw, exclude_near_new)
        })
        .collect();

    ParseOutcome::from_listings(listings)
}

fn extract_next_data(html: &str) -> Option<Value> {
    let json_text = NEXT_DATA_RE.captures(html)?.get(1)?.as_str();
    match serde_json::from_str(json_text.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "__NEXT_DATA__ block is not valid JSON");
            None
        }
    }
}

fn to_listing(raw: RawClassified, exclude_near_new: bool) -> Option<ExternalListing> {
    if exclude_near_new && raw.is_zero_km == Some(true) {
        return None;
    }

    let price = raw.price.and_then(|p| p.amount).and_then(|v| decimal_amount(&v))?;

    let mut listing = ExternalListing::new(
        SourceId::Classifieds,
        price,
        raw.title.as_deref().map(collapse_whitespace).unwrap_or_default(),
    );
    listing.power = raw.hp.as_ref().and_then(numeric_u32);
    listing.near_new = Some(raw.is_zero_km.unwrap_or(false));
    Some(listing)
}

/// Accepts JSON numbers and numeric strings; returns whole currency units
/// within the plausible listing range.
fn decimal_amount(value: &Value) -> Option<Decimal> {
    let amount = match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))?,
        Value::String(s) => parse_amount(s)?,
        _ => return None,
    };
    listing_price(amount)
}

fn numeric_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => digits_only(s).and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}
