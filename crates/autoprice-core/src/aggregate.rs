//! Reduction of parsed listings into per-source price statistics.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::listing::{ExternalListing, SourceId, SourcePriceAggregate};

/// Count, minimum and arithmetic mean (2 dp) over every listing price.
///
/// Prices whose sum overflows yield an empty aggregate.
#[must_use]
pub fn aggregate_listings(source: SourceId, listings: Vec<ExternalListing>) -> SourcePriceAggregate {
    let Some(mean) = mean_price(&listings) else {
        return SourcePriceAggregate::empty(source);
    };
    let min_price = listings.iter().map(|l| l.price).min();
    let count = listings.len();

    SourcePriceAggregate {
        source,
        sample_size: count,
        count,
        min_price,
        mean_price: Some(mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        listings,
    }
}

/// Collapses every listing into one representative record priced at the
/// rounded mean.
///
/// The search already scoped results to the requested fuel, power bracket and
/// gearbox, so the rows are variants of the same configuration; callers see a
/// single pooled estimate instead of per-row prices.
#[must_use]
pub fn pool_listings(source: SourceId, listings: &[ExternalListing]) -> SourcePriceAggregate {
    let Some(mean) = mean_price(listings) else {
        return SourcePriceAggregate::empty(source);
    };
    let pooled_price = mean.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    let mut pooled = ExternalListing::new(
        source,
        pooled_price,
        format!(
            "Media de {} anuncios: {pooled_price} €",
            listings.len()
        ),
    );
    pooled.power = common_value(listings.iter().map(|l| l.power));
    pooled.motorization = common_value(listings.iter().map(|l| l.motorization.clone()));

    SourcePriceAggregate {
        source,
        listings: vec![pooled],
        count: 1,
        sample_size: listings.len(),
        min_price: Some(pooled_price),
        mean_price: Some(pooled_price),
    }
}

/// `None` for no listings, or when the total does not fit in a `Decimal`.
fn mean_price(listings: &[ExternalListing]) -> Option<Decimal> {
    if listings.is_empty() {
        return None;
    }
    let total = listings
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.price))?;
    total.checked_div(Decimal::from(listings.len()))
}

/// The value shared by every item, or `None` when they disagree.
fn common_value<T: PartialEq>(mut values: impl Iterator<Item = Option<T>>) -> Option<T> {
    let first = values.next()??;
    for v in values {
        if v.as_ref() != Some(&first) {
            return None;
        }
    }
    Some(first)
}
