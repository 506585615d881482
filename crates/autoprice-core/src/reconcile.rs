//! Reference-price reconciliation.
//!
//! Everything here is pure: no I/O, no clocks. The classification depends only
//! on the reference price and the lowest observed market price.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::listing::SourcePriceAggregate;

/// Upper bound (exclusive, percent) for [`Accuracy::Exact`].
pub const EXACT_THRESHOLD_PCT: i64 = 5;
/// Upper bound (exclusive, percent) for [`Accuracy::Close`].
pub const CLOSE_THRESHOLD_PCT: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Exact,
    Close,
    Different,
    NoData,
}

impl Accuracy {
    /// Exact or close.
    #[must_use]
    pub fn is_accurate(self) -> bool {
        matches!(self, Accuracy::Exact | Accuracy::Close)
    }
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accuracy::Exact => write!(f, "exact"),
            Accuracy::Close => write!(f, "close"),
            Accuracy::Different => write!(f, "different"),
            Accuracy::NoData => write!(f, "no_data"),
        }
    }
}

/// Outcome of comparing one reference price with one market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceComparison {
    /// `reference - external`, present only when both prices are.
    pub difference: Option<Decimal>,
    /// Absolute difference relative to the reference, in percent (2 dp).
    pub percentage: Option<Decimal>,
    pub accuracy: Accuracy,
}

impl PriceComparison {
    const NO_DATA: PriceComparison = PriceComparison {
        difference: None,
        percentage: None,
        accuracy: Accuracy::NoData,
    };
}

/// Classifies an absolute percentage difference. Both bounds are strict: a
/// 5.00% gap is `close`, not `exact`.
#[must_use]
pub fn classify(percentage: Decimal) -> Accuracy {
    let pct = percentage.abs();
    if pct < Decimal::from(EXACT_THRESHOLD_PCT) {
        Accuracy::Exact
    } else if pct < Decimal::from(CLOSE_THRESHOLD_PCT) {
        Accuracy::Close
    } else {
        Accuracy::Different
    }
}

/// Compares `reference` with `external`.
///
/// Returns `no_data` when either price is missing, the reference is not
/// positive, or the gap does not fit in a `Decimal`.
#[must_use]
pub fn reconcile_prices(reference: Option<Decimal>, external: Option<Decimal>) -> PriceComparison {
    let (Some(reference), Some(external)) = (reference, external) else {
        return PriceComparison::NO_DATA;
    };
    if reference <= Decimal::ZERO {
        return PriceComparison::NO_DATA;
    }

    let Some(difference) = reference.checked_sub(external) else {
        return PriceComparison::NO_DATA;
    };
    let Some(percentage) = difference
        .abs()
        .checked_div(reference)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    else {
        return PriceComparison::NO_DATA;
    };

    PriceComparison {
        difference: Some(difference),
        percentage: Some(
            percentage.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        ),
        accuracy: classify(percentage),
    }
}

/// Reconciliation of one trim against both market sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub trim: String,
    pub reference_price: Option<Decimal>,
    /// Source A aggregate; `None` when the source could not be queried.
    pub classifieds: Option<SourcePriceAggregate>,
    /// Source B aggregate; `None` when the source could not be queried.
    pub tabular: Option<SourcePriceAggregate>,
    /// Lowest minimum price across sources with data.
    pub market_price: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub accuracy: Accuracy,
}

impl ReconciliationResult {
    /// A result for a trim that could not be searched at all.
    #[must_use]
    pub fn no_data(trim: impl Into<String>, reference_price: Option<Decimal>) -> Self {
        Self {
            trim: trim.into(),
            reference_price,
            classifieds: None,
            tabular: None,
            market_price: None,
            difference: None,
            percentage: None,
            accuracy: Accuracy::NoData,
        }
    }

    /// Reconciles `reference_price` against the lowest minimum of the given
    /// aggregates.
    #[must_use]
    pub fn from_aggregates(
        trim: impl Into<String>,
        reference_price: Option<Decimal>,
        classifieds: Option<SourcePriceAggregate>,
        tabular: Option<SourcePriceAggregate>,
    ) -> Self {
        let market_price = [classifieds.as_ref(), tabular.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|agg| agg.min_price)
            .min();
        let comparison = reconcile_prices(reference_price, market_price);

        Self {
            trim: trim.into(),
            reference_price,
            classifieds,
            tabular,
            market_price,
            difference: comparison.difference,
            percentage: comparison.percentage,
            accuracy: comparison.accuracy,
        }
    }

    /// `true` when at least one source produced listings.
    #[must_use]
    pub fn has_market_data(&self) -> bool {
        [self.classifieds.as_ref(), self.tabular.as_ref()]
            .into_iter()
            .flatten()
            .any(SourcePriceAggregate::has_data)
    }
}

/// Totals over one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_trims: usize,
    pub with_market_data: usize,
    pub accurate: usize,
}

impl BatchSummary {
    #[must_use]
    pub fn from_results(results: &[ReconciliationResult]) -> Self {
        Self {
            total_trims: results.len(),
            with_market_data: results.iter().filter(|r| r.has_market_data()).count(),
            accurate: results.iter().filter(|r| r.accuracy.is_accurate()).count(),
        }
    }
}
