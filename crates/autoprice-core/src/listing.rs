use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies one external listing site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Source A: classifieds page with an embedded JSON document.
    Classifieds,
    /// Source B: listings rendered as a fixed-column results table.
    Tabular,
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceId::Classifieds => write!(f, "classifieds"),
            SourceId::Tabular => write!(f, "tabular"),
        }
    }
}

/// One normalized market listing. Prices are whole euros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalListing {
    pub source: SourceId,
    pub price: Decimal,
    pub power: Option<u32>,
    pub description: String,
    /// Engine-variant label taken from the description (Source B only).
    pub motorization: Option<String>,
    /// Zero-km flag as reported by the source (Source A only).
    pub near_new: Option<bool>,
    pub consumption: Option<String>,
    pub length_mm: Option<u32>,
    pub trunk_litres: Option<u32>,
}

impl ExternalListing {
    /// A listing carrying only the fields every source provides.
    #[must_use]
    pub fn new(source: SourceId, price: Decimal, description: impl Into<String>) -> Self {
        Self {
            source,
            price,
            power: None,
            description: description.into(),
            motorization: None,
            near_new: None,
            consumption: None,
            length_mm: None,
            trunk_litres: None,
        }
    }
}

/// Price statistics for one source and one query.
///
/// `min_price`/`mean_price` are `None` when nothing was found; an empty
/// aggregate never reports a zero price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePriceAggregate {
    pub source: SourceId,
    pub listings: Vec<ExternalListing>,
    /// Number of listings in `listings`.
    pub count: usize,
    /// Number of parsed listings behind the statistics. Differs from `count`
    /// when the source pools its rows into a single record.
    pub sample_size: usize,
    pub min_price: Option<Decimal>,
    pub mean_price: Option<Decimal>,
}

impl SourcePriceAggregate {
    #[must_use]
    pub fn empty(source: SourceId) -> Self {
        Self {
            source,
            listings: Vec::new(),
            count: 0,
            sample_size: 0,
            min_price: None,
            mean_price: None,
        }
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        self.count > 0 && self.min_price.is_some()
    }
}
