//! Search inputs: the validated [`SearchQuery`] and the catalog [`Trim`] it is
//! built from.

use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections raised before any network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("power must be a positive integer, got \"{0}\"")]
    InvalidPower(String),

    #[error("unknown listing condition \"{0}\"; expected \"used\" or \"near-new\"")]
    InvalidCondition(String),
}

/// Which segment of the market a search targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingCondition {
    /// Ordinary second-hand units. Near-new units are excluded where the
    /// source flags them.
    #[default]
    Used,
    /// Zero-km / near-new units.
    NearNew,
}

impl ListingCondition {
    /// `true` when listings flagged as near-new must be dropped.
    #[must_use]
    pub fn excludes_near_new(self) -> bool {
        matches!(self, ListingCondition::Used)
    }
}

impl std::fmt::Display for ListingCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingCondition::Used => write!(f, "used"),
            ListingCondition::NearNew => write!(f, "near-new"),
        }
    }
}

impl FromStr for ListingCondition {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "used" => Ok(ListingCondition::Used),
            "near-new" | "near_new" | "km0" => Ok(ListingCondition::NearNew),
            other => Err(QueryError::InvalidCondition(other.to_string())),
        }
    }
}

/// One trim as supplied by the catalog layer. Every descriptive field is
/// optional because catalog rows are frequently incomplete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trim {
    pub name: String,
    #[serde(default)]
    pub fuel: Option<String>,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub transmission: Option<String>,
    /// Reference (catalog) price.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub years: Vec<u16>,
}

impl Trim {
    /// `true` when fuel, power and transmission are all present and non-blank,
    /// i.e. the trim can drive a market search.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.fuel) && self.power.is_some_and(|p| p > 0) && present(&self.transmission)
    }
}

/// Immutable description of one market search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    brand: String,
    model: String,
    fuel: String,
    power: u32,
    transmission: String,
    years: BTreeSet<u16>,
}

impl SearchQuery {
    /// Builds a query, rejecting blank fields and non-positive power.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingField`] for blank strings and
    /// [`QueryError::InvalidPower`] when `power` is zero.
    pub fn new(
        brand: &str,
        model: &str,
        fuel: &str,
        power: u32,
        transmission: &str,
        years: impl IntoIterator<Item = u16>,
    ) -> Result<Self, QueryError> {
        let required = |value: &str, field: &'static str| -> Result<String, QueryError> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(QueryError::MissingField(field))
            } else {
                Ok(trimmed.to_string())
            }
        };

        let brand = required(brand, "brand")?;
        let model = required(model, "model")?;
        let fuel = required(fuel, "fuel")?;
        let transmission = required(transmission, "transmission")?;
        if power == 0 {
            return Err(QueryError::InvalidPower(power.to_string()));
        }

        Ok(Self {
            brand,
            model,
            fuel,
            power,
            transmission,
            years: years.into_iter().collect(),
        })
    }

    /// Builds a query for one catalog trim.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingField`] when the trim lacks fuel, power or
    /// transmission, or when `brand`/`model` are blank.
    pub fn for_trim(brand: &str, model: &str, trim: &Trim) -> Result<Self, QueryError> {
        let fuel = trim.fuel.as_deref().ok_or(QueryError::MissingField("fuel"))?;
        let power = trim.power.ok_or(QueryError::MissingField("power"))?;
        let transmission = trim
            .transmission
            .as_deref()
            .ok_or(QueryError::MissingField("transmission"))?;
        Self::new(
            brand,
            model,
            fuel,
            power,
            transmission,
            trim.years.iter().copied(),
        )
    }

    #[must_use]
    pub fn brand(&self) -> &str {
        &self.brand
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn fuel(&self) -> &str {
        &self.fuel
    }

    #[must_use]
    pub fn power(&self) -> u32 {
        self.power
    }

    #[must_use]
    pub fn transmission(&self) -> &str {
        &self.transmission
    }

    #[must_use]
    pub fn years(&self) -> &BTreeSet<u16> {
        &self.years
    }

    /// `(min, max)` of the requested years, if any were supplied.
    #[must_use]
    pub fn year_range(&self) -> Option<(u16, u16)> {
        let first = self.years.first()?;
        let last = self.years.last()?;
        Some((*first, *last))
    }
}

/// Parses a user-supplied power value such as `"110"` or `"110 CV"`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidPower`] unless the text starts with a
/// positive integer.
pub fn parse_power(raw: &str) -> Result<u32, QueryError> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    match digits.parse::<u32>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(QueryError::InvalidPower(raw.to_string())),
    }
}
