//! Catalog export: the brand → model → trim records whose reference prices
//! are reconciled against the market.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::query::Trim;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub trims: Vec<Trim>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandEntry {
    pub name: String,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub brands: Vec<BrandEntry>,
}

impl Catalog {
    /// Looks up a model by brand and model name, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn find_model(&self, brand: &str, model: &str) -> Option<(&BrandEntry, &ModelEntry)> {
        let brand_key = brand.trim().to_lowercase();
        let model_key = model.trim().to_lowercase();
        let brand = self
            .brands
            .iter()
            .find(|b| b.name.to_lowercase() == brand_key)?;
        let model = brand
            .models
            .iter()
            .find(|m| m.name.to_lowercase() == model_key)?;
        Some((brand, model))
    }

    /// Parses and validates a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is malformed or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog = serde_yaml::from_str(content)?;
        validate_catalog(&catalog)?;
        Ok(catalog)
    }
}

/// Load and validate the catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    Catalog::from_yaml(&content)
}

fn validate_catalog(catalog: &Catalog) -> Result<(), ConfigError> {
    let mut seen_brands = HashSet::new();

    for brand in &catalog.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }
        if !seen_brands.insert(brand.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        let mut seen_models = HashSet::new();
        for model in &brand.models {
            if model.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has a model with an empty name",
                    brand.name
                )));
            }
            if !seen_models.insert(model.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate model '{}' for brand '{}'",
                    model.name, brand.name
                )));
            }
            validate_trims(&brand.name, model)?;
        }
    }

    Ok(())
}

fn validate_trims(brand: &str, model: &ModelEntry) -> Result<(), ConfigError> {
    let mut seen_trims = HashSet::new();

    for trim in &model.trims {
        if trim.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{brand} {} has a trim with an empty name",
                model.name
            )));
        }
        if !seen_trims.insert(trim.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate trim '{}' for {brand} {}",
                trim.name, model.name
            )));
        }
        if trim.price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(ConfigError::Validation(format!(
                "trim '{}' of {brand} {} has a non-positive price",
                trim.name, model.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
