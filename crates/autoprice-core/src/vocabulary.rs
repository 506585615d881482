//! Per-source filter vocabularies for fuel and gearbox labels.
//!
//! Catalog labels are Spanish free text ("Gasolina", "Automático", ...). Each
//! listing site expects its own token for the same concept, and some labels
//! deliberately map to "no filter" because they cover several values.

/// A resolved filter value for one search dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    /// Apply no filter for this dimension.
    Any,
    Value(String),
}

impl FilterToken {
    /// The token as it appears in a URL; empty for [`FilterToken::Any`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FilterToken::Any => "",
            FilterToken::Value(v) => v,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            FilterToken::Any => None,
            FilterToken::Value(v) => Some(v),
        }
    }
}

type Table = &'static [(&'static str, &'static str)];

/// Lookup tables for one source. An empty right-hand side means "no filter".
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    fuel: Table,
    transmission: Table,
}

const CLASSIFIEDS_FUEL: Table = &[
    ("gasolina", "petrol"),
    ("diesel", "diesel"),
    ("diésel", "diesel"),
    ("híbrido", "hybrid"),
    ("hibrido", "hybrid"),
    ("híbrido enchufable", "plug-in-hybrid"),
    ("hibrido enchufable", "plug-in-hybrid"),
    ("eléctrico", "electric"),
    ("electrico", "electric"),
    ("glp", "lpg"),
    ("gnc", "cng"),
    ("gasolina/diesel", ""),
];

const CLASSIFIEDS_TRANSMISSION: Table = &[
    ("manual", "manual"),
    ("automático", "automatic"),
    ("automatico", "automatic"),
    ("automática", "automatic"),
    ("automatica", "automatic"),
    ("cvt", "automatic"),
    ("manual/automático", ""),
    ("manual/automatico", ""),
];

const TABULAR_FUEL: Table = &[
    ("gasolina", "gasolina"),
    ("diesel", "diesel"),
    ("diésel", "diesel"),
    ("híbrido", "hibrido"),
    ("hibrido", "hibrido"),
    ("híbrido enchufable", "hibrido-enchufable"),
    ("hibrido enchufable", "hibrido-enchufable"),
    ("eléctrico", "electrico"),
    ("electrico", "electrico"),
    ("glp", "glp"),
    ("gnc", "gnc"),
    ("gasolina/diesel", ""),
];

const TABULAR_TRANSMISSION: Table = &[
    ("manual", "manual"),
    ("automático", "automatico"),
    ("automatico", "automatico"),
    ("automática", "automatico"),
    ("automatica", "automatico"),
    ("cvt", "automatico"),
    ("manual/automático", ""),
    ("manual/automatico", ""),
];

impl Vocabulary {
    /// Source A (embedded-JSON classifieds).
    pub const CLASSIFIEDS: Vocabulary = Vocabulary {
        fuel: CLASSIFIEDS_FUEL,
        transmission: CLASSIFIEDS_TRANSMISSION,
    };

    /// Source B (results-table listings).
    pub const TABULAR: Vocabulary = Vocabulary {
        fuel: TABULAR_FUEL,
        transmission: TABULAR_TRANSMISSION,
    };

    #[must_use]
    pub fn fuel(&self, raw: &str) -> FilterToken {
        lookup(self.fuel, raw)
    }

    #[must_use]
    pub fn transmission(&self, raw: &str) -> FilterToken {
        lookup(self.transmission, raw)
    }
}

/// Unknown labels fall through lower-cased so an unmapped catalog value still
/// produces a best-effort filter instead of aborting the search.
fn lookup(table: Table, raw: &str) -> FilterToken {
    let key = raw.trim().to_lowercase();
    match table.iter().find(|(label, _)| *label == key) {
        Some((_, "")) => FilterToken::Any,
        Some((_, token)) => FilterToken::Value((*token).to_string()),
        None if key.is_empty() => FilterToken::Any,
        None => FilterToken::Value(key),
    }
}
