//! Species reference table
//!
//! Static physiological constants used by every scaling method. The table is
//! injected into the engine rather than hard-coded, so callers can supply
//! their own species (or synthetic ones in tests) through
//! [`SpeciesTable::from_json`] or [`SpeciesTable::insert`].
//!
//! | Field | Unit | Used by |
//! |-------|------|---------|
//! | `weight_kg` | kg | default body weight |
//! | `brain_weight_g` | g | brain-weight scaling |
//! | `life_span_years` | years | life-span scaling |
//! | `hepatic_flow` | mL/min/kg | hepatic-flow scaling |
//! | `hepatic_clearance` | mL/min/kg | hepatic-flow scaling |
//! | `renal_clearance` | mL/min/kg | informational |
//! | `body_surface_area_m2` | m² | BSA scaling |

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Physiological reference record for one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
    /// Display name
    pub name: String,
    /// Typical adult body weight (kg)
    pub weight_kg: f64,
    /// Brain weight (g)
    pub brain_weight_g: f64,
    /// Maximum life span (years)
    pub life_span_years: f64,
    /// Hepatic blood flow (mL/min/kg)
    pub hepatic_flow: f64,
    /// Hepatic clearance (mL/min/kg)
    pub hepatic_clearance: f64,
    /// Renal clearance (mL/min/kg), may be zero
    pub renal_clearance: f64,
    /// Body surface area (m²)
    pub body_surface_area_m2: f64,
}

impl Species {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        weight_kg: f64,
        brain_weight_g: f64,
        life_span_years: f64,
        hepatic_flow: f64,
        hepatic_clearance: f64,
        renal_clearance: f64,
        body_surface_area_m2: f64,
    ) -> Self {
        Self {
            name: name.into(),
            weight_kg,
            brain_weight_g,
            life_span_years,
            hepatic_flow,
            hepatic_clearance,
            renal_clearance,
            body_surface_area_m2,
        }
    }

    /// Ratio of hepatic clearance to hepatic blood flow (extraction proxy)
    pub fn hepatic_extraction(&self) -> f64 {
        self.hepatic_clearance / self.hepatic_flow
    }

    /// Check that every field is populated with an admissible value
    ///
    /// `renal_clearance` may be zero; every other constant must be strictly positive.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("weight_kg", self.weight_kg),
            ("brain_weight_g", self.brain_weight_g),
            ("life_span_years", self.life_span_years),
            ("hepatic_flow", self.hepatic_flow),
            ("hepatic_clearance", self.hepatic_clearance),
            ("body_surface_area_m2", self.body_surface_area_m2),
        ];
        for (field, value) in positive {
            self.require_positive(field, value)?;
        }
        if !(self.renal_clearance.is_finite() && self.renal_clearance >= 0.0) {
            return Err(DomainError::InvalidPhysiologicalParameter {
                species: self.name.clone(),
                field: "renal_clearance",
                value: self.renal_clearance,
            });
        }
        Ok(())
    }

    pub(crate) fn require_positive(&self, field: &'static str, value: f64) -> Result<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(DomainError::InvalidPhysiologicalParameter {
                species: self.name.clone(),
                field,
                value,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SpeciesEntry {
    key: String,
    #[serde(flatten)]
    species: Species,
}

/// Ordered collection of species keyed by identifier
///
/// Insertion order is preserved; it determines the order of exact species
/// points in chart output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesTable {
    entries: Vec<SpeciesEntry>,
}

lazy_static! {
    static ref DEFAULT_TABLE: SpeciesTable = SpeciesTable::builtin();
}

impl Default for SpeciesTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

impl SpeciesTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a table from a JSON array of `{ "key": ..., <species fields> }` objects
    ///
    /// Every species is validated; the first invalid record fails the whole table.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<SpeciesEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.key, entry.species)?;
        }
        Ok(table)
    }

    /// Serialize the table to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Insert or replace a species after validating it
    pub fn insert(&mut self, key: impl Into<String>, species: Species) -> Result<()> {
        species.validate()?;
        let key = key.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => existing.species = species,
            None => self.entries.push(SpeciesEntry { key, species }),
        }
        Ok(())
    }

    /// Look up a species by key
    pub fn get(&self, key: &str) -> Result<&Species> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.species)
            .ok_or_else(|| DomainError::UnknownSpecies(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Iterate `(key, species)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Species)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.species))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest and largest default body weight in the table
    pub fn weight_range(&self) -> Option<(f64, f64)> {
        self.entries.iter().map(|e| e.species.weight_kg).fold(None, |acc, w| match acc {
            None => Some((w, w)),
            Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
        })
    }

    fn builtin() -> Self {
        let rows = [
            ("mouse", Species::new("Mouse", 0.02, 0.4, 2.0, 131.0, 90.0, 15.0, 0.006)),
            ("rat", Species::new("Rat", 0.15, 2.0, 3.0, 85.0, 73.0, 12.0, 0.025)),
            ("hamster", Species::new("Hamster", 0.1, 1.0, 2.5, 90.0, 75.0, 12.0, 0.02)),
            ("guineaPig", Species::new("Guinea Pig", 1.0, 4.8, 6.0, 75.0, 55.0, 8.0, 0.09)),
            ("ferret", Species::new("Ferret", 1.2, 7.2, 7.0, 72.0, 52.0, 10.0, 0.11)),
            ("rabbit", Species::new("Rabbit", 2.0, 9.1, 9.0, 77.0, 65.0, 10.0, 0.17)),
            ("cat", Species::new("Cat", 4.0, 28.4, 15.0, 65.0, 48.0, 8.0, 0.25)),
            ("monkey", Species::new("Monkey", 5.0, 95.0, 25.0, 58.0, 42.0, 7.0, 0.33)),
            ("dog", Species::new("Dog", 20.0, 85.0, 13.0, 55.0, 38.0, 6.0, 0.74)),
            ("miniPig", Species::new("Mini Pig", 30.0, 125.0, 17.0, 45.0, 28.0, 4.0, 0.95)),
            ("sheep", Species::new("Sheep", 40.0, 130.0, 12.0, 47.0, 32.0, 5.0, 1.2)),
            ("human", Species::new("Human", 70.0, 1350.0, 80.0, 20.7, 15.0, 1.5, 1.9)),
            ("horse", Species::new("Horse", 500.0, 620.0, 28.0, 28.0, 18.0, 2.5, 6.3)),
            ("cow", Species::new("Cow", 600.0, 445.0, 18.0, 25.0, 15.0, 2.0, 6.7)),
        ];
        Self {
            entries: rows
                .into_iter()
                .map(|(key, species)| SpeciesEntry {
                    key: key.to_string(),
                    species,
                })
                .collect(),
        }
    }
}
