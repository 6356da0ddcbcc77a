//! Kidney-function sub-model
//!
//! Cockcroft-Gault creatinine clearance as an eGFR estimate, and the mapping
//! from eGFR to a renal dose fraction.
//!
//! ```text
//! eGFR = (140 - age) * weight / (72 * Scr)      (* 0.85 if female)
//! ```
//!
//! | Stage | eGFR (mL/min) | Dose fraction |
//! |-------|---------------|---------------|
//! | G1 | ≥ 90 | 1.00 |
//! | G2 | [60, 90) | 1.00 |
//! | G3a | [45, 60) | 0.75 |
//! | G3b | [30, 45) | 0.75 |
//! | G4 | [15, 30) | 0.50 |
//! | G5 | < 15 | 0.25 |
//!
//! Every band is inclusive on its lower bound.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ensure_finite, DomainError, Result};

/// Age beyond which the Cockcroft-Gault numerator turns non-positive
const CG_AGE_CEILING: f64 = 140.0;
const CG_FEMALE_FACTOR: f64 = 0.85;

/// Biological sex, as used by Cockcroft-Gault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

/// Kidney function stage derived from eGFR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GfrStage {
    G1,
    G2,
    G3a,
    G3b,
    G4,
    G5,
}

impl GfrStage {
    /// Classify an eGFR value (mL/min)
    pub fn from_gfr(gfr: f64) -> Self {
        if gfr >= 90.0 {
            GfrStage::G1
        } else if gfr >= 60.0 {
            GfrStage::G2
        } else if gfr >= 45.0 {
            GfrStage::G3a
        } else if gfr >= 30.0 {
            GfrStage::G3b
        } else if gfr >= 15.0 {
            GfrStage::G4
        } else {
            GfrStage::G5
        }
    }

    /// Fraction of the unadjusted dose recommended for this stage
    pub fn dose_fraction(&self) -> f64 {
        match self {
            GfrStage::G1 | GfrStage::G2 => 1.0,
            GfrStage::G3a | GfrStage::G3b => 0.75,
            GfrStage::G4 => 0.5,
            GfrStage::G5 => 0.25,
        }
    }
}

impl fmt::Display for GfrStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GfrStage::G1 => "G1",
            GfrStage::G2 => "G2",
            GfrStage::G3a => "G3a",
            GfrStage::G3b => "G3b",
            GfrStage::G4 => "G4",
            GfrStage::G5 => "G5",
        };
        write!(f, "{s}")
    }
}

/// Estimate glomerular filtration rate (mL/min) with Cockcroft-Gault
///
/// # Errors
///
/// [`DomainError::InvalidInput`] when creatinine or weight is not positive, or
/// age is negative. An age of 140 or more is accepted and logged as suspicious;
/// the resulting eGFR is then zero or negative.
pub fn estimate_gfr(
    weight_kg: f64,
    age_years: f64,
    serum_creatinine: f64,
    sex: Sex,
) -> Result<f64> {
    let weight_kg = ensure_finite("weight_kg", weight_kg)?;
    let age_years = ensure_finite("age_years", age_years)?;
    let serum_creatinine = ensure_finite("serum_creatinine", serum_creatinine)?;

    if serum_creatinine <= 0.0 {
        return Err(DomainError::invalid_input(
            "serum_creatinine",
            format!("{serum_creatinine} mg/dL (must be > 0)"),
        ));
    }
    if weight_kg <= 0.0 {
        return Err(DomainError::invalid_input(
            "weight_kg",
            format!("{weight_kg} kg (must be > 0)"),
        ));
    }
    if age_years < 0.0 {
        return Err(DomainError::invalid_input(
            "age_years",
            format!("{age_years} years (must be >= 0)"),
        ));
    }
    if age_years >= CG_AGE_CEILING {
        tracing::warn!(
            age_years,
            "Cockcroft-Gault age at or above 140 years yields a non-positive eGFR"
        );
    }

    let mut gfr = ((CG_AGE_CEILING - age_years) * weight_kg) / (72.0 * serum_creatinine);
    if sex == Sex::Female {
        gfr *= CG_FEMALE_FACTOR;
    }
    Ok(gfr)
}

/// Map an eGFR (mL/min) to a renal dose fraction
pub fn gfr_to_dose_fraction(gfr: f64) -> f64 {
    GfrStage::from_gfr(gfr).dose_fraction()
}
