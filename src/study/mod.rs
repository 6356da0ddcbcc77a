//! Study planning: arms, formulation and material requirements
//!
//! A [`StudyPlan`] holds a set of uniquely named [`StudyArm`]s plus a single
//! stock [`Formulation`]. [`compute_requirements`] turns them into per-arm
//! dose counts, product mass, administration volumes and serial dilution
//! tables.
//!
//! # Arm types
//!
//! | Type | Dose | Product | Admin volume |
//! |------|------|---------|--------------|
//! | Treatment | `dose_unit.to_mg(level, weight)` | `dose × doses × (1 + overage)` | `dose / stock` |
//! | Placebo | none (level forced to 0) | 0 | none |
//! | Comparator | `dose_unit.to_mg(level, weight)` | tracked separately | `dose / comparator concentration` |
//!
//! # Example
//!
//! ```rust
//! use dosescale::study::*;
//!
//! let arm = StudyArm::new("High dose", "mouse", 0.02)
//!     .with_dose(10.0, DoseUnit::MgPerKg)
//!     .with_duration(14.0, DurationUnit::Days)
//!     .with_frequency(Frequency::Weekly);
//!
//! let (formulation, options) = (Formulation::default(), StudyOptions::default());
//! let req = compute_requirements(&[arm], &formulation, &options).unwrap();
//! assert_eq!(req.total_doses, 20);
//! ```

mod calc;
mod plan;
mod types;


pub use calc::{
    arm_requirement, compute_requirements, simulate_dilutions, stock_concentration_mg_per_ml,
    total_doses, validate_dilution_factor,
};
pub use plan::{AdminRoute, StudyDesign, StudyPlan, StudyType};
pub use types::{
    ArmRequirement, ArmType, ComparatorDetails, ConcentrationUnit, DilutionResult, DilutionStep,
    DoseUnit, DurationUnit, Formulation, Frequency, MassUnit, Quantity, StudyArm, StudyOptions,
    StudyRequirements, Vehicle, DAYS_PER_MONTH, MAX_DILUTION_FACTOR,
};
