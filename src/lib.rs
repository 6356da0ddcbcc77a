//! Interspecies dose scaling and preclinical study planning
//!
//! Scale a known dose from one species to another by body weight, brain
//! weight, life span, hepatic blood flow or body surface area, adjust it for
//! pharmacokinetic properties, sweep it across body weights, and turn a set
//! of study arms into material and dilution requirements.

pub mod chart;
pub mod error;
pub mod export;
pub mod renal;
pub mod scaling;
pub mod species;
pub mod study;

pub use error::{DomainError, Result};

pub mod prelude {
    pub mod chart {
        pub use crate::chart::{generate_curve, write_curve_csv, ChartPoint, CurveOptions};
    }
    pub mod study {
        pub use crate::study::{
            compute_requirements, ArmRequirement, ArmType, ComparatorDetails, ConcentrationUnit,
            DilutionStep, DoseUnit, DurationUnit, Formulation, Frequency, StudyArm, StudyOptions,
            StudyPlan, StudyRequirements, Vehicle,
        };
    }
    pub mod export {
        pub use crate::export::{calculation_summary, DoseReport, StudyPlanReport};
    }

    pub use crate::error::{DomainError, Result};
    pub use crate::renal::{estimate_gfr, gfr_to_dose_fraction, GfrStage, Sex};
    pub use crate::scaling::{
        scale, Bioavailability, DerivationStep, KidneyFunction, PkAdjustments, ScalingMethod,
        ScalingRequest, ScalingResult,
    };
    pub use crate::species::{Species, SpeciesTable};
}
