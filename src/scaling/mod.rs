//! Interspecies dose scaling
//!
//! Estimates an equivalent dose in a target species from a dose known to be
//! effective in a source species, then layers pharmacokinetic adjustments.
//!
//! # Methods
//!
//! | Method | Base multiplier |
//! |--------|-----------------|
//! | Allometric | `w^b`, `b` from the request or from molecular weight |
//! | Brain weight | `w^b`, `b = (2/3) ln(Brain_t / Brain_s) / ln(w)` |
//! | Life span | `w^b`, `b = ln(LS_t / LS_s) / ln(w)` |
//! | Hepatic flow | `w^b`, `b = ln(Q_t E_t / Q_s E_s) / ln(w)` |
//! | BSA | `BSA_t / BSA_s` (no weight exponent) |
//!
//! where `w = target weight / source weight` and `E = hepatic clearance / hepatic flow`.
//!
//! # PK adjustments
//!
//! Applied in this fixed order to the running dose:
//!
//! 1. Protein binding: `× (100 - pct) / 100`
//! 2. Bioavailability: `÷ F / 100` (the administered dose must rise when absorption is incomplete)
//! 3. Kidney function: `× pct / 100`, or `×` the Cockcroft-Gault stage fraction
//! 4. Volume of distribution: `× Vd / target weight`
//! 5. Lipophilicity: `× (1 + 0.1 |LogP|)`
//!
//! # Usage
//!
//! ```rust
//! use dosescale::prelude::*;
//!
//! let table = SpeciesTable::default();
//! let pk = PkAdjustments::new()
//!     .with_protein_binding(20.0)
//!     .with_bioavailability(Bioavailability::Oral);
//! let request = ScalingRequest::new("rat", "dog", 5.0, ScalingMethod::Allometric).with_pk(pk);
//!
//! let result = scale(&table, &request).unwrap();
//! for line in result.derivation_steps() {
//!     println!("{line}");
//! }
//! ```

mod engine;
mod types;

#[cfg(test)]
mod tests;

pub(crate) use engine::scale_between;

pub use engine::{molecular_weight_exponent, scale};
pub use types::{
    Bioavailability, DerivationStep, KidneyFunction, Operator, PkAdjustments, ScalingMethod,
    ScalingRequest, ScalingResult, DEFAULT_ALLOMETRIC_EXPONENT,
};
