//! Dose scaling engine
//!
//! Base scaling followed by the PK adjustment chain. Each transformation is
//! recorded as a [`DerivationStep`], in application order.

use crate::error::{ensure_finite, DomainError, Result};
use crate::renal::{estimate_gfr, GfrStage};
use crate::species::{Species, SpeciesTable};

use super::types::{
    Bioavailability, DerivationStep, KidneyFunction, Operator, PkAdjustments, ScalingMethod,
    ScalingRequest, ScalingResult,
};

/// Below this |ln(weight ratio)| the log-ratio exponent is a 0/0 form
const LOG_RATIO_EPS: f64 = 1e-12;

/// Brain-weight scaling uses the 2/3 power of the brain-weight ratio
const BRAIN_WEIGHT_POWER: f64 = 2.0 / 3.0;

/// Lipophilicity factor per unit |LogP|
const LOG_P_COEFFICIENT: f64 = 0.1;

/// Scale a dose from one species to another
///
/// Pure function of the request and the species table.
///
/// # Errors
///
/// - [`DomainError::UnknownSpecies`] when either species key is missing
/// - [`DomainError::InvalidWeight`] when a resolved weight is not positive
/// - [`DomainError::InvalidDose`] when the base dose is not positive
/// - [`DomainError::InvalidPhysiologicalParameter`] when a constant the method needs is not positive
/// - [`DomainError::InvalidInput`] when a PK adjustment is out of range
///
/// # Example
///
/// ```rust
/// use dosescale::prelude::*;
///
/// let table = SpeciesTable::default();
/// let request = ScalingRequest::new("mouse", "human", 10.0, ScalingMethod::Allometric);
/// let result = scale(&table, &request).unwrap();
/// assert!((result.dose_mg - 4550.415).abs() < 1e-3);
/// ```
pub fn scale(table: &SpeciesTable, request: &ScalingRequest) -> Result<ScalingResult> {
    let source = table.get(&request.source_species)?;
    let target = table.get(&request.target_species)?;
    let source_weight = request.source_weight.unwrap_or(source.weight_kg);
    let target_weight = request.target_weight.unwrap_or(target.weight_kg);
    scale_between(source, source_weight, target, target_weight, request)
}

/// Scale between two resolved species at explicit weights
///
/// The species keys in `request` are ignored; everything else is honoured.
pub(crate) fn scale_between(
    source: &Species,
    source_weight: f64,
    target: &Species,
    target_weight: f64,
    request: &ScalingRequest,
) -> Result<ScalingResult> {
    let source_weight = validate_weight("source", source_weight)?;
    let target_weight = validate_weight("target", target_weight)?;
    if !(request.base_dose_mg.is_finite() && request.base_dose_mg > 0.0) {
        return Err(DomainError::InvalidDose(request.base_dose_mg));
    }
    validate_pk(&request.pk)?;

    let weight_ratio = target_weight / source_weight;
    let base = base_scaling(source, target, weight_ratio, request)?;

    let mut dose = request.base_dose_mg * base.multiplier;
    let mut steps = vec![DerivationStep {
        label: "Base scaling".to_string(),
        params: base.params,
        operator: Operator::Multiply,
        factor: base.multiplier,
        running_dose_mg: dose,
    }];
    let scaled_dose_mg = dose;

    let mut push = |label: &str, params: String, operator: Operator, factor: f64| {
        dose = operator.apply(dose, factor);
        steps.push(DerivationStep {
            label: label.to_string(),
            params,
            operator,
            factor,
            running_dose_mg: dose,
        });
    };

    let pk = &request.pk;

    if pk.protein_binding_pct > 0.0 {
        let factor = (100.0 - pk.protein_binding_pct) / 100.0;
        push(
            "Protein binding",
            format!("{}%", pk.protein_binding_pct),
            Operator::Multiply,
            factor,
        );
    }

    // Incomplete absorption means more must be administered, hence the division
    let bioavailability = pk.bioavailability.percent();
    if bioavailability < 100.0 {
        push(
            "Bioavailability",
            format!("{} {}%", pk.bioavailability.label(), bioavailability),
            Operator::Divide,
            bioavailability / 100.0,
        );
    }

    match pk.kidney_function {
        KidneyFunction::None => {}
        KidneyFunction::Manual(pct) => {
            push(
                "Kidney function",
                format!("{pct}%"),
                Operator::Multiply,
                pct / 100.0,
            );
        }
        KidneyFunction::CockcroftGault {
            age_years,
            serum_creatinine,
            sex,
        } => {
            let gfr = estimate_gfr(target_weight, age_years, serum_creatinine, sex)?;
            let stage = GfrStage::from_gfr(gfr);
            push(
                "Kidney function",
                format!("Cockcroft-Gault eGFR {gfr:.1} mL/min, stage {stage}"),
                Operator::Multiply,
                stage.dose_fraction(),
            );
        }
    }

    if pk.volume_of_distribution > 0.0 {
        push(
            "Volume distribution",
            format!("{} L/kg", pk.volume_of_distribution),
            Operator::Multiply,
            pk.volume_of_distribution / target_weight,
        );
    }

    if pk.log_p != 0.0 {
        push(
            "Lipophilicity",
            format!("LogP {}", pk.log_p),
            Operator::Multiply,
            1.0 + LOG_P_COEFFICIENT * pk.log_p.abs(),
        );
    }

    Ok(ScalingResult {
        dose_mg: dose,
        base_dose_mg: request.base_dose_mg,
        scaled_dose_mg,
        source_weight_kg: source_weight,
        target_weight_kg: target_weight,
        weight_ratio,
        scaling_factor: base.scaling_factor,
        method: request.method,
        method_description: base.description,
        steps,
    })
}

/// Exponent for the allometric method when a molecular weight is given
///
/// Step function, not continuous: `> 700 → 0.70`, `(400, 700] → 0.75`, `≤ 400 → 0.80`.
pub fn molecular_weight_exponent(molecular_weight: f64) -> f64 {
    if molecular_weight > 700.0 {
        0.70
    } else if molecular_weight > 400.0 {
        0.75
    } else {
        0.80
    }
}

struct BaseScaling {
    scaling_factor: f64,
    multiplier: f64,
    description: String,
    params: String,
}

fn base_scaling(
    source: &Species,
    target: &Species,
    weight_ratio: f64,
    request: &ScalingRequest,
) -> Result<BaseScaling> {
    match request.method {
        ScalingMethod::Allometric => {
            let mw = request.pk.molecular_weight;
            let (exponent, description) = if mw > 0.0 {
                let exponent = molecular_weight_exponent(mw);
                (
                    exponent,
                    format!("Allometric scaling with MW adjustment ({mw} g/mol → {exponent})"),
                )
            } else {
                let exponent = ensure_finite("scaling_exponent", request.scaling_exponent)?;
                (exponent, format!("Allometric scaling ({exponent})"))
            };
            Ok(power_law(weight_ratio, exponent, description))
        }
        ScalingMethod::BrainWeight => {
            let ratio = target.require_positive("brain_weight_g", target.brain_weight_g)?
                / source.require_positive("brain_weight_g", source.brain_weight_g)?;
            Ok(log_ratio(
                weight_ratio,
                ratio,
                BRAIN_WEIGHT_POWER,
                "Brain weight scaling",
            ))
        }
        ScalingMethod::LifeSpan => {
            let ratio = target.require_positive("life_span_years", target.life_span_years)?
                / source.require_positive("life_span_years", source.life_span_years)?;
            Ok(log_ratio(weight_ratio, ratio, 1.0, "Life-span scaling"))
        }
        ScalingMethod::HepaticFlow => {
            let target_flow = target.require_positive("hepatic_flow", target.hepatic_flow)?;
            let source_flow = source.require_positive("hepatic_flow", source.hepatic_flow)?;
            target.require_positive("hepatic_clearance", target.hepatic_clearance)?;
            source.require_positive("hepatic_clearance", source.hepatic_clearance)?;
            let ratio = (target_flow * target.hepatic_extraction())
                / (source_flow * source.hepatic_extraction());
            Ok(log_ratio(weight_ratio, ratio, 1.0, "Hepatic blood flow scaling"))
        }
        // Simple ratio, the weight ratio plays no part
        ScalingMethod::Bsa => {
            let target_bsa =
                target.require_positive("body_surface_area_m2", target.body_surface_area_m2)?;
            let source_bsa =
                source.require_positive("body_surface_area_m2", source.body_surface_area_m2)?;
            let ratio = target_bsa / source_bsa;
            Ok(BaseScaling {
                scaling_factor: ratio,
                multiplier: ratio,
                description: "Body surface area scaling".to_string(),
                params: format!("BSA {target_bsa} m² / {source_bsa} m²"),
            })
        }
    }
}

fn power_law(weight_ratio: f64, exponent: f64, description: String) -> BaseScaling {
    BaseScaling {
        scaling_factor: exponent,
        multiplier: weight_ratio.powf(exponent),
        description,
        params: format!("{weight_ratio:.4}^{exponent:.4}"),
    }
}

/// Exponent `power * ln(ratio) / ln(weight_ratio)`
///
/// At equal weights the exponent is 0/0. Since `w^(k ln R / ln w) = R^k` for
/// every other `w`, the multiplier `R^k` is applied directly there.
fn log_ratio(weight_ratio: f64, ratio: f64, power: f64, label: &str) -> BaseScaling {
    let ln_weight_ratio = weight_ratio.ln();
    if ln_weight_ratio.abs() < LOG_RATIO_EPS {
        let multiplier = ratio.powf(power);
        tracing::debug!(
            method = label,
            ratio,
            multiplier,
            "weight ratio is 1, applying physiological ratio directly"
        );
        return BaseScaling {
            scaling_factor: multiplier,
            multiplier,
            description: format!("{label} (equal weights: direct ratio)"),
            params: format!("ratio {ratio:.4}^{power:.4}"),
        };
    }
    let exponent = power * ratio.ln() / ln_weight_ratio;
    power_law(weight_ratio, exponent, label.to_string())
}

fn validate_weight(role: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DomainError::InvalidWeight { role, value })
    }
}

fn validate_pk(pk: &PkAdjustments) -> Result<()> {
    let binding = ensure_finite("protein_binding_pct", pk.protein_binding_pct)?;
    if !(0.0..=100.0).contains(&binding) {
        return Err(DomainError::invalid_input(
            "protein_binding_pct",
            format!("{binding}% (must be within [0, 100])"),
        ));
    }

    if let Bioavailability::Manual(pct) = pk.bioavailability {
        let pct = ensure_finite("bioavailability_pct", pct)?;
        if pct <= 0.0 || pct > 100.0 {
            return Err(DomainError::invalid_input(
                "bioavailability_pct",
                format!("{pct}% (must be within (0, 100])"),
            ));
        }
    }

    if let KidneyFunction::Manual(pct) = pk.kidney_function {
        let pct = ensure_finite("kidney_function_pct", pct)?;
        if !(0.0..=100.0).contains(&pct) {
            return Err(DomainError::invalid_input(
                "kidney_function_pct",
                format!("{pct}% (must be within [0, 100])"),
            ));
        }
    }

    let vd = ensure_finite("volume_of_distribution", pk.volume_of_distribution)?;
    if vd < 0.0 {
        return Err(DomainError::invalid_input(
            "volume_of_distribution",
            format!("{vd} L/kg (must be >= 0)"),
        ));
    }

    let mw = ensure_finite("molecular_weight", pk.molecular_weight)?;
    if mw < 0.0 {
        return Err(DomainError::invalid_input(
            "molecular_weight",
            format!("{mw} g/mol (must be >= 0)"),
        ));
    }

    ensure_finite("log_p", pk.log_p)?;
    Ok(())
}
