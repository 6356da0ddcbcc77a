//! Requirement calculations for study arms
//!
//! Everything here is recomputed from scratch on every call; nothing is
//! patched incrementally.

use crate::error::{ensure_finite, DomainError, Result};

use super::types::{
    ArmRequirement, ArmType, DilutionResult, DilutionStep, Formulation, Quantity, StudyArm,
    StudyOptions, StudyRequirements,
};

/// Slack under which a dose count is not bumped to the next integer
///
/// `14 days * (1/7) * 10` is 20.000000000000004 in binary floating point.
const DOSE_COUNT_TOLERANCE: f64 = 1e-9;

/// Total doses for an arm: `ceil(days * doses_per_day * subjects)`
pub fn total_doses(arm: &StudyArm) -> Result<u64> {
    let days = ensure_finite("duration_value", arm.total_days())?;
    if days < 0.0 {
        return Err(DomainError::invalid_input(
            "duration_value",
            format!("{} {} (must be >= 0)", arm.duration_value, arm.duration_unit),
        ));
    }
    let raw = days * arm.frequency.doses_per_day()? * f64::from(arm.subject_count);
    if !raw.is_finite() || raw > u64::MAX as f64 {
        return Err(DomainError::invalid_input(
            "total_doses",
            format!("{raw} doses for arm '{}' is not a representable count", arm.name),
        ));
    }
    Ok((raw - DOSE_COUNT_TOLERANCE).ceil().max(0.0) as u64)
}

/// Simulate a serial dilution
///
/// Each step adds `volume * (factor - 1)` of vehicle and divides the
/// concentration by `factor`. Steps depend on the previous step's output, so
/// they are applied strictly in order.
pub fn simulate_dilutions(
    start_volume_ml: f64,
    start_concentration: f64,
    steps: &[DilutionStep],
    max_factor: f64,
) -> Result<Vec<DilutionResult>> {
    let mut volume = start_volume_ml;
    let mut concentration = start_concentration;
    let mut results = Vec::with_capacity(steps.len());

    for step in steps {
        validate_dilution_factor(step.factor, max_factor)?;
        let added = volume * (step.factor - 1.0);
        concentration /= step.factor;
        let start = volume;
        volume += added;
        results.push(DilutionResult {
            start_volume_ml: start,
            added_volume_ml: added,
            vehicle: step.vehicle.clone(),
            final_volume_ml: volume,
            final_concentration_mg_per_ml: concentration,
        });
    }
    Ok(results)
}

/// Check a dilution factor against `[1, max_factor]`
pub fn validate_dilution_factor(factor: f64, max_factor: f64) -> Result<f64> {
    if factor.is_finite() && (1.0..=max_factor).contains(&factor) {
        Ok(factor)
    } else {
        Err(DomainError::InvalidDilutionFactor {
            factor,
            max: max_factor,
        })
    }
}

/// Compute the requirement for a single arm
pub fn arm_requirement(
    arm: &StudyArm,
    formulation: &Formulation,
    options: &StudyOptions,
) -> Result<ArmRequirement> {
    validate_arm(arm)?;
    let total_doses = total_doses(arm)?;
    let overage = formulation.overage_multiplier();

    let requirement = match &arm.arm_type {
        ArmType::Placebo => ArmRequirement {
            name: arm.name.clone(),
            arm_type: arm.arm_type.clone(),
            subjects: arm.subject_count,
            dose_per_subject_mg: None,
            total_doses,
            product_required_mg: 0.0,
            admin_volume_ml: None,
            dilution_steps: Vec::new(),
        },
        ArmType::Comparator(details) => {
            let concentration = positive_concentration(
                "comparator_concentration",
                details
                    .concentration_unit
                    .to_mg_per_ml(details.concentration, options.density_factor),
            )?;
            let dose_mg = arm.dose_per_subject_mg();
            ArmRequirement {
                name: arm.name.clone(),
                arm_type: arm.arm_type.clone(),
                subjects: arm.subject_count,
                dose_per_subject_mg: Some(dose_mg),
                total_doses,
                product_required_mg: dose_mg * total_doses as f64 * overage,
                admin_volume_ml: Some(dose_mg / concentration),
                dilution_steps: Vec::new(),
            }
        }
        ArmType::Treatment => {
            let stock = stock_concentration_mg_per_ml(formulation, options)?;
            let dose_mg = arm.dose_per_subject_mg();
            let product_mg = dose_mg * total_doses as f64;
            // Overage is applied once, to both the mass and the starting volume
            let start_volume = product_mg / stock * overage;
            let dilution_steps = simulate_dilutions(
                start_volume,
                stock,
                &formulation.dilutions,
                options.max_dilution_factor,
            )?;
            ArmRequirement {
                name: arm.name.clone(),
                arm_type: arm.arm_type.clone(),
                subjects: arm.subject_count,
                dose_per_subject_mg: Some(dose_mg),
                total_doses,
                product_required_mg: product_mg * overage,
                admin_volume_ml: Some(dose_mg / stock),
                dilution_steps,
            }
        }
    };

    tracing::trace!(
        arm = %requirement.name,
        total_doses = requirement.total_doses,
        product_required_mg = requirement.product_required_mg,
        "computed arm requirement"
    );
    Ok(requirement)
}

/// Compute requirements for every arm and the study totals
///
/// Only treatment arms contribute to `total_product_required_mg`; comparator
/// product is summed into `comparator_required_mg` and placebo contributes nothing.
///
/// # Errors
///
/// - [`DomainError::DuplicateArm`] when two arms share a name
/// - [`DomainError::InvalidDilutionFactor`] when a dilution factor is outside `[1, max]`
/// - [`DomainError::InvalidInput`] / [`DomainError::InvalidWeight`] for malformed arms or
///   formulation, or when a dose count overflows
pub fn compute_requirements(
    arms: &[StudyArm],
    formulation: &Formulation,
    options: &StudyOptions,
) -> Result<StudyRequirements> {
    for (i, arm) in arms.iter().enumerate() {
        if arms[..i].iter().any(|other| other.name == arm.name) {
            return Err(DomainError::DuplicateArm(arm.name.clone()));
        }
    }
    let overage = ensure_finite("overage_pct", formulation.overage_pct)?;
    if overage < 0.0 {
        return Err(DomainError::invalid_input(
            "overage_pct",
            format!("{overage}% (must be >= 0)"),
        ));
    }
    for step in &formulation.dilutions {
        validate_dilution_factor(step.factor, options.max_dilution_factor)?;
    }

    let requirements = arms
        .iter()
        .map(|arm| arm_requirement(arm, formulation, options))
        .collect::<Result<Vec<_>>>()?;

    let mut total_product_required_mg = 0.0;
    let mut comparator_required_mg = 0.0;
    let mut total_doses = 0u64;
    for req in &requirements {
        match req.arm_type {
            ArmType::Treatment => total_product_required_mg += req.product_required_mg,
            ArmType::Comparator(_) => comparator_required_mg += req.product_required_mg,
            ArmType::Placebo => {}
        }
        total_doses = total_doses
            .checked_add(req.total_doses)
            .ok_or_else(|| DomainError::invalid_input("total_doses", "dose count overflows"))?;
    }

    Ok(StudyRequirements {
        arms: requirements,
        total_product_required_mg,
        total_product: Quantity::from_mg(total_product_required_mg, options.gram_threshold_mg),
        comparator_required_mg,
        total_doses,
    })
}

/// Stock concentration converted to mg/mL
pub fn stock_concentration_mg_per_ml(
    formulation: &Formulation,
    options: &StudyOptions,
) -> Result<f64> {
    positive_concentration(
        "stock_concentration",
        formulation
            .stock_unit
            .to_mg_per_ml(formulation.stock_concentration, options.density_factor),
    )
}

fn positive_concentration(param: &'static str, mg_per_ml: f64) -> Result<f64> {
    if mg_per_ml.is_finite() && mg_per_ml > 0.0 {
        Ok(mg_per_ml)
    } else {
        Err(DomainError::invalid_input(
            param,
            format!("{mg_per_ml} mg/mL (must be > 0)"),
        ))
    }
}

fn validate_arm(arm: &StudyArm) -> Result<()> {
    if arm.subject_count == 0 {
        return Err(DomainError::invalid_input(
            "subject_count",
            format!("arm '{}' has no subjects", arm.name),
        ));
    }
    if !(arm.weight_kg.is_finite() && arm.weight_kg > 0.0) {
        return Err(DomainError::InvalidWeight {
            role: "arm",
            value: arm.weight_kg,
        });
    }
    let dose = ensure_finite("dose_level", arm.dose_level)?;
    if dose < 0.0 {
        return Err(DomainError::invalid_input(
            "dose_level",
            format!("{dose} {} (must be >= 0)", arm.dose_unit),
        ));
    }
    Ok(())
}
